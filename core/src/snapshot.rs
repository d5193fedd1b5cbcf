//! Snapshot serialization: full simulation state to/from JSON.
//!
//! A snapshot is taken every SNAPSHOT_INTERVAL days.
//! It captures the complete world and the RNG position, so a restored
//! engine continues exactly where the original left off.

use crate::{
    rng::SimRng,
    state::GameState,
    types::{Day, RunId},
};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_INTERVAL: Day = 30; // monthly

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub run_id: RunId,
    /// The last completed day.
    pub day:    Day,
    pub state:  GameState,
    pub rng:    SimRng,
}
