//! Subsystem trait and registry.
//!
//! RULE: Every daily phase implements SimSubsystem.
//! The engine calls update() on each registered subsystem
//! in registration order, once per day.
//! Execution order is fixed and documented in engine.rs.

use crate::{
    error::SimResult,
    event::SimEvent,
    ledger::DayLedger,
    rng::SimRng,
    state::GameState,
    types::Day,
};
use std::any::Any;

/// When in the day a subsystem runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Before the day counter advances.
    Day,
    /// After the day counter advances, preparing the next day.
    Rollover,
}

/// The contract every subsystem must fulfill.
pub trait SimSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// Called once per day by the engine.
    ///
    /// - `day`:    the day being played (rollover: the day just begun)
    /// - `state`:  the world, exclusively owned for the call
    /// - `ledger`: today's shared scratch record
    /// - `rng`:    the run's single deterministic RNG
    ///
    /// Returns a vec of new events to add to the day's event log.
    fn update(
        &mut self,
        day:    Day,
        state:  &mut GameState,
        ledger: &mut DayLedger,
        rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>>;

    /// For downcasting in tests and tooling only.
    /// Production sim code never uses this.
    fn as_any(&self) -> &dyn Any;
}
