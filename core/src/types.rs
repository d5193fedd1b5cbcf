//! Shared primitive types used across the entire simulation.

/// A simulation day. Day 1 is the first day played.
pub type Day = u64;

/// A stable, unique identifier for any entity in the simulation.
/// Items, vendors, players and upgrades are keyed by their names.
pub type EntityId = String;

/// The canonical run identifier.
pub type RunId = String;

/// Per-player revenue for one day, keyed by player name.
pub type DailySales = std::collections::BTreeMap<EntityId, f64>;
