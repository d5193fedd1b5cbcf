use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid {entity} '{name}': {reason}")]
    InvalidEntity {
        entity: &'static str,
        name:   String,
        reason: String,
    },

    #[error("Player '{name}' not found")]
    UnknownPlayer { name: String },

    #[error("No snapshot stored for run '{run_id}'")]
    SnapshotNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid(entity: &'static str, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntity { entity, name: name.into(), reason: reason.into() }
    }
}

/// A business-rule failure. These are expected during play and are
/// returned to the caller, never raised as a `SimError`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("insufficient cash: need ${needed:.2}, have ${available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("vendor '{vendor}' requires at least {minimum} units, got {requested}")]
    BelowVendorMinimum { vendor: String, minimum: u32, requested: u32 },

    #[error("vendor '{vendor}' requires reputation {required:.0}, have {actual:.0}")]
    ReputationGate { vendor: String, required: f64, actual: f64 },

    #[error("requires store level {required}, have {actual}")]
    LevelGate { required: u32, actual: u32 },

    #[error("all {capacity} product slots are in use")]
    ProductSlotsFull { capacity: usize },

    #[error("daily throughput cap of {cap} units reached")]
    ThroughputExhausted { cap: u32 },

    #[error("vendor '{vendor}' daily cap for '{item}' reached")]
    VendorCapReached { vendor: String, item: String },

    #[error("vendor '{vendor}' does not offer '{item}' today")]
    NotOffered { vendor: String, item: String },

    #[error("unknown vendor '{vendor}'")]
    UnknownVendor { vendor: String },

    #[error("unknown item '{item}'")]
    UnknownItem { item: String },

    #[error("unknown upgrade '{upgrade}'")]
    UnknownUpgrade { upgrade: String },

    #[error("upgrade '{upgrade}' is already owned")]
    AlreadyOwned { upgrade: String },

    #[error("a buy order holds at most {max} vendor lines")]
    TooManyOrderLines { max: usize },

    #[error("price must be positive, got {price}")]
    InvalidPrice { price: f64 },

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("staff limit of {max} reached")]
    StaffLimit { max: u32 },
}
