//! The event log: every observable state change of a run.
//!
//! RULE: Phases report what they did ONLY through events.
//! The engine persists each event in emission order, so two runs
//! with the same seed produce byte-identical logs.

use crate::{
    attraction::CasBreakdown,
    error::Rejection,
    player::StaffKind,
    types::{Day, EntityId, RunId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    DayStarted {
        day: Day,
    },
    DayCompleted {
        day:           Day,
        total_revenue: f64,
    },
    RunInitialized {
        run_id: RunId,
        seed:   u64,
    },
    SnapshotRestored {
        day: Day,
    },

    // ── Player command events ──────────────────────
    PlayerCommandReceived {
        day:          Day,
        command_id:   EntityId,
        player:       EntityId,
        command_type: String,
    },
    CommandRejected {
        day:        Day,
        command_id: EntityId,
        player:     EntityId,
        rejection:  Rejection,
    },
    StaffHired {
        day:    Day,
        player: EntityId,
        kind:   StaffKind,
        fee:    f64,
    },
    UpgradePurchased {
        day:         Day,
        player:      EntityId,
        upgrade:     EntityId,
        cost:        f64,
        expires_day: Option<Day>,
    },
    StockDiscarded {
        day:      Day,
        player:   EntityId,
        item:     EntityId,
        quantity: u32,
    },

    // ── Strategy events ────────────────────────────
    PriceAdjusted {
        day:       Day,
        player:    EntityId,
        item:      EntityId,
        old_price: Option<f64>,
        new_price: f64,
    },
    DefaultOrderPlaced {
        day:      Day,
        player:   EntityId,
        item:     EntityId,
        vendor:   EntityId,
        quantity: u32,
    },

    // ── Market events ──────────────────────────────
    MarketPriceChanged {
        day:       Day,
        item:      EntityId,
        old_price: f64,
        new_price: f64,
    },
    MarketEventFired {
        day:     Day,
        crashed: EntityId,
        spiked:  EntityId,
    },
    MarketEventReverted {
        day:   Day,
        items: Vec<EntityId>,
    },
    DemandDrifted {
        day:        Day,
        item:       EntityId,
        old_weight: f64,
        new_weight: f64,
    },

    // ── Catalog events ─────────────────────────────
    CatalogRefreshed {
        day:           Day,
        vendor:        EntityId,
        offered_count: usize,
    },

    // ── Procurement events ─────────────────────────
    StockPurchased {
        day:          Day,
        player:       EntityId,
        item:         EntityId,
        vendor:       EntityId,
        quantity:     u32,
        unit_cost:    f64,
        /// None when delivered immediately.
        delivery_day: Option<Day>,
    },
    PurchaseRejected {
        day:       Day,
        player:    EntityId,
        item:      EntityId,
        vendor:    EntityId,
        restock:   bool,
        rejection: Rejection,
    },

    // ── Demand events ──────────────────────────────
    AttractionScored {
        day:       Day,
        player:    EntityId,
        breakdown: CasBreakdown,
    },
    CustomersRouted {
        day:      Day,
        player:   EntityId,
        regular:  u32,
        special:  u32,
    },

    // ── Checkout events ────────────────────────────
    SaleCompleted {
        day:        Day,
        player:     EntityId,
        customer:   EntityId,
        item:       EntityId,
        quantity:   u32,
        unit_price: f64,
        profit:     f64,
    },
    StockStolen {
        day:      Day,
        player:   EntityId,
        customer: EntityId,
        item:     EntityId,
        quantity: u32,
    },
    StoreAtCapacity {
        day:        Day,
        player:     EntityId,
        customer:   EntityId,
        unmet_units: u32,
    },
    LevelUp {
        day:    Day,
        player: EntityId,
        level:  u32,
    },

    // ── Wage events ────────────────────────────────
    WagesPaid {
        day:    Day,
        player: EntityId,
        amount: f64,
    },

    // ── Reputation events ──────────────────────────
    ReputationUpdated {
        day:                 Day,
        player:              EntityId,
        old_reputation:      f64,
        new_reputation:      f64,
        customer_delta:      f64,
        penalties:           f64,
        average_fulfillment: f64,
    },

    // ── Delivery events ────────────────────────────
    DeliveryReceived {
        day:       Day,
        player:    EntityId,
        item:      EntityId,
        quantity:  u32,
        unit_cost: f64,
    },

    // ── Telemetry ──────────────────────────────────
    DayTelemetry {
        day:                Day,
        unmet_units:        u64,
        failed_restocks:    u64,
        rejected_purchases: u64,
    },
}

impl SimEvent {
    /// Stable string name of the variant.
    /// Used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DayStarted { .. }            => "day_started",
            Self::DayCompleted { .. }          => "day_completed",
            Self::RunInitialized { .. }        => "run_initialized",
            Self::SnapshotRestored { .. }      => "snapshot_restored",
            Self::PlayerCommandReceived { .. } => "player_command_received",
            Self::CommandRejected { .. }       => "command_rejected",
            Self::StaffHired { .. }            => "staff_hired",
            Self::UpgradePurchased { .. }      => "upgrade_purchased",
            Self::StockDiscarded { .. }        => "stock_discarded",
            Self::PriceAdjusted { .. }         => "price_adjusted",
            Self::DefaultOrderPlaced { .. }    => "default_order_placed",
            Self::MarketPriceChanged { .. }    => "market_price_changed",
            Self::MarketEventFired { .. }      => "market_event_fired",
            Self::MarketEventReverted { .. }   => "market_event_reverted",
            Self::DemandDrifted { .. }         => "demand_drifted",
            Self::CatalogRefreshed { .. }      => "catalog_refreshed",
            Self::StockPurchased { .. }        => "stock_purchased",
            Self::PurchaseRejected { .. }      => "purchase_rejected",
            Self::AttractionScored { .. }      => "attraction_scored",
            Self::CustomersRouted { .. }       => "customers_routed",
            Self::SaleCompleted { .. }         => "sale_completed",
            Self::StockStolen { .. }           => "stock_stolen",
            Self::StoreAtCapacity { .. }       => "store_at_capacity",
            Self::LevelUp { .. }               => "level_up",
            Self::WagesPaid { .. }             => "wages_paid",
            Self::ReputationUpdated { .. }     => "reputation_updated",
            Self::DeliveryReceived { .. }      => "delivery_received",
            Self::DayTelemetry { .. }          => "day_telemetry",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub day:        Day,
    pub subsystem:  String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized SimEvent
}
