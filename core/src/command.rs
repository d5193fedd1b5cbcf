use serde::{Deserialize, Serialize};
use crate::{
    item::Category,
    player::{OrderLine, StaffKind},
    types::{Day, EntityId, RunId},
};

/// All player-issued commands. Each maps to one validated mutator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Pricing ───────────────────────────────────
    SetPrice {
        item:  EntityId,
        price: f64,
    },

    // ── Ordering ──────────────────────────────────
    SetBuyOrder {
        item:  EntityId,
        lines: Vec<OrderLine>,
    },
    ClearBuyOrder {
        item: EntityId,
    },
    SetRestockRule {
        item:    EntityId,
        minimum: u32,
        vendor:  EntityId,
    },
    SetCategoryRestockRule {
        category: Category,
        minimum:  u32,
        vendor:   EntityId,
    },
    PurchaseFromVendor {
        item:     EntityId,
        vendor:   EntityId,
        quantity: u32,
    },

    // ── Store management ──────────────────────────
    HireStaff {
        kind: StaffKind,
    },
    PurchaseUpgrade {
        upgrade: EntityId,
    },
    Discard {
        item:     EntityId,
        quantity: u32,
    },
}

impl PlayerCommand {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SetPrice { .. }               => "set_price",
            Self::SetBuyOrder { .. }            => "set_buy_order",
            Self::ClearBuyOrder { .. }          => "clear_buy_order",
            Self::SetRestockRule { .. }         => "set_restock_rule",
            Self::SetCategoryRestockRule { .. } => "set_category_restock_rule",
            Self::PurchaseFromVendor { .. }     => "purchase_from_vendor",
            Self::HireStaff { .. }              => "hire_staff",
            Self::PurchaseUpgrade { .. }        => "purchase_upgrade",
            Self::Discard { .. }                => "discard",
        }
    }
}

/// A player command with its submission day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub run_id:     RunId,
    pub queued_at:  Day,
    pub command_id: String,
    pub player:     EntityId,
    pub command:    PlayerCommand,
}
