//! Players (stores). A player is created once at setup and mutated by
//! the daily phases and by the validated mutators below.

use crate::{
    config::StoreRules,
    error::Rejection,
    item::Category,
    types::{Day, EntityId},
    upgrade::{OwnedUpgrade, UpgradeEffect, MAX_VENDOR_DISCOUNT},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum vendor lines per buy order.
pub const MAX_ORDER_LINES: usize = 3;

/// Days between wage payments.
pub const WAGE_INTERVAL: Day = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub quantity: u32,
    pub vendor:   EntityId,
}

/// Keep `item` at or above `minimum`, ordering from `vendor`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestockRule {
    pub minimum: u32,
    pub vendor:  EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingDelivery {
    pub item:         EntityId,
    pub quantity:     u32,
    pub unit_cost:    f64,
    pub delivery_day: Day,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Cashier,
    Restocker,
    MarketingAgent,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Staff {
    pub cashiers:         u32,
    pub restockers:       u32,
    pub marketing_agents: u32,
}

impl Staff {
    pub fn count(&self, kind: StaffKind) -> u32 {
        match kind {
            StaffKind::Cashier        => self.cashiers,
            StaffKind::Restocker      => self.restockers,
            StaffKind::MarketingAgent => self.marketing_agents,
        }
    }

    fn count_mut(&mut self, kind: StaffKind) -> &mut u32 {
        match kind {
            StaffKind::Cashier        => &mut self.cashiers,
            StaffKind::Restocker      => &mut self.restockers,
            StaffKind::MarketingAgent => &mut self.marketing_agents,
        }
    }
}

/// One item's sales outcome for a single day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemSales {
    pub units_sold:   u32,
    pub revenue:      f64,
    pub sold_out:     bool,
    pub unmet_demand: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub name:                    EntityId,
    pub is_human:                bool,
    pub cash:                    f64,
    pub inventory:               BTreeMap<EntityId, u32>,
    pub prices:                  BTreeMap<EntityId, f64>,
    /// Price each item had before its most recent change.
    pub previous_prices:         BTreeMap<EntityId, f64>,
    /// Weighted-average unit cost of the units on hand.
    pub item_costs:              BTreeMap<EntityId, f64>,
    pub buy_orders:              BTreeMap<EntityId, Vec<OrderLine>>,
    pub restock_rules:           BTreeMap<EntityId, RestockRule>,
    /// Minimum applied to every carried item of a category that has no
    /// item rule of its own.
    #[serde(default)]
    pub category_restock_rules:  BTreeMap<Category, RestockRule>,
    pub reputation:              f64,
    pub average_fulfillment_pct: f64,
    pub pending_deliveries:      Vec<PendingDelivery>,
    pub upgrades:                Vec<OwnedUpgrade>,
    pub staff:                   Staff,
    pub store_level:             u32,
    pub experience:              u64,
    pub last_wage_payment_day:   Day,
    pub units_bought_today:      u32,
    pub yesterday_sales:         BTreeMap<EntityId, ItemSales>,
    /// Units customers asked this store for yesterday, per item.
    pub yesterday_demand:        BTreeMap<EntityId, u32>,
}

impl Player {
    pub fn new(name: impl Into<String>, cash: f64, is_human: bool) -> Self {
        Self {
            name: name.into(),
            is_human,
            cash,
            inventory: BTreeMap::new(),
            prices: BTreeMap::new(),
            previous_prices: BTreeMap::new(),
            item_costs: BTreeMap::new(),
            buy_orders: BTreeMap::new(),
            restock_rules: BTreeMap::new(),
            category_restock_rules: BTreeMap::new(),
            reputation: 0.0,
            average_fulfillment_pct: 70.0,
            pending_deliveries: Vec::new(),
            upgrades: Vec::new(),
            staff: Staff::default(),
            store_level: 1,
            experience: 0,
            last_wage_payment_day: 0,
            units_bought_today: 0,
            yesterday_sales: BTreeMap::new(),
            yesterday_demand: BTreeMap::new(),
        }
    }

    // ── Inventory ──────────────────────────────────────────────

    pub fn stock(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    pub fn is_stocked(&self, item: &str) -> bool {
        self.stock(item) > 0
    }

    /// Distinct products currently on the shelves.
    pub fn stocked_product_count(&self) -> usize {
        self.inventory.values().filter(|q| **q > 0).count()
    }

    pub fn inventory_empty(&self) -> bool {
        self.stocked_product_count() == 0
    }

    pub fn cost_basis(&self, item: &str) -> Option<f64> {
        self.item_costs.get(item).copied()
    }

    /// Merge `quantity` units bought at `unit_cost` into inventory,
    /// folding them into the weighted-average cost basis.
    pub fn add_stock(&mut self, item: &str, quantity: u32, unit_cost: f64) {
        if quantity == 0 {
            return;
        }
        let on_hand = self.stock(item);
        let basis = match self.cost_basis(item) {
            Some(old) if on_hand > 0 => {
                (old * on_hand as f64 + unit_cost * quantity as f64) / (on_hand + quantity) as f64
            }
            _ => unit_cost,
        };
        self.inventory.insert(item.to_string(), on_hand + quantity);
        self.item_costs.insert(item.to_string(), basis);
    }

    /// Remove up to `quantity` units. Returns the units actually removed.
    pub fn remove_stock(&mut self, item: &str, quantity: u32) -> u32 {
        let on_hand = self.stock(item);
        let removed = quantity.min(on_hand);
        if removed > 0 {
            self.inventory.insert(item.to_string(), on_hand - removed);
        }
        removed
    }

    /// Throw away stock. Discarding everything drops the inventory entry.
    pub fn discard(&mut self, item: &str, quantity: u32) -> Result<u32, Rejection> {
        if quantity == 0 {
            return Err(Rejection::ZeroQuantity);
        }
        if !self.inventory.contains_key(item) {
            return Err(Rejection::UnknownItem { item: item.to_string() });
        }
        let removed = self.remove_stock(item, quantity);
        if self.stock(item) == 0 {
            self.inventory.remove(item);
        }
        Ok(removed)
    }

    /// Move every delivery due on or before `day` into inventory.
    pub fn receive_deliveries(&mut self, day: Day) -> Vec<PendingDelivery> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_deliveries)
            .into_iter()
            .partition(|d| d.delivery_day <= day);
        self.pending_deliveries = waiting;
        for delivery in &due {
            self.add_stock(&delivery.item, delivery.quantity, delivery.unit_cost);
        }
        due
    }

    // ── Pricing and orders ─────────────────────────────────────

    pub fn price(&self, item: &str) -> Option<f64> {
        self.prices.get(item).copied()
    }

    pub fn set_price(&mut self, item: &str, price: f64) -> Result<(), Rejection> {
        if !(price > 0.0) || !price.is_finite() {
            return Err(Rejection::InvalidPrice { price });
        }
        if let Some(old) = self.prices.insert(item.to_string(), price) {
            self.previous_prices.insert(item.to_string(), old);
        }
        Ok(())
    }

    pub fn set_buy_order(&mut self, item: &str, lines: Vec<OrderLine>) -> Result<(), Rejection> {
        if lines.len() > MAX_ORDER_LINES {
            return Err(Rejection::TooManyOrderLines { max: MAX_ORDER_LINES });
        }
        if lines.iter().any(|l| l.quantity == 0) {
            return Err(Rejection::ZeroQuantity);
        }
        if lines.is_empty() {
            self.buy_orders.remove(item);
        } else {
            self.buy_orders.insert(item.to_string(), lines);
        }
        Ok(())
    }

    pub fn clear_buy_order(&mut self, item: &str) -> bool {
        self.buy_orders.remove(item).is_some()
    }

    pub fn set_restock_rule(&mut self, item: &str, minimum: u32, vendor: &str) -> Result<(), Rejection> {
        if minimum == 0 {
            return Err(Rejection::ZeroQuantity);
        }
        self.restock_rules.insert(
            item.to_string(),
            RestockRule { minimum, vendor: vendor.to_string() },
        );
        Ok(())
    }

    pub fn set_category_restock_rule(
        &mut self,
        category: Category,
        minimum:  u32,
        vendor:   &str,
    ) -> Result<(), Rejection> {
        if minimum == 0 {
            return Err(Rejection::ZeroQuantity);
        }
        self.category_restock_rules.insert(
            category,
            RestockRule { minimum, vendor: vendor.to_string() },
        );
        Ok(())
    }

    /// Items the store currently carries: on the shelf or priced.
    pub fn carries(&self, item: &str) -> bool {
        self.inventory.contains_key(item) || self.prices.contains_key(item)
    }

    // ── Staff ──────────────────────────────────────────────────

    /// Hire one staff member, paying the hiring fee. Returns the fee.
    pub fn hire_staff(&mut self, kind: StaffKind, rules: &StoreRules) -> Result<f64, Rejection> {
        let (fee, max) = match kind {
            StaffKind::Cashier        => (rules.cashier.hiring_fee, rules.cashier.max),
            StaffKind::Restocker      => (rules.restocker.hiring_fee, rules.restocker.max),
            StaffKind::MarketingAgent => (rules.marketing_agent.hiring_fee, rules.marketing_agent.max),
        };
        if kind == StaffKind::MarketingAgent && self.store_level < rules.marketing_min_level {
            return Err(Rejection::LevelGate {
                required: rules.marketing_min_level,
                actual:   self.store_level,
            });
        }
        if self.staff.count(kind) >= max {
            return Err(Rejection::StaffLimit { max });
        }
        if self.cash < fee {
            return Err(Rejection::InsufficientCash { needed: fee, available: self.cash });
        }
        self.cash -= fee;
        *self.staff.count_mut(kind) += 1;
        Ok(fee)
    }

    /// Pay one month of wages if at least 30 days have passed since the
    /// last payment. Returns the amount paid (0 when not yet due).
    /// Wages the store cannot cover are forfeited rather than driving
    /// cash negative.
    pub fn pay_monthly_wages(&mut self, day: Day, rules: &StoreRules) -> f64 {
        if day.saturating_sub(self.last_wage_payment_day) < WAGE_INTERVAL {
            return 0.0;
        }
        let due = self.staff.cashiers as f64 * rules.cashier.monthly_wage
            + self.staff.restockers as f64 * rules.restocker.monthly_wage
            + self.staff.marketing_agents as f64 * rules.marketing_agent.monthly_wage;
        let paid = due.min(self.cash.max(0.0));
        self.cash -= paid;
        self.last_wage_payment_day = day;
        paid
    }

    // ── Capacities and upgrade effects ─────────────────────────

    fn active_effects(&self, day: Day) -> impl Iterator<Item = &UpgradeEffect> {
        self.upgrades
            .iter()
            .filter(move |u| u.is_active(day))
            .map(|u| &u.effect)
    }

    pub fn owns_upgrade(&self, upgrade_id: &str, day: Day) -> bool {
        self.upgrades
            .iter()
            .any(|u| u.upgrade_id == upgrade_id && u.is_active(day))
    }

    /// Daily procurement cap: base + upgrades + restocker bonus.
    pub fn throughput_cap(&self, rules: &StoreRules, day: Day) -> u32 {
        let from_upgrades: u32 = self
            .active_effects(day)
            .filter_map(|e| match e {
                UpgradeEffect::ThroughputBoost { units } => Some(*units),
                _ => None,
            })
            .sum();
        rules.base_throughput + from_upgrades + self.staff.restockers * rules.throughput_per_restocker
    }

    pub fn product_slots(&self, rules: &StoreRules, day: Day) -> usize {
        let from_upgrades: u32 = self
            .active_effects(day)
            .filter_map(|e| match e {
                UpgradeEffect::ProductSlots { slots } => Some(*slots),
                _ => None,
            })
            .sum();
        (rules.base_product_slots
            + self.store_level.saturating_sub(1) * rules.slots_per_level
            + from_upgrades) as usize
    }

    pub fn customer_capacity(&self, rules: &StoreRules, day: Day) -> u32 {
        let from_upgrades: u32 = self
            .active_effects(day)
            .filter_map(|e| match e {
                UpgradeEffect::CustomerCapacity { customers } => Some(*customers),
                _ => None,
            })
            .sum();
        rules.base_customer_capacity + self.staff.cashiers * rules.customers_per_cashier + from_upgrades
    }

    pub fn lead_time_reduction(&self, day: Day) -> u32 {
        self.active_effects(day)
            .filter_map(|e| match e {
                UpgradeEffect::LeadTimeReduction { days } => Some(*days),
                _ => None,
            })
            .sum()
    }

    /// Combined discount for `vendor`, capped at 15%.
    pub fn vendor_discount(&self, vendor: &str, day: Day) -> f64 {
        let stacked: f64 = self
            .active_effects(day)
            .filter_map(|e| match e {
                UpgradeEffect::VendorDiscount { vendor: v, fraction } if v == vendor => Some(*fraction),
                _ => None,
            })
            .sum();
        stacked.min(MAX_VENDOR_DISCOUNT)
    }

    pub fn has_production_line(&self, item: &str, day: Day) -> bool {
        self.active_effects(day)
            .any(|e| matches!(e, UpgradeEffect::ProductionLine { item: i } if i == item))
    }

    pub fn effective_lead_time(&self, vendor_lead_time: u32, day: Day) -> u32 {
        vendor_lead_time.saturating_sub(self.lead_time_reduction(day))
    }

    // ── Progression ────────────────────────────────────────────

    /// Award experience and recompute the store level.
    /// Returns true when the level went up.
    pub fn award_experience(&mut self, xp: u64, rules: &StoreRules) -> bool {
        self.experience += xp;
        let per_level = rules.xp_per_level.max(1);
        let level = (1 + self.experience / per_level).min(rules.max_level as u64) as u32;
        let leveled = level > self.store_level;
        self.store_level = self.store_level.max(level);
        leveled
    }
}
