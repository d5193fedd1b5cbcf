//! Scratch record of one simulated day.
//!
//! Phases hand results forward through the ledger: demand routes shoppers,
//! checkout records visits and sales, reputation reads the visits. The
//! engine creates a fresh ledger at the start of each day and drops it at
//! the end, so nothing here outlives a day.

use crate::{
    customer::Need,
    player::ItemSales,
    types::{DailySales, EntityId},
};
use std::collections::BTreeMap;

/// A customer assigned to a store for today.
#[derive(Debug, Clone)]
pub struct RoutedShopper {
    pub customer: usize,
    pub player:   usize,
    pub needs:    Vec<Need>,
}

/// Outcome of one customer's visit to one store.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub customer:        EntityId,
    pub fulfillment_pct: f64,
    pub stores_visited:  u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Telemetry {
    pub unmet_units:        u64,
    pub failed_restocks:    u64,
    pub rejected_purchases: u64,
}

#[derive(Debug, Default)]
pub struct DayLedger {
    pub verbose:             bool,
    pub shoppers:            Vec<RoutedShopper>,
    /// Per-visit fulfillment, keyed by player name.
    pub visits:              BTreeMap<EntityId, Vec<Visit>>,
    /// Regular customers served so far today, keyed by player name.
    pub served:              BTreeMap<EntityId, u32>,
    pub revenue:             BTreeMap<EntityId, f64>,
    pub item_sales:          BTreeMap<EntityId, BTreeMap<EntityId, ItemSales>>,
    /// Units customers asked each store for, per item.
    pub demand:              BTreeMap<EntityId, BTreeMap<EntityId, u32>>,
    /// Flat reputation penalties (shoplifting) by player.
    pub reputation_penalty:  BTreeMap<EntityId, f64>,
    pub telemetry:           Telemetry,
}

impl DayLedger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose, ..Self::default() }
    }

    pub fn record_visit(&mut self, player: &str, visit: Visit) {
        self.visits.entry(player.to_string()).or_default().push(visit);
    }

    pub fn record_sale(&mut self, player: &str, item: &str, quantity: u32, revenue: f64) {
        *self.revenue.entry(player.to_string()).or_insert(0.0) += revenue;
        let sales = self
            .item_sales
            .entry(player.to_string())
            .or_default()
            .entry(item.to_string())
            .or_default();
        sales.units_sold += quantity;
        sales.revenue += revenue;
    }

    pub fn record_unmet(&mut self, player: &str, item: &str, quantity: u32) {
        self.telemetry.unmet_units += quantity as u64;
        self.item_sales
            .entry(player.to_string())
            .or_default()
            .entry(item.to_string())
            .or_default()
            .unmet_demand += quantity;
    }

    pub fn record_demand(&mut self, player: &str, item: &str, quantity: u32) {
        *self
            .demand
            .entry(player.to_string())
            .or_default()
            .entry(item.to_string())
            .or_insert(0) += quantity;
    }

    /// Revenue per player, with every listed player present.
    pub fn daily_sales<'a>(&self, players: impl Iterator<Item = &'a str>) -> DailySales {
        players
            .map(|p| (p.to_string(), self.revenue.get(p).copied().unwrap_or(0.0)))
            .collect()
    }
}
