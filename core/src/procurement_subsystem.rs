//! Procurement subsystem: resolves standing buy orders and restock rules
//! (per item and per category) against today's vendor catalogs.
//!
//! Per player, in registration order:
//!   1. Resolve every buy-order line and restock rule to an effective
//!      unit price (production line, volume tier or catch-up multiplier,
//!      then the capped vendor discount). Gate failures reject the line.
//!   2. Sort the lines ascending by unit price across all items.
//!   3. Execute greedily under the throughput cap, the per-vendor-item
//!      daily cap, product slots and cash (partial fill when short). A
//!      line is re-priced at the quantity it actually fills.
//!
//! Lead-time vendors queue a PendingDelivery instead of touching
//! inventory; the delivery subsystem merges it once its day arrives.

use crate::{
    config::StoreRules,
    error::{Rejection, SimResult},
    event::SimEvent,
    ledger::DayLedger,
    player::{PendingDelivery, Player},
    rng::SimRng,
    state::{GameState, PurchaseKey},
    subsystem::SimSubsystem,
    types::{Day, EntityId},
    upgrade::PRODUCTION_LINE_PRICE_FACTOR,
    vendor::Vendor,
};
use std::collections::BTreeMap;

/// Catch-up vendor pricing starts on this day.
pub const CATCH_UP_START_DAY: Day = 10;

/// One order line waiting to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub item:     EntityId,
    pub vendor:   EntityId,
    pub quantity: u32,
    /// Generated from a restock rule rather than a buy order.
    pub restock:  bool,
}

/// A committed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub item:         EntityId,
    pub vendor:       EntityId,
    pub quantity:     u32,
    pub unit_cost:    f64,
    pub delivery_day: Option<Day>,
}

/// Vendor unit price for `quantity` units before upgrade discounts.
/// A matching volume tier replaces the base multiplier; otherwise a
/// trailing store pays the catch-up multiplier when the vendor has one.
pub fn vendor_unit_price(vendor: &Vendor, item: &str, quantity: u32, trailing: bool) -> Option<f64> {
    let listed = *vendor.offered.get(item)?;
    let reference = listed / vendor.pricing_multiplier;
    let multiplier = vendor
        .tier_multiplier(quantity)
        .or_else(|| vendor.catch_up_multiplier.filter(|_| trailing))
        .unwrap_or(vendor.pricing_multiplier);
    Some(reference * multiplier)
}

/// Effective unit price for `player` buying `quantity` of `item` from
/// `vendor` today, or the rejection that blocks the line.
pub fn effective_unit_price(
    state:    &GameState,
    player:   &Player,
    item:     &str,
    vendor:   &Vendor,
    quantity: u32,
) -> Result<f64, Rejection> {
    let day = state.day;
    if quantity == 0 {
        return Err(Rejection::ZeroQuantity);
    }
    let constraints = &vendor.constraints;
    if let Some(minimum) = constraints.min_purchase {
        if quantity < minimum {
            return Err(Rejection::BelowVendorMinimum {
                vendor: vendor.name.clone(),
                minimum,
                requested: quantity,
            });
        }
    }
    if let Some(required) = constraints.min_reputation {
        if player.reputation < required {
            return Err(Rejection::ReputationGate {
                vendor: vendor.name.clone(),
                required,
                actual: player.reputation,
            });
        }
    }
    if let Some(required) = constraints.min_level {
        if player.store_level < required {
            return Err(Rejection::LevelGate { required, actual: player.store_level });
        }
    }

    if player.has_production_line(item, day) {
        let market = state
            .market_price(item)
            .ok_or_else(|| Rejection::UnknownItem { item: item.to_string() })?;
        return Ok(market * PRODUCTION_LINE_PRICE_FACTOR);
    }

    let trailing = day >= CATCH_UP_START_DAY && player.store_level < state.highest_store_level();
    let base = vendor_unit_price(vendor, item, quantity, trailing).ok_or_else(|| Rejection::NotOffered {
        vendor: vendor.name.clone(),
        item:   item.to_string(),
    })?;
    Ok(base * (1.0 - player.vendor_discount(&vendor.name, day)))
}

/// Units a restock rule should order: `minimum + demand × lead − on_hand`
/// when stock (including units in transit) is below the adjusted minimum.
pub fn restock_quantity(minimum: u32, yesterday_demand: u32, lead_time: u32, on_hand: u32) -> Option<u32> {
    let adjusted = minimum + yesterday_demand * lead_time;
    (on_hand < adjusted).then(|| adjusted - on_hand)
}

fn in_transit(player: &Player, item: &str) -> u32 {
    player
        .pending_deliveries
        .iter()
        .filter(|d| d.item == item)
        .map(|d| d.quantity)
        .sum()
}

/// Products the store carries or has on the way.
fn carried_products(player: &Player) -> usize {
    let mut names: Vec<&str> = player
        .inventory
        .iter()
        .filter(|(_, q)| **q > 0)
        .map(|(name, _)| name.as_str())
        .collect();
    names.extend(player.pending_deliveries.iter().map(|d| d.item.as_str()));
    names.sort_unstable();
    names.dedup();
    names.len()
}

/// Buy-order lines and triggered restock rules for one player. A
/// category rule covers carried items without an item rule.
pub fn collect_requests(state: &GameState, player: &Player) -> Vec<OrderRequest> {
    let mut requests: Vec<OrderRequest> = player
        .buy_orders
        .iter()
        .flat_map(|(item, lines)| {
            lines.iter().map(move |line| OrderRequest {
                item:     item.clone(),
                vendor:   line.vendor.clone(),
                quantity: line.quantity,
                restock:  false,
            })
        })
        .collect();

    for (item, rule) in &player.restock_rules {
        let lead = state
            .vendor(&rule.vendor)
            .map_or(0, |v| player.effective_lead_time(v.lead_time, state.day));
        let demand = player.yesterday_demand.get(item).copied().unwrap_or(0);
        let on_hand = player.stock(item) + in_transit(player, item);
        if let Some(quantity) = restock_quantity(rule.minimum, demand, lead, on_hand) {
            requests.push(OrderRequest {
                item: item.clone(),
                vendor: rule.vendor.clone(),
                quantity,
                restock: true,
            });
        }
    }

    for item in &state.items {
        let Some(rule) = player.category_restock_rules.get(&item.category) else { continue };
        if player.restock_rules.contains_key(&item.name) || !player.carries(&item.name) {
            continue;
        }
        let lead = state
            .vendor(&rule.vendor)
            .map_or(0, |v| player.effective_lead_time(v.lead_time, state.day));
        let demand = player.yesterday_demand.get(&item.name).copied().unwrap_or(0);
        let on_hand = player.stock(&item.name) + in_transit(player, &item.name);
        if let Some(quantity) = restock_quantity(rule.minimum, demand, lead, on_hand) {
            requests.push(OrderRequest {
                item: item.name.clone(),
                vendor: rule.vendor.clone(),
                quantity,
                restock: true,
            });
        }
    }
    requests
}

/// Execute one line for `players[idx]`. Fills as much as the throughput
/// cap, vendor cap and cash allow, priced at the quantity that fills.
fn execute_line(
    state:   &mut GameState,
    idx:     usize,
    request: &OrderRequest,
    rules:   &StoreRules,
) -> Result<Purchase, Rejection> {
    let day = state.day;
    let vendor = state
        .vendor(&request.vendor)
        .ok_or_else(|| Rejection::UnknownVendor { vendor: request.vendor.clone() })?;
    let player = &state.players[idx];
    let key = PurchaseKey {
        vendor: request.vendor.clone(),
        player: player.name.clone(),
        item:   request.item.clone(),
    };

    let cap = player.throughput_cap(rules, day);
    let mut quantity = request.quantity.min(cap.saturating_sub(player.units_bought_today));
    if quantity == 0 {
        return Err(Rejection::ThroughputExhausted { cap });
    }

    if let Some(max) = vendor.constraints.max_per_player_item {
        let bought = state.vendor_daily_purchases.get(&key).copied().unwrap_or(0);
        quantity = quantity.min(max.saturating_sub(bought));
        if quantity == 0 {
            return Err(Rejection::VendorCapReached { vendor: key.vendor, item: key.item });
        }
    }

    let slots = player.product_slots(rules, day);
    if !player.is_stocked(&request.item)
        && in_transit(player, &request.item) == 0
        && carried_products(player) >= slots
    {
        return Err(Rejection::ProductSlotsFull { capacity: slots });
    }

    // Volume tiers apply to the units actually bought. Each cash cut can
    // only raise the unit price, so the loop ends once the fill is payable.
    let mut unit_cost = effective_unit_price(state, player, &request.item, vendor, quantity)?;
    while unit_cost > 0.0 && player.cash < unit_cost * quantity as f64 {
        let affordable = (player.cash / unit_cost).floor() as u32;
        if affordable == 0 {
            return Err(Rejection::InsufficientCash {
                needed:    unit_cost * quantity as f64,
                available: player.cash,
            });
        }
        quantity = quantity.min(affordable);
        unit_cost = effective_unit_price(state, player, &request.item, vendor, quantity)?;
    }
    let lead = player.effective_lead_time(vendor.lead_time, day);

    *state.vendor_daily_purchases.entry(key).or_insert(0) += quantity;
    let player = &mut state.players[idx];
    player.cash -= unit_cost * quantity as f64;
    player.units_bought_today += quantity;

    let delivery_day = if lead == 0 {
        player.add_stock(&request.item, quantity, unit_cost);
        None
    } else {
        let delivery_day = day + lead as Day;
        player.pending_deliveries.push(PendingDelivery {
            item: request.item.clone(),
            quantity,
            unit_cost,
            delivery_day,
        });
        Some(delivery_day)
    };

    Ok(Purchase {
        item: request.item.clone(),
        vendor: request.vendor.clone(),
        quantity,
        unit_cost,
        delivery_day,
    })
}

fn price_request(state: &GameState, idx: usize, request: &OrderRequest) -> Result<f64, Rejection> {
    let vendor = state
        .vendor(&request.vendor)
        .ok_or_else(|| Rejection::UnknownVendor { vendor: request.vendor.clone() })?;
    if state.item(&request.item).is_none() {
        return Err(Rejection::UnknownItem { item: request.item.clone() });
    }
    effective_unit_price(state, &state.players[idx], &request.item, vendor, request.quantity)
}

/// Buy directly from a vendor outside the daily order pass. Counts
/// against today's throughput and vendor caps like any other purchase.
pub fn purchase_from_vendor(
    state:    &mut GameState,
    idx:      usize,
    item:     &str,
    vendor:   &str,
    quantity: u32,
    rules:    &StoreRules,
) -> Result<Purchase, Rejection> {
    let request = OrderRequest {
        item:     item.to_string(),
        vendor:   vendor.to_string(),
        quantity,
        restock:  false,
    };
    price_request(state, idx, &request)?;
    execute_line(state, idx, &request, rules)
}

/// Run the full order pass for one player. Returns committed purchases
/// and rejected lines in execution order.
pub fn procure_for_player(
    state: &mut GameState,
    idx:   usize,
    rules: &StoreRules,
) -> Vec<(OrderRequest, Result<Purchase, Rejection>)> {
    let requests = collect_requests(state, &state.players[idx]);

    let mut priced: Vec<(OrderRequest, f64)> = Vec::new();
    let mut outcomes = Vec::new();
    for request in requests {
        match price_request(state, idx, &request) {
            Ok(unit_cost) => priced.push((request, unit_cost)),
            Err(rejection) => outcomes.push((request, Err(rejection))),
        }
    }
    priced.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (request, _) in priced {
        let result = execute_line(state, idx, &request, rules);
        outcomes.push((request, result));
    }
    outcomes
}

pub struct ProcurementSubsystem {
    rules: StoreRules,
}

impl ProcurementSubsystem {
    pub fn new(rules: StoreRules) -> Self {
        Self { rules }
    }
}

impl SimSubsystem for ProcurementSubsystem {
    fn name(&self) -> &'static str {
        "procurement"
    }

    fn update(
        &mut self,
        day:    Day,
        state:  &mut GameState,
        ledger: &mut DayLedger,
        _rng:   &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        let mut spend: BTreeMap<EntityId, f64> = BTreeMap::new();

        for idx in 0..state.players.len() {
            let player = state.players[idx].name.clone();
            for (request, result) in procure_for_player(state, idx, &self.rules) {
                match result {
                    Ok(purchase) => {
                        *spend.entry(player.clone()).or_insert(0.0) +=
                            purchase.unit_cost * purchase.quantity as f64;
                        out.push(SimEvent::StockPurchased {
                            day,
                            player:       player.clone(),
                            item:         purchase.item,
                            vendor:       purchase.vendor,
                            quantity:     purchase.quantity,
                            unit_cost:    purchase.unit_cost,
                            delivery_day: purchase.delivery_day,
                        });
                    }
                    Err(rejection) => {
                        ledger.telemetry.rejected_purchases += 1;
                        if request.restock {
                            ledger.telemetry.failed_restocks += 1;
                        }
                        log::debug!(
                            "day={day} procurement: {player} {} from {} rejected: {rejection}",
                            request.item, request.vendor
                        );
                        out.push(SimEvent::PurchaseRejected {
                            day,
                            player:  player.clone(),
                            item:    request.item,
                            vendor:  request.vendor,
                            restock: request.restock,
                            rejection,
                        });
                    }
                }
            }
        }

        for (player, total) in &spend {
            log::debug!("day={day} procurement: {player} spent ${total:.2}");
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
