//! Store strategy subsystem: morning decisions for AI-run stores.
//!
//! Human stores are left alone. For every other store:
//!   1. A store with no buy orders gets default order lines: the
//!      best-margin catalog items up to its product slots, each from the
//!      cheapest vendor offering it.
//!   2. Every carried or ordered item is repriced from yesterday's sales:
//!      sold out → markup, nothing sold → markdown, otherwise pulled
//!      toward market. The result is clamped to
//!      [cost basis × min_margin, market × price ceiling].

use crate::{
    config::{StoreRules, StrategyRules},
    error::SimResult,
    event::SimEvent,
    ledger::DayLedger,
    player::{OrderLine, Player},
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::{Day, EntityId},
    vendor::Vendor,
};
use std::collections::BTreeSet;

pub struct StrategySubsystem {
    rules: StrategyRules,
    store: StoreRules,
}

impl StrategySubsystem {
    pub fn new(rules: StrategyRules, store: StoreRules) -> Self {
        Self { rules, store }
    }

    fn default_orders(&self, day: Day, state: &GameState, player: &Player) -> Vec<(EntityId, EntityId)> {
        let quantity = self.rules.default_order_quantity;
        let mut candidates: Vec<(EntityId, EntityId, f64)> = state
            .items
            .iter()
            .filter_map(|item| {
                let (vendor, price) = cheapest_offer(&state.vendors, &item.name, quantity)?;
                let market = state.market_price(&item.name)?;
                Some((item.name.clone(), vendor.name.clone(), market / price))
            })
            .collect();
        // Best margin first; name breaks ties.
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        candidates.truncate(player.product_slots(&self.store, day));
        candidates.into_iter().map(|(item, vendor, _)| (item, vendor)).collect()
    }

    /// Today's price for `item` given yesterday's sales.
    pub fn reprice(&self, player: &Player, item: &str, market: f64) -> f64 {
        let ceiling = market * self.store.price_ceiling_factor;
        let floor = player
            .cost_basis(item)
            .map_or(0.0, |c| c * self.rules.min_margin)
            .min(ceiling);

        let target = match player.price(item) {
            None => market,
            Some(old) => match player.yesterday_sales.get(item) {
                Some(s) if s.sold_out => old * self.rules.sold_out_markup,
                Some(s) if s.units_sold > 0 => old + (market - old) * self.rules.market_pull,
                _ => old * self.rules.unsold_markdown,
            },
        };
        target.clamp(floor, ceiling)
    }
}

/// Cheapest vendor listing `item` whose minimum purchase `quantity` meets.
fn cheapest_offer<'a>(vendors: &'a [Vendor], item: &str, quantity: u32) -> Option<(&'a Vendor, f64)> {
    vendors
        .iter()
        .filter(|v| v.constraints.min_purchase.map_or(true, |m| quantity >= m))
        .filter_map(|v| v.offered.get(item).map(|p| (v, *p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

impl SimSubsystem for StrategySubsystem {
    fn name(&self) -> &'static str {
        "strategy"
    }

    fn update(
        &mut self,
        day:     Day,
        state:   &mut GameState,
        _ledger: &mut DayLedger,
        _rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        if !self.rules.enabled {
            return Ok(out);
        }

        for idx in 0..state.players.len() {
            if state.players[idx].is_human {
                continue;
            }

            if state.players[idx].buy_orders.is_empty() {
                let orders = self.default_orders(day, state, &state.players[idx]);
                let player = &mut state.players[idx];
                for (item, vendor) in orders {
                    let line = OrderLine { quantity: self.rules.default_order_quantity, vendor: vendor.clone() };
                    if player.set_buy_order(&item, vec![line]).is_ok() {
                        out.push(SimEvent::DefaultOrderPlaced {
                            day,
                            player: player.name.clone(),
                            item,
                            vendor,
                            quantity: self.rules.default_order_quantity,
                        });
                    }
                }
            }

            let player = &state.players[idx];
            let carried: BTreeSet<EntityId> = player
                .inventory
                .keys()
                .chain(player.buy_orders.keys())
                .chain(player.pending_deliveries.iter().map(|d| &d.item))
                .cloned()
                .collect();

            let mut changes = Vec::new();
            for item in carried {
                let Some(market) = state.market_price(&item) else { continue };
                let old_price = player.price(&item);
                let new_price = self.reprice(player, &item, market);
                if old_price.map_or(true, |old| (old - new_price).abs() > 1e-9) {
                    changes.push((item, old_price, new_price));
                }
            }

            let player = &mut state.players[idx];
            for (item, old_price, new_price) in changes {
                if player.set_price(&item, new_price).is_err() {
                    continue;
                }
                log::debug!("day={day} strategy: {} prices {item} at ${new_price:.2}", player.name);
                out.push(SimEvent::PriceAdjusted {
                    day,
                    player: player.name.clone(),
                    item,
                    old_price,
                    new_price,
                });
            }
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
