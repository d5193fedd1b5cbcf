//! Demand subsystem: today's shopping lists and store routing.
//!
//! Scores every store once (CAS, see attraction.rs), then for each
//! customer in population order: generate needs from the archetype and
//! pick a store through the archetype's supplier rule. Regular customers
//! with preferred categories may then be steered to a specialist store
//! (see specialty.rs). Routed shoppers are handed to checkout through
//! the day ledger.

use crate::{
    attraction::{self, CasBreakdown},
    config::{DemandRules, StoreRules},
    customer::{Archetype, DemandContext},
    error::SimResult,
    event::SimEvent,
    ledger::{DayLedger, RoutedShopper},
    rng::SimRng,
    specialty,
    state::GameState,
    subsystem::SimSubsystem,
    types::Day,
};
use std::collections::BTreeMap;

pub struct DemandSubsystem {
    rules:          DemandRules,
    ceiling_factor: f64,
}

impl DemandSubsystem {
    pub fn new(rules: DemandRules, store: &StoreRules) -> Self {
        Self { rules, ceiling_factor: store.price_ceiling_factor }
    }
}

/// Attraction breakdown for every player, in player order.
pub fn score_all(state: &GameState, ceiling_factor: f64) -> Vec<CasBreakdown> {
    state
        .players
        .iter()
        .map(|p| attraction::score_player(p, &state.items, &state.market_prices, ceiling_factor))
        .collect()
}

impl SimSubsystem for DemandSubsystem {
    fn name(&self) -> &'static str {
        "demand"
    }

    fn update(
        &mut self,
        day:    Day,
        state:  &mut GameState,
        ledger: &mut DayLedger,
        rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        if state.players.is_empty() {
            return Ok(out);
        }

        let breakdowns = score_all(state, self.ceiling_factor);
        let scores: Vec<f64> = breakdowns.iter().map(|b| b.total).collect();
        for (player, breakdown) in state.players.iter().zip(breakdowns) {
            log::debug!("day={day} demand: {} CAS {:.1}", player.name, breakdown.total);
            out.push(SimEvent::AttractionScored { day, player: player.name.clone(), breakdown });
        }

        let GameState {
            items,
            players,
            customers,
            market_prices,
            item_demand,
            round_robin_cursor,
            ..
        } = state;
        let ctx = DemandContext {
            items,
            market_prices,
            demand: item_demand,
            rules: &self.rules,
        };

        let mut routed: BTreeMap<usize, (u32, u32)> = BTreeMap::new();
        for (customer_idx, customer) in customers.iter().enumerate() {
            let needs = customer.archetype.generate_needs(customer, &ctx, rng);
            if needs.is_empty() && customer.archetype != Archetype::Shoplifter {
                continue;
            }
            let Some(picked) =
                customer.archetype.choose_supplier(players, &scores, round_robin_cursor, rng)
            else {
                continue;
            };
            let player_idx = specialty::redirect(customer, picked, players, &scores, items);
            if player_idx != picked {
                log::trace!(
                    "day={day} demand: {} steered from {} to {}",
                    customer.name,
                    players[picked].name,
                    players[player_idx].name
                );
            }

            let store = &players[player_idx].name;
            for need in &needs {
                ledger.record_demand(store, &need.item, need.quantity);
            }
            let counts = routed.entry(player_idx).or_insert((0, 0));
            if customer.archetype.is_special() {
                counts.1 += 1;
            } else {
                counts.0 += 1;
            }
            ledger.shoppers.push(RoutedShopper { customer: customer_idx, player: player_idx, needs });
        }

        for (player_idx, (regular, special)) in routed {
            let player = players[player_idx].name.clone();
            log::debug!("day={day} demand: {player} receives {regular} regular, {special} special");
            out.push(SimEvent::CustomersRouted { day, player, regular, special });
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
