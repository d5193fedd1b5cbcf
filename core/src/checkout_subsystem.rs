//! Checkout subsystem: executes routed shoppers against store shelves.
//!
//! A shopper walks its remaining needs in passes, buying as many units
//! of each as stock, budget and need allow. A pass that buys nothing ends
//! the visit and whatever is left is unmet demand; the shopper does not
//! try another store. Regular shoppers skip items priced above
//! market × ceiling and are turned away once the store's daily customer
//! capacity is used up. Shoplifters take 1–2 units of the priciest stock
//! and cost the store reputation.
//!
//! At the end of the pass each player's yesterday_sales and
//! yesterday_demand are rewritten from the ledger.

use crate::{
    config::{DemandRules, StoreRules},
    customer::{Archetype, Need},
    error::SimResult,
    event::SimEvent,
    ledger::{DayLedger, RoutedShopper, Visit},
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::{Day, EntityId},
};

pub struct CheckoutSubsystem {
    store:  StoreRules,
    demand: DemandRules,
}

impl CheckoutSubsystem {
    pub fn new(store: StoreRules, demand: DemandRules) -> Self {
        Self { store, demand }
    }

    fn steal(
        &self,
        day:     Day,
        state:   &mut GameState,
        shopper: &RoutedShopper,
        ledger:  &mut DayLedger,
        rng:     &mut SimRng,
        out:     &mut Vec<SimEvent>,
    ) {
        let (lo, hi) = self.demand.shoplift_units;
        let mut wanted = rng.range_u64(lo as u64, hi as u64) as u32;
        let customer = state.customers[shopper.customer].name.clone();
        let player = &mut state.players[shopper.player];

        let mut targets: Vec<(EntityId, f64)> = player
            .inventory
            .iter()
            .filter(|(_, q)| **q > 0)
            .map(|(item, _)| (item.clone(), player.price(item).unwrap_or(0.0)))
            .collect();
        targets.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (item, _) in targets {
            if wanted == 0 {
                break;
            }
            let taken = player.remove_stock(&item, wanted);
            wanted -= taken;
            log::debug!("day={day} checkout: {customer} stole {taken} {item} from {}", player.name);
            out.push(SimEvent::StockStolen {
                day,
                player: player.name.clone(),
                customer: customer.clone(),
                item,
                quantity: taken,
            });
        }
        *ledger.reputation_penalty.entry(player.name.clone()).or_insert(0.0) +=
            self.demand.shoplift_reputation_penalty;
    }

    fn shop(
        &self,
        day:     Day,
        state:   &mut GameState,
        shopper: RoutedShopper,
        ledger:  &mut DayLedger,
        out:     &mut Vec<SimEvent>,
    ) {
        let customer = &state.customers[shopper.customer];
        let customer_name = customer.name.clone();
        let special = customer.archetype.is_special();
        let mut budget = customer.budget;
        let requested: u32 = shopper.needs.iter().map(|n| n.quantity).sum();
        let player_name = state.players[shopper.player].name.clone();

        if !special {
            let capacity = state.players[shopper.player].customer_capacity(&self.store, day);
            let served = ledger.served.entry(player_name.clone()).or_insert(0);
            if *served >= capacity {
                for need in &shopper.needs {
                    ledger.record_unmet(&player_name, &need.item, need.quantity);
                }
                out.push(SimEvent::StoreAtCapacity {
                    day,
                    player: player_name.clone(),
                    customer: customer_name.clone(),
                    unmet_units: requested,
                });
                ledger.record_visit(&player_name, Visit {
                    customer:        customer_name,
                    fulfillment_pct: 0.0,
                    stores_visited:  1,
                });
                return;
            }
            *served += 1;
        }

        let mut remaining: Vec<Need> = shopper.needs;
        let mut fulfilled = 0u32;
        let mut passes = 0u32;
        loop {
            if remaining.iter().all(|n| n.quantity == 0) {
                break;
            }
            passes += 1;
            if passes > self.store.checkout_pass_limit {
                break;
            }

            let mut bought_any = false;
            for need in remaining.iter_mut().filter(|n| n.quantity > 0) {
                let market = state.market_price(&need.item).unwrap_or(0.0);
                let player = &mut state.players[shopper.player];
                let stock = player.stock(&need.item);
                let Some(price) = player.price(&need.item) else { continue };
                if stock == 0 || price <= 0.0 {
                    continue;
                }
                if !special && price > market * self.store.price_ceiling_factor {
                    continue;
                }
                let affordable = (budget / price).floor() as u32;
                let quantity = need.quantity.min(stock).min(affordable);
                if quantity == 0 {
                    continue;
                }

                player.remove_stock(&need.item, quantity);
                let revenue = price * quantity as f64;
                let profit = (price - player.cost_basis(&need.item).unwrap_or(0.0)) * quantity as f64;
                player.cash += revenue;
                if player.award_experience(quantity as u64, &self.store) {
                    log::info!("day={day} checkout: {} reached level {}", player.name, player.store_level);
                    out.push(SimEvent::LevelUp {
                        day,
                        player: player.name.clone(),
                        level:  player.store_level,
                    });
                }
                budget -= revenue;
                need.quantity -= quantity;
                fulfilled += quantity;
                bought_any = true;

                ledger.record_sale(&player_name, &need.item, quantity, revenue);
                if ledger.verbose {
                    log::info!(
                        "day={day} checkout: {customer_name} bought {quantity} {} at {player_name} for ${revenue:.2}",
                        need.item
                    );
                }
                out.push(SimEvent::SaleCompleted {
                    day,
                    player:     player_name.clone(),
                    customer:   customer_name.clone(),
                    item:       need.item.clone(),
                    quantity,
                    unit_price: price,
                    profit,
                });
            }
            if !bought_any {
                break;
            }
        }

        for need in remaining.iter().filter(|n| n.quantity > 0) {
            ledger.record_unmet(&player_name, &need.item, need.quantity);
        }
        let fulfillment_pct = if requested == 0 {
            100.0
        } else {
            fulfilled as f64 / requested as f64 * 100.0
        };
        ledger.record_visit(&player_name, Visit {
            customer: customer_name,
            fulfillment_pct,
            stores_visited: 1,
        });
    }
}

/// Rewrite each player's yesterday_sales and yesterday_demand from today's
/// ledger, flagging items that ended the day sold out.
pub fn close_books(state: &mut GameState, ledger: &DayLedger) {
    for player in &mut state.players {
        let mut sales = ledger.item_sales.get(&player.name).cloned().unwrap_or_default();
        for (item, record) in sales.iter_mut() {
            record.sold_out = record.units_sold > 0 && player.stock(item) == 0;
        }
        player.yesterday_sales = sales;
        player.yesterday_demand = ledger.demand.get(&player.name).cloned().unwrap_or_default();
    }
}

impl SimSubsystem for CheckoutSubsystem {
    fn name(&self) -> &'static str {
        "checkout"
    }

    fn update(
        &mut self,
        day:    Day,
        state:  &mut GameState,
        ledger: &mut DayLedger,
        rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        for shopper in std::mem::take(&mut ledger.shoppers) {
            if state.customers[shopper.customer].archetype == Archetype::Shoplifter {
                self.steal(day, state, &shopper, ledger, rng, &mut out);
            } else {
                self.shop(day, state, shopper, ledger, &mut out);
            }
        }
        close_books(state, ledger);

        for (player, revenue) in &ledger.revenue {
            log::debug!("day={day} checkout: {player} took ${revenue:.2}");
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
