//! Market subsystem: daily price fluctuation and demand drift.
//!
//! Each day:
//!   1. Revert yesterday's scripted event, if one fired.
//!   2. Pick 1–2 items and move each by a signed swing drawn from its
//!      importance band, clamped to [1.2 × cost, 2.0 × base price].
//!   3. Every `event_interval_days`, crash one further item by 50% and
//!      spike another by 50%, saving both prices for tomorrow's revert.
//!   4. Scale 1–3 items' demand multipliers, clamped to [0.1, 2.0].

use crate::{
    config::MarketRules,
    error::SimResult,
    event::SimEvent,
    ledger::DayLedger,
    rng::SimRng,
    state::{GameState, MarketEvent, DEMAND_MAX, DEMAND_MIN},
    subsystem::SimSubsystem,
    types::{Day, EntityId},
};
use std::collections::BTreeMap;

pub struct MarketSubsystem {
    rules: MarketRules,
}

impl MarketSubsystem {
    pub fn new(rules: MarketRules) -> Self {
        Self { rules }
    }

    fn revert_event(&self, day: Day, state: &mut GameState) -> Option<SimEvent> {
        let event = state.market_event.take_if(|e| e.day < day)?;
        for (item, price) in &event.saved_prices {
            state.market_prices.insert(item.clone(), *price);
        }
        log::debug!("day={day} market: reverted event from day {}", event.day);
        Some(SimEvent::MarketEventReverted {
            day,
            items: event.saved_prices.into_keys().collect(),
        })
    }

    fn fluctuate(&self, day: Day, state: &mut GameState, rng: &mut SimRng) -> Vec<EntityId> {
        let (lo, hi) = self.rules.items_per_day;
        let count = rng.range_u64(lo, hi) as usize;
        let picked = rng.sample(&state.items, count);
        for item in &picked {
            let (min_swing, max_swing) = self.rules.swing_for(item.importance());
            let swing = rng.range_f64(min_swing, max_swing);
            let sign = if rng.chance(0.5) { 1.0 } else { -1.0 };
            let old = state.market_price(&item.name).unwrap_or(item.base_price);
            let new = item.clamp_market_price(old * (1.0 + sign * swing));
            state.market_prices.insert(item.name.clone(), new);
            log::debug!("day={day} market: {} {old:.2} -> {new:.2}", item.name);
        }
        picked.into_iter().map(|i| i.name).collect()
    }

    fn fire_event(
        &self,
        day:      Day,
        state:    &mut GameState,
        excluded: &[EntityId],
        rng:      &mut SimRng,
    ) -> Option<SimEvent> {
        let mut pool: Vec<EntityId> = state
            .items
            .iter()
            .map(|i| i.name.clone())
            .filter(|name| !excluded.contains(name))
            .collect();
        if pool.len() < 2 {
            // Too few untouched items; allow any item.
            pool = state.items.iter().map(|i| i.name.clone()).collect();
        }
        let pair = rng.sample(&pool, 2);
        let [crashed, spiked] = pair.as_slice() else { return None };

        let mut saved_prices = BTreeMap::new();
        for (name, factor) in [(crashed, self.rules.crash_factor), (spiked, self.rules.spike_factor)] {
            let item = state.item(name)?.clone();
            let old = state.market_price(name).unwrap_or(item.base_price);
            saved_prices.insert(name.clone(), old);
            state.market_prices.insert(name.clone(), item.clamp_market_price(old * factor));
        }
        log::info!("day={day} market: event fired, {crashed} crashed, {spiked} spiked");
        state.market_event = Some(MarketEvent {
            day,
            crashed: crashed.clone(),
            spiked: spiked.clone(),
            saved_prices,
        });
        Some(SimEvent::MarketEventFired { day, crashed: crashed.clone(), spiked: spiked.clone() })
    }

    fn drift_demand(&self, day: Day, state: &mut GameState, rng: &mut SimRng) -> Vec<SimEvent> {
        let (lo, hi) = self.rules.demand_drift_items;
        let count = rng.range_u64(lo, hi) as usize;
        let names: Vec<EntityId> = state.items.iter().map(|i| i.name.clone()).collect();
        rng.sample(&names, count)
            .into_iter()
            .map(|item| {
                let (min_f, max_f) = self.rules.demand_drift_factor;
                let factor = rng.range_f64(min_f, max_f);
                let weight = state.item_demand.entry(item.clone()).or_insert(1.0);
                let old_weight = *weight;
                *weight = (old_weight * factor).clamp(DEMAND_MIN, DEMAND_MAX);
                SimEvent::DemandDrifted { day, item, old_weight, new_weight: *weight }
            })
            .collect()
    }
}

impl SimSubsystem for MarketSubsystem {
    fn name(&self) -> &'static str {
        "market"
    }

    fn update(
        &mut self,
        day:     Day,
        state:   &mut GameState,
        _ledger: &mut DayLedger,
        rng:     &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        if state.items.is_empty() {
            return Ok(out);
        }

        out.extend(self.revert_event(day, state));

        let before = state.market_prices.clone();
        let moved = self.fluctuate(day, state, rng);
        for item in &moved {
            let old_price = before.get(item).copied().unwrap_or_default();
            let new_price = state.market_price(item).unwrap_or_default();
            out.push(SimEvent::MarketPriceChanged { day, item: item.clone(), old_price, new_price });
        }

        let interval = self.rules.event_interval_days.max(1);
        if day % interval == 0 {
            out.extend(self.fire_event(day, state, &moved, rng));
        }

        out.extend(self.drift_demand(day, state, rng));
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
