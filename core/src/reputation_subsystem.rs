//! Reputation subsystem: daily reputation and rolling fulfillment.
//!
//! Per player, from today's visits:
//!   - +1 per visit at ≥ good_visit_pct, +1 more for a complete visit to
//!     a single store; −1 per visit at ≤ bad_visit_pct.
//!   - Net customer delta clamped to [min_daily_delta, max_daily_delta].
//!   - Flat penalties: empty shelves, low rolling average (yesterday's),
//!     shoplifting.
//!   - Positive reputation decays by ceil(decay_rate × rep), never below 0.
//!   - Final clamp to [-100, 100].
//! The rolling average becomes the mean of today's visit percentages,
//! unchanged on a day without visits.
//!
//! Execution: last in the day stage, after checkout and wages.

use crate::{
    config::ReputationRules,
    error::SimResult,
    event::SimEvent,
    ledger::{DayLedger, Visit},
    player::Player,
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::Day,
};

pub const REPUTATION_MIN: f64 = -100.0;
pub const REPUTATION_MAX: f64 = 100.0;

/// A visit at or above this counts as complete.
const COMPLETE_VISIT_PCT: f64 = 99.999;

/// What one day's update did to a player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReputationChange {
    pub old_reputation: f64,
    pub new_reputation: f64,
    pub customer_delta: f64,
    pub penalties:      f64,
}

/// Net customer-driven delta from today's visits, clamped.
pub fn customer_delta(visits: &[Visit], rules: &ReputationRules) -> f64 {
    let raw: f64 = visits
        .iter()
        .map(|v| {
            if v.fulfillment_pct >= rules.good_visit_pct {
                let complete = v.fulfillment_pct >= COMPLETE_VISIT_PCT && v.stores_visited == 1;
                if complete { 2.0 } else { 1.0 }
            } else if v.fulfillment_pct <= rules.bad_visit_pct {
                -1.0
            } else {
                0.0
            }
        })
        .sum();
    raw.clamp(rules.min_daily_delta, rules.max_daily_delta)
}

/// Apply one day's reputation update to `player`.
/// `extra_penalty` carries flat penalties recorded during the day.
pub fn apply_daily_reputation(
    player:        &mut Player,
    visits:        &[Visit],
    extra_penalty: f64,
    rules:         &ReputationRules,
) -> ReputationChange {
    let old_reputation = player.reputation;
    let delta = customer_delta(visits, rules);

    let mut penalties = extra_penalty;
    if player.inventory_empty() {
        penalties += rules.empty_shelves_penalty;
    }
    if player.average_fulfillment_pct < rules.low_average_pct {
        penalties += rules.low_average_penalty;
    }

    let mut reputation = old_reputation + delta - penalties;
    if reputation > 0.0 {
        reputation = (reputation - (reputation * rules.decay_rate).ceil()).max(0.0);
    }
    player.reputation = reputation.clamp(REPUTATION_MIN, REPUTATION_MAX);

    if !visits.is_empty() {
        player.average_fulfillment_pct =
            visits.iter().map(|v| v.fulfillment_pct).sum::<f64>() / visits.len() as f64;
    }

    ReputationChange {
        old_reputation,
        new_reputation: player.reputation,
        customer_delta: delta,
        penalties,
    }
}

pub struct ReputationSubsystem {
    rules: ReputationRules,
}

impl ReputationSubsystem {
    pub fn new(rules: ReputationRules) -> Self {
        Self { rules }
    }
}

impl SimSubsystem for ReputationSubsystem {
    fn name(&self) -> &'static str {
        "reputation"
    }

    fn update(
        &mut self,
        day:    Day,
        state:  &mut GameState,
        ledger: &mut DayLedger,
        _rng:   &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let mut out = Vec::new();
        for player in &mut state.players {
            let visits = ledger.visits.get(&player.name).map(Vec::as_slice).unwrap_or(&[]);
            let extra = ledger.reputation_penalty.get(&player.name).copied().unwrap_or(0.0);
            let change = apply_daily_reputation(player, visits, extra, &self.rules);

            if change.new_reputation - change.old_reputation <= -10.0 {
                log::warn!(
                    "day={day} reputation: {} dropped {:.0} -> {:.0}",
                    player.name, change.old_reputation, change.new_reputation
                );
            } else {
                log::debug!(
                    "day={day} reputation: {} {:.0} -> {:.0}",
                    player.name, change.old_reputation, change.new_reputation
                );
            }
            out.push(SimEvent::ReputationUpdated {
                day,
                player:              player.name.clone(),
                old_reputation:      change.old_reputation,
                new_reputation:      change.new_reputation,
                customer_delta:      change.customer_delta,
                penalties:           change.penalties,
                average_fulfillment: player.average_fulfillment_pct,
            });
        }
        Ok(out)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
