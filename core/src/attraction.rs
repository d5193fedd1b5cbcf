//! Customer Attraction Score (CAS).
//!
//! A store with at least one stocked, priced item within the regular
//! price ceiling earns:
//!
//!   CAS = (discount + 2 × marketing + stability)
//!         × reputation_mult × availability_mult × fulfillment_mult
//!
//! Stores with nothing qualifying score exactly 0 and are never picked by
//! the weighted draw while any other store scores above 0. When every
//! store scores 0, customers are dealt out round-robin.

use crate::{item::Item, player::Player, rng::SimRng, types::EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price within this fraction of market earns full proximity.
const PROXIMITY_BAND_PCT: f64 = 5.0;
const MAX_PROXIMITY: f64 = 10.0;
const CONSISTENCY_BONUS: f64 = 2.0;
const CONSISTENCY_BAND: f64 = 0.05;
const MARKETING_REPUTATION_CAP: f64 = 50.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CasBreakdown {
    pub discount:     f64,
    pub stability:    f64,
    pub marketing:    f64,
    pub reputation:   f64,
    pub availability: f64,
    pub fulfillment:  f64,
    pub total:        f64,
}

/// Score one store against today's market.
pub fn score_player(
    player:          &Player,
    items:           &[Item],
    market_prices:   &BTreeMap<EntityId, f64>,
    ceiling_factor:  f64,
) -> CasBreakdown {
    let mut discount = 0.0;
    let mut stability = 0.0;
    let mut qualifying = 0usize;

    for item in items {
        if !player.is_stocked(&item.name) {
            continue;
        }
        let (Some(price), Some(market)) = (player.price(&item.name), market_prices.get(&item.name).copied())
        else {
            continue;
        };
        if market <= 0.0 || price > market * ceiling_factor {
            continue;
        }
        qualifying += 1;
        let importance = item.importance() as f64;

        discount += ((market - price) / market * 100.0).max(0.0) * importance;

        let consistency = match player.previous_prices.get(&item.name) {
            Some(prev) if *prev > 0.0 && ((price - prev) / prev).abs() > CONSISTENCY_BAND => 0.0,
            _ => CONSISTENCY_BONUS,
        };
        stability += (proximity(price, market) + consistency) * importance;
    }

    if qualifying == 0 {
        return CasBreakdown::default();
    }

    let marketing = marketing_effect(player, items, market_prices);
    let reputation = reputation_multiplier(player.reputation);
    let availability = availability_multiplier(player, items);
    let fulfillment = fulfillment_multiplier(player.average_fulfillment_pct);
    let total = (discount + 2.0 * marketing + stability) * reputation * availability * fulfillment;

    CasBreakdown { discount, stability, marketing, reputation, availability, fulfillment, total }
}

/// 10 points inside ±5% of market, losing one point per percent beyond.
pub fn proximity(price: f64, market: f64) -> f64 {
    let pct = (price - market).abs() / market * 100.0;
    if pct <= PROXIMITY_BAND_PCT {
        MAX_PROXIMITY
    } else {
        (MAX_PROXIMITY - (pct - PROXIMITY_BAND_PCT)).max(0.0)
    }
}

pub fn marketing_effect(
    player:        &Player,
    items:         &[Item],
    market_prices: &BTreeMap<EntityId, f64>,
) -> f64 {
    if player.staff.marketing_agents == 0 {
        return 0.0;
    }
    let highest = items
        .iter()
        .filter(|i| player.is_stocked(&i.name))
        .filter_map(|i| market_prices.get(&i.name).copied())
        .fold(0.0_f64, f64::max);
    (player.reputation / 2.0).min(MARKETING_REPUTATION_CAP) + (highest / 10.0).floor()
}

pub fn reputation_multiplier(reputation: f64) -> f64 {
    10f64.powf(reputation / 100.0)
}

/// Share of the catalog the store has on its shelves.
pub fn availability_multiplier(player: &Player, items: &[Item]) -> f64 {
    if items.is_empty() {
        return 0.5;
    }
    let stocked = items.iter().filter(|i| player.is_stocked(&i.name)).count();
    let coverage = stocked as f64 / items.len() as f64 * 100.0;
    match coverage {
        c if c >= 100.0 => 1.2,
        c if c >= 80.0  => 1.1,
        c if c >= 50.0  => 1.0,
        c if c >= 20.0  => 0.8,
        _               => 0.5,
    }
}

pub fn fulfillment_multiplier(average_pct: f64) -> f64 {
    match average_pct {
        p if p >= 100.0 => 2.0,
        p if p >= 90.0  => 1.4,
        p if p >= 50.0  => 1.0,
        p if p >= 20.0  => 0.9,
        _               => 0.5,
    }
}

/// Pick a store index for one customer. Weighted by score; round-robin
/// through `cursor` when no store scores above zero.
pub fn route_customer(scores: &[f64], cursor: &mut u64, rng: &mut SimRng) -> Option<usize> {
    if scores.is_empty() {
        return None;
    }
    if let Some(idx) = rng.weighted_index(scores) {
        return Some(idx);
    }
    let idx = (*cursor % scores.len() as u64) as usize;
    *cursor += 1;
    Some(idx)
}
