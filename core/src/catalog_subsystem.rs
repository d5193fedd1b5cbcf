//! Vendor catalog subsystem: rebuilds every vendor's offered items.
//!
//! Runs in the rollover stage, after the day counter advances, so the
//! next day's procurement buys from catalogs priced off the market the
//! previous day closed at. The engine also runs it once at build time.
//!
//! Each vendor's `offered` map is replaced wholesale. `random_daily`
//! draws from a stream derived from (run seed, day, vendor name) rather
//! than the shared RNG, so rebuilding twice on the same day yields the
//! same catalog.

use crate::{
    error::SimResult,
    event::SimEvent,
    item::Item,
    ledger::DayLedger,
    rng::SimRng,
    state::GameState,
    subsystem::SimSubsystem,
    types::{Day, EntityId},
    vendor::{SelectionPolicy, Vendor},
};
use std::collections::BTreeMap;

pub struct CatalogSubsystem {
    seed: u64,
}

impl CatalogSubsystem {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Compute one vendor's offering for `day`.
pub fn build_offering(
    vendor:        &Vendor,
    items:         &[Item],
    market_prices: &BTreeMap<EntityId, f64>,
    day:           Day,
    seed:          u64,
) -> BTreeMap<EntityId, f64> {
    let market = |item: &Item| market_prices.get(&item.name).copied().unwrap_or(item.base_price);

    let eligible: Vec<&Item> = items
        .iter()
        .filter(|i| vendor.allows_category(i.category))
        .collect();

    let selected: Vec<&Item> = match &vendor.selection {
        SelectionPolicy::All | SelectionPolicy::Category => eligible,
        SelectionPolicy::PriceThreshold { max_price } => {
            eligible.into_iter().filter(|i| market(i) <= *max_price).collect()
        }
        SelectionPolicy::PriceRange { min_price, max_price } => eligible
            .into_iter()
            .filter(|i| (*min_price..=*max_price).contains(&market(i)))
            .collect(),
        SelectionPolicy::RandomDaily { count } => {
            let mut rng = SimRng::new(catalog_seed(seed, day, &vendor.name));
            rng.sample(&eligible, *count)
        }
    };

    selected
        .into_iter()
        .map(|i| (i.name.clone(), market(i) * vendor.pricing_multiplier))
        .filter(|(_, price)| {
            vendor
                .constraints
                .price_bounds
                .map_or(true, |(lo, hi)| (lo..=hi).contains(price))
        })
        .collect()
}

/// Replace every vendor's offering. Returns (vendor, offered count) pairs.
pub fn refresh_catalogs(state: &mut GameState, seed: u64) -> Vec<(EntityId, usize)> {
    let day = state.day;
    let GameState { vendors, items, market_prices, .. } = state;
    vendors
        .iter_mut()
        .map(|vendor| {
            vendor.offered = build_offering(vendor, items, market_prices, day, seed);
            (vendor.name.clone(), vendor.offered.len())
        })
        .collect()
}

/// FNV-1a over the vendor name, mixed with the run seed and day.
fn catalog_seed(seed: u64, day: Day, vendor: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in vendor.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    seed ^ hash ^ day.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl SimSubsystem for CatalogSubsystem {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn update(
        &mut self,
        day:     Day,
        state:   &mut GameState,
        _ledger: &mut DayLedger,
        _rng:    &mut SimRng,
    ) -> SimResult<Vec<SimEvent>> {
        let refreshed = refresh_catalogs(state, self.seed);
        Ok(refreshed
            .into_iter()
            .map(|(vendor, offered_count)| {
                log::debug!("day={day} catalog: {vendor} offers {offered_count} items");
                SimEvent::CatalogRefreshed { day, vendor, offered_count }
            })
            .collect())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
