//! The whole simulated world. The engine owns exactly one GameState and
//! hands it to each phase in turn; nothing else mutates it during a day.

use crate::{
    config::SimConfig,
    customer::{Archetype, Customer},
    error::{Rejection, SimError, SimResult},
    item::Item,
    player::Player,
    rng::SimRng,
    types::{Day, EntityId},
    upgrade::{OwnedUpgrade, Upgrade},
    vendor::Vendor,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Demand multipliers stay inside this band.
pub const DEMAND_MIN: f64 = 0.1;
pub const DEMAND_MAX: f64 = 2.0;

/// A scripted ±50% price event, reverted the day after it fires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketEvent {
    pub day:         Day,
    pub crashed:     EntityId,
    pub spiked:      EntityId,
    /// Prices of the two items before the event.
    pub saved_prices: BTreeMap<EntityId, f64>,
}

/// Key for the per-day vendor purchase counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PurchaseKey {
    pub vendor: EntityId,
    pub player: EntityId,
    pub item:   EntityId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub day:                    Day,
    pub items:                  Vec<Item>,
    pub vendors:                Vec<Vendor>,
    pub players:                Vec<Player>,
    pub customers:              Vec<Customer>,
    pub upgrades:               Vec<Upgrade>,
    pub market_prices:          BTreeMap<EntityId, f64>,
    pub item_demand:            BTreeMap<EntityId, f64>,
    pub market_event:           Option<MarketEvent>,
    #[serde(with = "purchase_counter")]
    pub vendor_daily_purchases: BTreeMap<PurchaseKey, u32>,
    pub round_robin_cursor:     u64,
}

impl GameState {
    /// A world on day 1 with market prices at base and neutral demand.
    pub fn new(items: Vec<Item>, vendors: Vec<Vendor>, upgrades: Vec<Upgrade>) -> Self {
        let market_prices = items.iter().map(|i| (i.name.clone(), i.base_price)).collect();
        let item_demand = items.iter().map(|i| (i.name.clone(), 1.0)).collect();
        Self {
            day: 1,
            items,
            vendors,
            players: Vec::new(),
            customers: Vec::new(),
            upgrades,
            market_prices,
            item_demand,
            market_event: None,
            vendor_daily_purchases: BTreeMap::new(),
            round_robin_cursor: 0,
        }
    }

    /// Build the starting world described by `config`, including players
    /// and the customer population.
    pub fn from_config(config: &SimConfig, rng: &mut SimRng) -> SimResult<Self> {
        let mut state = Self::new(config.items.clone(), config.vendors.clone(), config.upgrades.clone());
        for seed in &config.players {
            state.add_player(Player::new(seed.name.clone(), config.starting_cash, seed.is_human))?;
        }
        state.populate_customers(config, rng);
        Ok(state)
    }

    pub fn add_player(&mut self, player: Player) -> SimResult<()> {
        if self.players.iter().any(|p| p.name == player.name) {
            return Err(SimError::invalid("player", player.name, "duplicate player name"));
        }
        self.players.push(player);
        Ok(())
    }

    /// Replace the customer population with `customer_count` freshly
    /// rolled customers.
    pub fn populate_customers(&mut self, config: &SimConfig, rng: &mut SimRng) {
        let rules = &config.demand;
        let weights: Vec<f64> = Archetype::ALL.iter().map(|a| rules.archetype_weight(*a)).collect();
        self.customers = (0..rules.customer_count)
            .map(|i| {
                let archetype = rng
                    .weighted_index(&weights)
                    .map(|idx| Archetype::ALL[idx])
                    .unwrap_or(Archetype::Low);
                let (lo, hi) = rules.budget_range(archetype);
                let budget = rng.range_f64(lo, hi);
                let mut customer = Customer::new(format!("customer-{i:04}"), archetype, budget);
                if !archetype.is_special() && rng.chance(rules.specialization_chance) {
                    customer.roll_specializations(&self.items, rng);
                }
                customer
            })
            .collect();
    }

    /// Move to the next day and reset the per-day purchase counters.
    pub fn advance_day(&mut self) -> Day {
        self.day += 1;
        self.vendor_daily_purchases.clear();
        for player in &mut self.players {
            player.units_bought_today = 0;
        }
        self.day
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn vendor(&self, name: &str) -> Option<&Vendor> {
        self.vendors.iter().find(|v| v.name == name)
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn player_index(&self, name: &str) -> SimResult<usize> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| SimError::UnknownPlayer { name: name.to_string() })
    }

    pub fn market_price(&self, item: &str) -> Option<f64> {
        self.market_prices.get(item).copied()
    }

    /// Buy an upgrade from the catalog for `players[idx]`.
    pub fn purchase_upgrade(&mut self, idx: usize, upgrade_id: &str) -> Result<OwnedUpgrade, Rejection> {
        let day = self.day;
        let upgrade = self
            .upgrades
            .iter()
            .find(|u| u.id == upgrade_id)
            .ok_or_else(|| Rejection::UnknownUpgrade { upgrade: upgrade_id.to_string() })?;
        let player = &mut self.players[idx];
        if player.owns_upgrade(upgrade_id, day) {
            return Err(Rejection::AlreadyOwned { upgrade: upgrade_id.to_string() });
        }
        if player.store_level < upgrade.min_level {
            return Err(Rejection::LevelGate { required: upgrade.min_level, actual: player.store_level });
        }
        if player.cash < upgrade.cost {
            return Err(Rejection::InsufficientCash { needed: upgrade.cost, available: player.cash });
        }
        player.cash -= upgrade.cost;
        let owned = OwnedUpgrade::from_catalog(upgrade, day);
        player.upgrades.retain(|u| u.upgrade_id != upgrade_id);
        player.upgrades.push(owned.clone());
        Ok(owned)
    }

    pub fn highest_store_level(&self) -> u32 {
        self.players.iter().map(|p| p.store_level).max().unwrap_or(1)
    }
}

/// JSON object keys must be strings, so the purchase counter is stored
/// as a list of (key, count) pairs.
mod purchase_counter {
    use super::PurchaseKey;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<PurchaseKey, u32>, s: S) -> Result<S::Ok, S::Error> {
        map.iter().collect::<Vec<_>>().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<PurchaseKey, u32>, D::Error> {
        let pairs: Vec<(PurchaseKey, u32)> = Vec::deserialize(d)?;
        Ok(pairs.into_iter().collect())
    }
}
