//! Customers and their archetypes.
//!
//! Every archetype has one `generate_needs` rule and one
//! `choose_supplier` rule. Regular tiers share the generic
//! demand-weighted loop; specialists each follow their own rule.

use crate::{
    attraction,
    config::DemandRules,
    item::{Category, Item},
    player::Player,
    rng::SimRng,
    types::EntityId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Low,
    Medium,
    High,
    Uncapped,
    Hoarder,
    Shoplifter,
    PartyPrep,
    Gamer,
    SeasonalShopper,
    WindfallShopper,
    MegaSpender,
}

impl Archetype {
    pub const ALL: [Archetype; 11] = [
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Uncapped,
        Self::Hoarder,
        Self::Shoplifter,
        Self::PartyPrep,
        Self::Gamer,
        Self::SeasonalShopper,
        Self::WindfallShopper,
        Self::MegaSpender,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low             => "low",
            Self::Medium          => "medium",
            Self::High            => "high",
            Self::Uncapped        => "uncapped",
            Self::Hoarder         => "hoarder",
            Self::Shoplifter      => "shoplifter",
            Self::PartyPrep       => "party_prep",
            Self::Gamer           => "gamer",
            Self::SeasonalShopper => "seasonal_shopper",
            Self::WindfallShopper => "windfall_shopper",
            Self::MegaSpender     => "mega_spender",
        }
    }

    /// Specialists ignore the price ceiling and store capacity.
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::Low | Self::Medium | Self::High | Self::Uncapped)
    }

    pub fn generate_needs(
        &self,
        customer: &Customer,
        ctx: &DemandContext<'_>,
        rng: &mut SimRng,
    ) -> Vec<Need> {
        match self {
            Self::Low | Self::Medium | Self::High => {
                let cap = ctx.rules.item_cap(*self);
                let specialized = |item: &Item| {
                    customer.specializations.is_empty()
                        || customer.specializations.contains(&item.category)
                };
                ctx.pick_distinct(customer.budget, cap, specialized, rng)
                    .into_iter()
                    .map(|item| Need::new(item, 1))
                    .collect()
            }
            Self::Uncapped => {
                let pool = ctx.weighted_pool(|item| ctx.market_price(item) >= ctx.rules.uncapped_min_price);
                rng.weighted_sample(&pool, 1)
                    .into_iter()
                    .map(|item| Need::new(item, 1))
                    .collect()
            }
            Self::Hoarder => hoarder_needs(customer, ctx, rng),
            Self::Shoplifter => Vec::new(),
            Self::PartyPrep => party_prep_needs(customer, ctx, rng),
            Self::Gamer => {
                let k = rng.range_u64(1, 3) as usize;
                ctx.pick_distinct(customer.budget, k, |item| item.category == Category::Gaming, rng)
                    .into_iter()
                    .map(|item| Need::new(item, 1))
                    .collect()
            }
            Self::SeasonalShopper => ctx
                .rules
                .seasonal_items
                .iter()
                .filter(|name| ctx.items.iter().any(|i| &i.name == *name))
                .map(|name| Need::new(name.clone(), 1))
                .collect(),
            Self::WindfallShopper => ctx
                .pick_distinct(
                    customer.budget,
                    ctx.rules.windfall_max_items,
                    |item| item.category == Category::Luxury,
                    rng,
                )
                .into_iter()
                .map(|item| Need::new(item, 1))
                .collect(),
            Self::MegaSpender => ctx
                .items
                .iter()
                .map(|item| Need::new(item.name.clone(), ctx.rules.mega_spender_quantity))
                .collect(),
        }
    }

    /// Pick the store this customer visits today, as an index into
    /// `players`. `scores` holds each player's attraction score.
    pub fn choose_supplier(
        &self,
        players: &[Player],
        scores: &[f64],
        round_robin_cursor: &mut u64,
        rng: &mut SimRng,
    ) -> Option<usize> {
        match self {
            // Thieves go wherever there is something on the shelves.
            Self::Shoplifter => {
                let targets: Vec<usize> = players
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !p.inventory_empty())
                    .map(|(i, _)| i)
                    .collect();
                if targets.is_empty() {
                    return None;
                }
                Some(targets[rng.next_u64_below(targets.len() as u64) as usize])
            }
            _ => attraction::route_customer(scores, round_robin_cursor, rng),
        }
    }
}

fn hoarder_needs(customer: &Customer, ctx: &DemandContext<'_>, rng: &mut SimRng) -> Vec<Need> {
    let affordable: Vec<&Item> = ctx
        .items
        .iter()
        .filter(|i| ctx.market_price(i) <= customer.budget)
        .collect();
    if affordable.is_empty() {
        return Vec::new();
    }
    let item = affordable[rng.next_u64_below(affordable.len() as u64) as usize];
    let wanted = rng.range_u64(ctx.rules.hoard_units.0 as u64, ctx.rules.hoard_units.1 as u64) as u32;
    let can_afford = (customer.budget / ctx.market_price(item)).floor() as u32;
    let quantity = wanted.min(can_afford);
    if quantity == 0 {
        return Vec::new();
    }
    vec![Need::new(item.name.clone(), quantity)]
}

fn party_prep_needs(customer: &Customer, ctx: &DemandContext<'_>, rng: &mut SimRng) -> Vec<Need> {
    let target = rng.range_u64(ctx.rules.party_units.0 as u64, ctx.rules.party_units.1 as u64) as u32;
    let mut budget = customer.budget;
    let mut basket: BTreeMap<EntityId, u32> = BTreeMap::new();
    let mut order: Vec<EntityId> = Vec::new();
    for _ in 0..target {
        let pool = ctx.weighted_pool(|item| item.importance() == 3 && ctx.market_price(item) <= budget);
        let Some(name) = rng.weighted_sample(&pool, 1).pop() else { break };
        budget -= ctx.market_price_of(&name);
        let units = basket.entry(name.clone()).or_insert(0);
        if *units == 0 {
            order.push(name);
        }
        *units += 1;
    }
    order
        .into_iter()
        .map(|name| {
            let quantity = basket[&name];
            Need::new(name, quantity)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Need {
    pub item:     EntityId,
    pub quantity: u32,
}

impl Need {
    pub fn new(item: impl Into<String>, quantity: u32) -> Self {
        Self { item: item.into(), quantity }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub name:            EntityId,
    pub archetype:       Archetype,
    pub budget:          f64,
    /// Preferred category pair; empty means no preference.
    #[serde(default)]
    pub specializations: Vec<Category>,
}

impl Customer {
    pub fn new(name: impl Into<String>, archetype: Archetype, budget: f64) -> Self {
        Self {
            name: name.into(),
            archetype,
            budget,
            specializations: Vec::new(),
        }
    }

    /// Roll two categories from those present in `items`. Two distinct
    /// categories when the market has at least two, otherwise the only
    /// one twice.
    pub fn roll_specializations(&mut self, items: &[Item], rng: &mut SimRng) {
        let mut present: Vec<Category> = items.iter().map(|i| i.category).collect();
        present.sort();
        present.dedup();
        self.specializations = match present.len() {
            0 => Vec::new(),
            1 => vec![present[0], present[0]],
            _ => rng.sample(&present, 2),
        };
    }
}

/// Read-only inputs for need generation.
pub struct DemandContext<'a> {
    pub items:         &'a [Item],
    pub market_prices: &'a BTreeMap<EntityId, f64>,
    pub demand:        &'a BTreeMap<EntityId, f64>,
    pub rules:         &'a DemandRules,
}

impl<'a> DemandContext<'a> {
    pub fn market_price(&self, item: &Item) -> f64 {
        self.market_prices.get(&item.name).copied().unwrap_or(item.base_price)
    }

    fn market_price_of(&self, name: &str) -> f64 {
        self.items
            .iter()
            .find(|i| i.name == name)
            .map(|i| self.market_price(i))
            .unwrap_or(0.0)
    }

    /// Demand weight; items missing from the demand map weigh 1.0.
    pub fn weight(&self, item: &Item) -> f64 {
        self.demand.get(&item.name).copied().unwrap_or(1.0)
    }

    fn weighted_pool(&self, keep: impl Fn(&Item) -> bool) -> Vec<(EntityId, f64)> {
        self.items
            .iter()
            .filter(|i| keep(i))
            .map(|i| (i.name.clone(), self.weight(i)))
            .collect()
    }

    /// Draw up to `k` distinct items one at a time, each demand-weighted
    /// among the not-yet-chosen items still affordable within the
    /// remaining budget.
    pub fn pick_distinct(
        &self,
        budget: f64,
        k: usize,
        keep: impl Fn(&Item) -> bool,
        rng: &mut SimRng,
    ) -> Vec<EntityId> {
        let mut remaining = budget;
        let mut chosen: Vec<EntityId> = Vec::new();
        while chosen.len() < k && remaining > 0.0 {
            let pool = self.weighted_pool(|item| {
                keep(item) && !chosen.contains(&item.name) && self.market_price(item) <= remaining
            });
            let Some(name) = rng.weighted_sample(&pool, 1).pop() else { break };
            remaining -= self.market_price_of(&name);
            chosen.push(name);
        }
        chosen
    }
}
