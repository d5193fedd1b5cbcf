//! Wholesale vendors. Everything except `offered` is fixed at setup;
//! `offered` is replaced wholesale once per day by the catalog phase.

use crate::{
    error::{SimError, SimResult},
    item::Category,
    types::EntityId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Every catalog item.
    All,
    /// Items whose market price is at or below `max_price`.
    PriceThreshold { max_price: f64 },
    /// Items whose market price is within `[min_price, max_price]`.
    PriceRange { min_price: f64, max_price: f64 },
    /// Whatever survives the `allowed_categories` filter.
    Category,
    /// `count` items sampled without replacement, re-drawn daily.
    RandomDaily { count: usize },
}

/// A volume discount: orders of at least `min_quantity` units are priced
/// at `multiplier` × market instead of the vendor's base multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VolumeTier {
    pub min_quantity: u32,
    pub multiplier:   f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VendorConstraints {
    #[serde(default)]
    pub min_purchase:        Option<u32>,
    /// Offered unit prices outside these bounds are not listed.
    #[serde(default)]
    pub price_bounds:        Option<(f64, f64)>,
    #[serde(default)]
    pub max_per_player_item: Option<u32>,
    #[serde(default)]
    pub min_reputation:      Option<f64>,
    #[serde(default)]
    pub min_level:           Option<u32>,
    #[serde(default)]
    pub allowed_categories:  Option<Vec<Category>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub name:                EntityId,
    pub pricing_multiplier:  f64,
    pub selection:           SelectionPolicy,
    #[serde(default)]
    pub constraints:         VendorConstraints,
    #[serde(default)]
    pub lead_time:           u32,
    /// Kept sorted by `min_quantity`, largest first.
    #[serde(default)]
    pub volume_tiers:        Vec<VolumeTier>,
    /// Multiplier offered to trailing stores from day 10 on.
    #[serde(default)]
    pub catch_up_multiplier: Option<f64>,
    /// Today's offered items: item name -> unit price.
    #[serde(default)]
    pub offered:             BTreeMap<EntityId, f64>,
}

impl Vendor {
    pub fn new(name: impl Into<String>, pricing_multiplier: f64, selection: SelectionPolicy) -> Self {
        Self {
            name: name.into(),
            pricing_multiplier,
            selection,
            constraints: VendorConstraints::default(),
            lead_time: 0,
            volume_tiers: Vec::new(),
            catch_up_multiplier: None,
            offered: BTreeMap::new(),
        }
    }

    pub fn with_lead_time(mut self, days: u32) -> Self {
        self.lead_time = days;
        self
    }

    pub fn with_constraints(mut self, constraints: VendorConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_volume_tiers(mut self, tiers: Vec<VolumeTier>) -> Self {
        self.volume_tiers = tiers;
        self.sort_tiers();
        self
    }

    pub fn with_catch_up(mut self, multiplier: f64) -> Self {
        self.catch_up_multiplier = Some(multiplier);
        self
    }

    pub fn validate(&mut self) -> SimResult<()> {
        if !(self.pricing_multiplier > 0.0) {
            return Err(SimError::invalid("vendor", &self.name, "pricing multiplier must be > 0"));
        }
        if self.volume_tiers.iter().any(|t| !(t.multiplier > 0.0)) {
            return Err(SimError::invalid("vendor", &self.name, "volume tier multiplier must be > 0"));
        }
        if let SelectionPolicy::PriceRange { min_price, max_price } = self.selection {
            if min_price > max_price {
                return Err(SimError::invalid("vendor", &self.name, "price range min exceeds max"));
            }
        }
        self.sort_tiers();
        Ok(())
    }

    fn sort_tiers(&mut self) {
        self.volume_tiers.sort_by(|a, b| b.min_quantity.cmp(&a.min_quantity));
    }

    /// Multiplier for an order of `quantity` units: the first tier (largest
    /// threshold first) the quantity meets, else `None`.
    pub fn tier_multiplier(&self, quantity: u32) -> Option<f64> {
        self.volume_tiers
            .iter()
            .find(|t| quantity >= t.min_quantity)
            .map(|t| t.multiplier)
    }

    pub fn allows_category(&self, category: Category) -> bool {
        self.constraints
            .allowed_categories
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&category))
    }
}
