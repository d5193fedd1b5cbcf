//! Store upgrades. The upgrade catalog is fixed at setup; players own
//! `OwnedUpgrade` records pointing back into it by id.

use crate::{
    error::{SimError, SimResult},
    types::{Day, EntityId},
};
use serde::{Deserialize, Serialize};

/// Vendor discounts stack additively up to this fraction.
pub const MAX_VENDOR_DISCOUNT: f64 = 0.15;

/// Production lines buy at this fraction of market price.
pub const PRODUCTION_LINE_PRICE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpgradeEffect {
    /// Extra units the player may buy per day.
    ThroughputBoost { units: u32 },
    /// Extra distinct products the store may carry.
    ProductSlots { slots: u32 },
    /// Fractional discount on one vendor's prices.
    VendorDiscount { vendor: EntityId, fraction: f64 },
    /// Days removed from every vendor's lead time.
    LeadTimeReduction { days: u32 },
    /// Produce one item in-house at half of market price.
    ProductionLine { item: EntityId },
    /// Extra regular customers served per day.
    CustomerCapacity { customers: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Upgrade {
    pub id:            EntityId,
    pub name:          String,
    pub cost:          f64,
    #[serde(default = "default_min_level")]
    pub min_level:     u32,
    /// 0 = permanent.
    #[serde(default)]
    pub duration_days: u32,
    pub effect:        UpgradeEffect,
}

fn default_min_level() -> u32 { 1 }

impl Upgrade {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.cost >= 0.0) {
            return Err(SimError::invalid("upgrade", &self.id, "cost must be >= 0"));
        }
        if let UpgradeEffect::VendorDiscount { fraction, .. } = &self.effect {
            if !(0.0..=1.0).contains(fraction) {
                return Err(SimError::invalid("upgrade", &self.id, "discount fraction must be in [0, 1]"));
            }
        }
        Ok(())
    }

    pub fn is_permanent(&self) -> bool {
        self.duration_days == 0
    }
}

/// An upgrade held by a player. Temporary upgrades lapse on `expires_day`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedUpgrade {
    pub upgrade_id:    EntityId,
    pub purchased_day: Day,
    pub expires_day:   Option<Day>,
    pub effect:        UpgradeEffect,
}

impl OwnedUpgrade {
    pub fn from_catalog(upgrade: &Upgrade, day: Day) -> Self {
        Self {
            upgrade_id:    upgrade.id.clone(),
            purchased_day: day,
            expires_day:   (!upgrade.is_permanent()).then(|| day + upgrade.duration_days as Day),
            effect:        upgrade.effect.clone(),
        }
    }

    pub fn is_active(&self, day: Day) -> bool {
        self.expires_day.map_or(true, |end| day < end)
    }
}
