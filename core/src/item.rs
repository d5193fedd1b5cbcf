//! Catalog items. Immutable once constructed; every item in a running
//! simulation has passed `Item::new`.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};

/// Minimum markup of base price over unit cost.
pub const MIN_MARKUP: f64 = 1.2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    #[serde(rename = "Food & Groceries")]
    FoodGroceries,
    #[serde(rename = "Fresh Produce")]
    FreshProduce,
    #[serde(rename = "Household Essentials")]
    HouseholdEssentials,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
    #[serde(rename = "Electronics")]
    Electronics,
    #[serde(rename = "Gaming")]
    Gaming,
    #[serde(rename = "Sports & Outdoor")]
    SportsOutdoor,
    #[serde(rename = "Home Decor")]
    HomeDecor,
    #[serde(rename = "Toys & Games")]
    ToysGames,
    #[serde(rename = "Pet Supplies")]
    PetSupplies,
    #[serde(rename = "Automotive")]
    Automotive,
    #[serde(rename = "Supplements")]
    Supplements,
    #[serde(rename = "Luxury")]
    Luxury,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Self::FoodGroceries,
        Self::FreshProduce,
        Self::HouseholdEssentials,
        Self::PersonalCare,
        Self::OfficeSupplies,
        Self::Electronics,
        Self::Gaming,
        Self::SportsOutdoor,
        Self::HomeDecor,
        Self::ToysGames,
        Self::PetSupplies,
        Self::Automotive,
        Self::Supplements,
        Self::Luxury,
    ];

    /// 3 = essentials, 2 = mid-range, 1 = luxury.
    pub fn importance(&self) -> u8 {
        match self {
            Self::FoodGroceries
            | Self::FreshProduce
            | Self::HouseholdEssentials
            | Self::PersonalCare => 3,
            Self::Luxury => 1,
            _ => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoodGroceries       => "Food & Groceries",
            Self::FreshProduce        => "Fresh Produce",
            Self::HouseholdEssentials => "Household Essentials",
            Self::PersonalCare        => "Personal Care",
            Self::OfficeSupplies      => "Office Supplies",
            Self::Electronics         => "Electronics",
            Self::Gaming              => "Gaming",
            Self::SportsOutdoor       => "Sports & Outdoor",
            Self::HomeDecor           => "Home Decor",
            Self::ToysGames           => "Toys & Games",
            Self::PetSupplies         => "Pet Supplies",
            Self::Automotive          => "Automotive",
            Self::Supplements         => "Supplements",
            Self::Luxury              => "Luxury",
        }
    }

    /// Parse a catalog label. Unknown labels are an entity error.
    pub fn from_label(label: &str) -> SimResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.label() == label)
            .ok_or_else(|| SimError::invalid("category", label, "unknown category"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub name:       String,
    pub base_cost:  f64,
    pub base_price: f64,
    pub category:   Category,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        base_cost: f64,
        base_price: f64,
        category: Category,
    ) -> SimResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SimError::invalid("item", name, "name must not be empty"));
        }
        if !(base_cost > 0.0) {
            return Err(SimError::invalid("item", name, format!("cost must be > 0, got {base_cost}")));
        }
        if !(base_price > 0.0) {
            return Err(SimError::invalid("item", name, format!("price must be > 0, got {base_price}")));
        }
        if base_price < base_cost * MIN_MARKUP {
            return Err(SimError::invalid(
                "item",
                name,
                format!("price {base_price:.2} is below {MIN_MARKUP}x cost {base_cost:.2}"),
            ));
        }
        Ok(Self { name, base_cost, base_price, category })
    }

    pub fn importance(&self) -> u8 {
        self.category.importance()
    }

    /// Lower bound of the market-price invariant.
    pub fn price_floor(&self) -> f64 {
        self.base_cost * MIN_MARKUP
    }

    /// Upper bound of the market-price invariant.
    pub fn price_ceiling(&self) -> f64 {
        self.base_price * 2.0
    }

    pub fn clamp_market_price(&self, price: f64) -> f64 {
        price.clamp(self.price_floor(), self.price_ceiling())
    }
}
