use crate::{
    customer::Archetype,
    error::{SimError, SimResult},
    item::{Category, Item},
    upgrade::{Upgrade, UpgradeEffect},
    vendor::{SelectionPolicy, Vendor, VendorConstraints, VolumeTier},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Catalog files ──────────────────────────────────────────────────

/// Raw catalog row. Turned into an `Item` only through `Item::new`.
#[derive(Debug, Clone, Deserialize)]
struct ItemRecord {
    name:       String,
    base_cost:  f64,
    base_price: f64,
    category:   String,
}

#[derive(Debug, Clone, Deserialize)]
struct ItemCatalogFile {
    items: Vec<ItemRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct VendorFile {
    vendors: Vec<Vendor>,
}

#[derive(Debug, Clone, Deserialize)]
struct UpgradeFile {
    upgrades: Vec<Upgrade>,
}

#[derive(Debug, Clone, Deserialize)]
struct TuningFile {
    starting_cash: f64,
    players:       Vec<PlayerSeed>,
    store:         StoreRules,
    demand:        DemandRules,
    market:        MarketRules,
    reputation:    ReputationRules,
    strategy:      StrategyRules,
}

// ── Tuning ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSeed {
    pub name:     String,
    #[serde(default)]
    pub is_human: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StaffRules {
    pub hiring_fee:   f64,
    pub monthly_wage: f64,
    pub max:          u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreRules {
    /// Units a store may procure per day before upgrades and staff.
    pub base_throughput:          u32,
    pub throughput_per_restocker: u32,
    pub base_product_slots:       u32,
    pub slots_per_level:          u32,
    /// Regular customers served per day before cashiers and upgrades.
    pub base_customer_capacity:   u32,
    pub customers_per_cashier:    u32,
    pub xp_per_level:             u64,
    pub max_level:                u32,
    pub marketing_min_level:      u32,
    /// Regular customers refuse prices above market × this factor.
    pub price_ceiling_factor:     f64,
    /// Passes over a customer's needs before giving up.
    pub checkout_pass_limit:      u32,
    pub cashier:                  StaffRules,
    pub restocker:                StaffRules,
    pub marketing_agent:          StaffRules,
}

impl Default for StoreRules {
    fn default() -> Self {
        Self {
            base_throughput:          200,
            throughput_per_restocker: 100,
            base_product_slots:       15,
            slots_per_level:          3,
            base_customer_capacity:   25,
            customers_per_cashier:    15,
            xp_per_level:             250,
            max_level:                10,
            marketing_min_level:      3,
            price_ceiling_factor:     1.15,
            checkout_pass_limit:      20,
            cashier:         StaffRules { hiring_fee: 200.0, monthly_wage: 500.0,  max: 10 },
            restocker:       StaffRules { hiring_fee: 200.0, monthly_wage: 500.0,  max: 10 },
            marketing_agent: StaffRules { hiring_fee: 500.0, monthly_wage: 1000.0, max: 5 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandRules {
    pub customer_count:         usize,
    pub archetype_weights:      BTreeMap<Archetype, f64>,
    /// Budget range [lo, hi) per archetype.
    pub budgets:                BTreeMap<Archetype, (f64, f64)>,
    pub low_item_cap:           usize,
    pub medium_item_cap:        usize,
    pub high_item_cap:          usize,
    pub uncapped_min_price:     f64,
    pub hoard_units:            (u32, u32),
    pub party_units:            (u32, u32),
    pub windfall_max_items:     usize,
    pub mega_spender_quantity:  u32,
    pub seasonal_items:         Vec<String>,
    pub specialization_chance:  f64,
    pub shoplift_units:         (u32, u32),
    pub shoplift_reputation_penalty: f64,
}

impl DemandRules {
    pub fn item_cap(&self, archetype: Archetype) -> usize {
        match archetype {
            Archetype::Low    => self.low_item_cap,
            Archetype::Medium => self.medium_item_cap,
            Archetype::High   => self.high_item_cap,
            _                 => 1,
        }
    }

    pub fn archetype_weight(&self, archetype: Archetype) -> f64 {
        self.archetype_weights.get(&archetype).copied().unwrap_or(0.0)
    }

    pub fn budget_range(&self, archetype: Archetype) -> (f64, f64) {
        self.budgets.get(&archetype).copied().unwrap_or((10.0, 50.0))
    }

    pub fn validate(&self) -> SimResult<()> {
        ordered("demand", "hoard_units", self.hoard_units)?;
        ordered("demand", "party_units", self.party_units)?;
        ordered("demand", "shoplift_units", self.shoplift_units)?;
        for (archetype, range) in &self.budgets {
            ordered("demand", format!("budgets.{}", archetype.name()), *range)?;
        }
        Ok(())
    }
}

/// Tuning ranges are (lo, hi) pairs and must not be reversed.
fn ordered<T: PartialOrd + std::fmt::Display>(
    entity: &'static str,
    name:   impl Into<String>,
    (lo, hi): (T, T),
) -> SimResult<()> {
    if lo <= hi {
        Ok(())
    } else {
        Err(SimError::invalid(entity, name, format!("range ({lo}, {hi}) is reversed")))
    }
}

impl Default for DemandRules {
    fn default() -> Self {
        use Archetype::*;
        let archetype_weights = [
            (Low, 0.35), (Medium, 0.30), (High, 0.15), (Uncapped, 0.04),
            (Hoarder, 0.03), (Shoplifter, 0.02), (PartyPrep, 0.03), (Gamer, 0.03),
            (SeasonalShopper, 0.02), (WindfallShopper, 0.02), (MegaSpender, 0.01),
        ]
        .into_iter()
        .collect();
        let budgets = [
            (Low, (10.0, 50.0)), (Medium, (50.0, 200.0)), (High, (200.0, 1000.0)),
            (Uncapped, (1000.0, 5000.0)), (Hoarder, (100.0, 500.0)), (Shoplifter, (0.0, 1.0)),
            (PartyPrep, (100.0, 400.0)), (Gamer, (100.0, 800.0)), (SeasonalShopper, (50.0, 200.0)),
            (WindfallShopper, (2000.0, 10000.0)), (MegaSpender, (20000.0, 50000.0)),
        ]
        .into_iter()
        .collect();
        Self {
            customer_count: 60,
            archetype_weights,
            budgets,
            low_item_cap: 5,
            medium_item_cap: 10,
            high_item_cap: 15,
            uncapped_min_price: 100.0,
            hoard_units: (20, 30),
            party_units: (20, 30),
            windfall_max_items: 10,
            mega_spender_quantity: 1_000,
            seasonal_items: vec!["Sunscreen".into(), "Umbrella".into()],
            specialization_chance: 0.3,
            shoplift_units: (1, 2),
            shoplift_reputation_penalty: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketRules {
    /// Fluctuation range (fraction) for importance-3 items.
    pub essential_swing:     (f64, f64),
    pub mid_swing:           (f64, f64),
    pub luxury_swing:        (f64, f64),
    /// Items re-priced per day.
    pub items_per_day:       (u64, u64),
    pub event_interval_days: u64,
    pub crash_factor:        f64,
    pub spike_factor:        f64,
    pub demand_drift_items:  (u64, u64),
    pub demand_drift_factor: (f64, f64),
}

impl MarketRules {
    pub fn validate(&self) -> SimResult<()> {
        ordered("market", "essential_swing", self.essential_swing)?;
        ordered("market", "mid_swing", self.mid_swing)?;
        ordered("market", "luxury_swing", self.luxury_swing)?;
        ordered("market", "items_per_day", self.items_per_day)?;
        ordered("market", "demand_drift_items", self.demand_drift_items)?;
        ordered("market", "demand_drift_factor", self.demand_drift_factor)?;
        Ok(())
    }

    pub fn swing_for(&self, importance: u8) -> (f64, f64) {
        match importance {
            3 => self.essential_swing,
            1 => self.luxury_swing,
            _ => self.mid_swing,
        }
    }
}

impl Default for MarketRules {
    fn default() -> Self {
        Self {
            essential_swing:     (0.03, 0.06),
            mid_swing:           (0.05, 0.10),
            luxury_swing:        (0.07, 0.14),
            items_per_day:       (1, 2),
            event_interval_days: 30,
            crash_factor:        0.5,
            spike_factor:        1.5,
            demand_drift_items:  (1, 3),
            demand_drift_factor: (0.8, 1.25),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReputationRules {
    pub good_visit_pct:         f64,
    pub bad_visit_pct:          f64,
    pub min_daily_delta:        f64,
    pub max_daily_delta:        f64,
    pub empty_shelves_penalty:  f64,
    pub low_average_penalty:    f64,
    pub low_average_pct:        f64,
    pub decay_rate:             f64,
}

impl Default for ReputationRules {
    fn default() -> Self {
        Self {
            good_visit_pct:        80.0,
            bad_visit_pct:         30.0,
            min_daily_delta:       -5.0,
            max_daily_delta:       25.0,
            empty_shelves_penalty: 5.0,
            low_average_penalty:   5.0,
            low_average_pct:       30.0,
            decay_rate:            0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyRules {
    pub enabled:                bool,
    pub sold_out_markup:        f64,
    pub unsold_markdown:        f64,
    pub market_pull:            f64,
    pub min_margin:             f64,
    pub default_order_quantity: u32,
}

impl Default for StrategyRules {
    fn default() -> Self {
        Self {
            enabled:                true,
            sold_out_markup:        1.05,
            unsold_markdown:        0.95,
            market_pull:            0.25,
            min_margin:             1.05,
            default_order_quantity: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub items:         Vec<Item>,
    pub vendors:       Vec<Vendor>,
    pub upgrades:      Vec<Upgrade>,
    pub players:       Vec<PlayerSeed>,
    pub starting_cash: f64,
    pub store:         StoreRules,
    pub demand:        DemandRules,
    pub market:        MarketRules,
    pub reputation:    ReputationRules,
    pub strategy:      StrategyRules,
}

impl SimConfig {
    /// Load from the data/ directory. Every catalog entity is validated;
    /// an invalid one aborts the load.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let item_path = format!("{data_dir}/catalog/items.json");
        let item_content = std::fs::read_to_string(&item_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {item_path}: {e}"))?;
        let item_file: ItemCatalogFile = serde_json::from_str(&item_content)?;
        let items = item_file
            .items
            .into_iter()
            .map(|r| Item::new(r.name, r.base_cost, r.base_price, Category::from_label(&r.category)?))
            .collect::<SimResult<Vec<_>>>()?;

        let vendor_path = format!("{data_dir}/vendors/vendors.json");
        let vendor_content = std::fs::read_to_string(&vendor_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {vendor_path}: {e}"))?;
        let mut vendor_file: VendorFile = serde_json::from_str(&vendor_content)?;
        for vendor in &mut vendor_file.vendors {
            vendor.validate()?;
        }

        let upgrade_path = format!("{data_dir}/upgrades/upgrades.json");
        let upgrade_content = std::fs::read_to_string(&upgrade_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {upgrade_path}: {e}"))?;
        let upgrade_file: UpgradeFile = serde_json::from_str(&upgrade_content)?;
        for upgrade in &upgrade_file.upgrades {
            upgrade.validate()?;
        }

        let tuning_path = format!("{data_dir}/sim/tuning.json");
        let tuning_content = std::fs::read_to_string(&tuning_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {tuning_path}: {e}"))?;
        let tuning: TuningFile = serde_json::from_str(&tuning_content)?;
        tuning.demand.validate()?;
        tuning.market.validate()?;

        log::info!(
            "config: loaded {} items, {} vendors, {} upgrades from {data_dir}",
            items.len(),
            vendor_file.vendors.len(),
            upgrade_file.upgrades.len()
        );

        Ok(Self {
            items,
            vendors: vendor_file.vendors,
            upgrades: upgrade_file.upgrades,
            players: tuning.players,
            starting_cash: tuning.starting_cash,
            store: tuning.store,
            demand: tuning.demand,
            market: tuning.market,
            reputation: tuning.reputation,
            strategy: tuning.strategy,
        })
    }

    /// Config with hardcoded defaults for use in tests: a dozen items
    /// across every importance level, three vendors, two AI stores.
    pub fn default_test() -> SimResult<Self> {
        let rows: [(&str, f64, f64, Category); 12] = [
            ("Bread",          2.0,   5.0,   Category::FoodGroceries),
            ("Milk",           3.0,   6.0,   Category::FoodGroceries),
            ("Apples",         1.0,   3.0,   Category::FreshProduce),
            ("Soap",           1.5,   4.0,   Category::HouseholdEssentials),
            ("Sunscreen",      4.0,   9.0,   Category::PersonalCare),
            ("Umbrella",       6.0,   14.0,  Category::SportsOutdoor),
            ("Pens",           0.5,   2.0,   Category::OfficeSupplies),
            ("Headphones",     25.0,  60.0,  Category::Electronics),
            ("Video Game",     30.0,  60.0,  Category::Gaming),
            ("Gaming Console", 200.0, 400.0, Category::Gaming),
            ("Watch",          150.0, 350.0, Category::Luxury),
            ("Perfume",        40.0,  95.0,  Category::Luxury),
        ];
        let items = rows
            .into_iter()
            .map(|(name, cost, price, category)| Item::new(name, cost, price, category))
            .collect::<SimResult<Vec<_>>>()?;

        let vendors = vec![
            Vendor::new("Universal Supply Corp.", 1.02, SelectionPolicy::All),
            Vendor::new("Bulk Goods Co.", 0.85, SelectionPolicy::All)
                .with_lead_time(1)
                .with_constraints(VendorConstraints {
                    min_purchase: Some(10),
                    ..VendorConstraints::default()
                })
                .with_volume_tiers(vec![
                    VolumeTier { min_quantity: 100, multiplier: 0.80 },
                    VolumeTier { min_quantity: 500, multiplier: 0.75 },
                ]),
            Vendor::new("Daily Essentials Co.", 0.90, SelectionPolicy::Category)
                .with_lead_time(1)
                .with_catch_up(0.80)
                .with_constraints(VendorConstraints {
                    allowed_categories: Some(vec![Category::FoodGroceries, Category::FreshProduce]),
                    ..VendorConstraints::default()
                }),
        ];

        let upgrades = vec![
            Upgrade {
                id: "loading_dock".into(),
                name: "Loading Dock".into(),
                cost: 1500.0,
                min_level: 1,
                duration_days: 0,
                effect: UpgradeEffect::ThroughputBoost { units: 100 },
            },
            Upgrade {
                id: "shelving".into(),
                name: "Extra Shelving".into(),
                cost: 1000.0,
                min_level: 1,
                duration_days: 0,
                effect: UpgradeEffect::ProductSlots { slots: 5 },
            },
            Upgrade {
                id: "bulk_partnership".into(),
                name: "Bulk Goods Partnership".into(),
                cost: 800.0,
                min_level: 2,
                duration_days: 30,
                effect: UpgradeEffect::VendorDiscount { vendor: "Bulk Goods Co.".into(), fraction: 0.10 },
            },
        ];

        Ok(Self {
            items,
            vendors,
            upgrades,
            players: vec![
                PlayerSeed { name: "Alice Corp".into(), is_human: false },
                PlayerSeed { name: "Bob Ltd".into(), is_human: false },
            ],
            starting_cash: 2_000.0,
            store: StoreRules::default(),
            demand: DemandRules { customer_count: 30, ..DemandRules::default() },
            market: MarketRules::default(),
            reputation: ReputationRules::default(),
            strategy: StrategyRules::default(),
        })
    }
}
