//! Data-file loading and entity validation.

use storefront_core::{
    config::{DemandRules, MarketRules, SimConfig},
    engine::SimEngine,
    error::SimError,
    item::{Category, Item},
    store::SimStore,
    vendor::{SelectionPolicy, Vendor, VolumeTier},
};

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");

#[test]
fn shipped_data_files_load() {
    let config = SimConfig::load(DATA_DIR).expect("load data files");
    assert_eq!(config.items.len(), 27);
    assert_eq!(config.vendors.len(), 6);
    assert_eq!(config.upgrades.len(), 6);
    assert_eq!(config.players.len(), 3);
    assert_eq!(config.starting_cash, 2_000.0);

    let categories: std::collections::BTreeSet<Category> =
        config.items.iter().map(|i| i.category).collect();
    assert_eq!(categories.len(), Category::ALL.len(), "every category is stocked");
}

#[test]
fn engine_runs_over_shipped_data() {
    let config = SimConfig::load(DATA_DIR).unwrap();
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("data-run", 77, "test").unwrap();

    let mut engine = SimEngine::build("data-run".to_string(), 77, store, config).unwrap();
    engine.run_days(5).unwrap();

    assert_eq!(engine.state.day, 6);
    assert_eq!(engine.state.players.len(), 3);
    for item in &engine.state.items {
        let price = engine.state.market_price(&item.name).unwrap();
        assert!(price >= item.price_floor() - 1e-9 && price <= item.price_ceiling() + 1e-9);
    }
}

#[test]
fn item_prices_must_clear_minimum_markup() {
    assert!(Item::new("Bread", 2.0, 2.5, Category::FoodGroceries).is_ok());
    let err = Item::new("Bread", 2.0, 2.3, Category::FoodGroceries).unwrap_err();
    assert!(matches!(err, SimError::InvalidEntity { entity: "item", .. }));
    assert!(Item::new("", 2.0, 5.0, Category::FoodGroceries).is_err());
    assert!(Item::new("Free", 0.0, 5.0, Category::FoodGroceries).is_err());
}

#[test]
fn category_labels_parse() {
    assert_eq!(Category::from_label("Food & Groceries").unwrap(), Category::FoodGroceries);
    assert!(matches!(
        Category::from_label("Spaceships"),
        Err(SimError::InvalidEntity { entity: "category", .. })
    ));
}

#[test]
fn vendor_validation_rejects_bad_rules_and_sorts_tiers() {
    let mut inverted = Vendor::new(
        "Odd",
        1.0,
        SelectionPolicy::PriceRange { min_price: 100.0, max_price: 10.0 },
    );
    assert!(inverted.validate().is_err());

    let mut free = Vendor::new("Free", 0.0, SelectionPolicy::All);
    assert!(free.validate().is_err());

    let mut bulk = Vendor::new("Bulk", 0.85, SelectionPolicy::All).with_volume_tiers(vec![
        VolumeTier { min_quantity: 100, multiplier: 0.80 },
        VolumeTier { min_quantity: 500, multiplier: 0.75 },
    ]);
    bulk.validate().unwrap();
    assert_eq!(bulk.tier_multiplier(600), Some(0.75));
    assert_eq!(bulk.tier_multiplier(100), Some(0.80));
    assert_eq!(bulk.tier_multiplier(99), None);
}

#[test]
fn test_config_items_pass_validation() {
    let config = SimConfig::default_test().unwrap();
    assert_eq!(config.items.len(), 12);
    assert!(config.items.iter().all(|i| i.base_price >= i.price_floor()));
}

#[test]
fn reversed_tuning_ranges_are_rejected() {
    assert!(DemandRules::default().validate().is_ok());
    assert!(MarketRules::default().validate().is_ok());

    let hoard = DemandRules { hoard_units: (30, 20), ..DemandRules::default() };
    assert!(matches!(
        hoard.validate(),
        Err(SimError::InvalidEntity { entity: "demand", ref name, .. }) if name == "hoard_units"
    ));
    let drift = MarketRules { items_per_day: (3, 1), ..MarketRules::default() };
    assert!(matches!(
        drift.validate(),
        Err(SimError::InvalidEntity { entity: "market", ref name, .. }) if name == "items_per_day"
    ));
    let flat = DemandRules { party_units: (25, 25), ..DemandRules::default() };
    assert!(flat.validate().is_ok(), "a single-value range is allowed");
}

#[test]
fn load_rejects_reversed_tuning_range() {
    let dir = std::env::temp_dir().join(format!("storefront-tuning-{}", std::process::id()));
    for sub in ["catalog/items.json", "vendors/vendors.json", "upgrades/upgrades.json", "sim/tuning.json"] {
        let target = dir.join(sub);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::copy(format!("{DATA_DIR}/{sub}"), &target).unwrap();
    }
    let tuning_path = dir.join("sim/tuning.json");
    let mut tuning: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&tuning_path).unwrap()).unwrap();
    tuning["demand"]["hoard_units"] = serde_json::json!([30, 20]);
    std::fs::write(&tuning_path, tuning.to_string()).unwrap();

    let err = SimConfig::load(dir.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("hoard_units"), "unexpected error: {err}");
    std::fs::remove_dir_all(&dir).unwrap();
}
