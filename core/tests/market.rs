//! Market tests: fluctuation bounds, scripted events, demand drift.

use storefront_core::{
    config::MarketRules,
    engine::SimEngine,
    event::SimEvent,
    item::{Category, Item},
    ledger::DayLedger,
    market_subsystem::MarketSubsystem,
    rng::SimRng,
    state::{GameState, DEMAND_MAX, DEMAND_MIN},
    subsystem::SimSubsystem,
};

fn build(run_id: &str, seed: u64) -> SimEngine {
    SimEngine::build_test(run_id.to_string(), seed).expect("build test engine")
}

fn two_item_world() -> GameState {
    let items = vec![
        Item::new("Kettle", 1.0, 10.0, Category::HouseholdEssentials).unwrap(),
        Item::new("Lamp", 1.0, 10.0, Category::HomeDecor).unwrap(),
    ];
    GameState::new(items, Vec::new(), Vec::new())
}

/// Rules with no random movement, so only scripted events touch prices.
fn quiet_rules() -> MarketRules {
    MarketRules {
        items_per_day:      (0, 0),
        demand_drift_items: (0, 0),
        ..MarketRules::default()
    }
}

#[test]
fn market_prices_stay_within_item_bounds() {
    let mut engine = build("market-bounds", 0xA11C_E000);

    for _ in 0..120 {
        engine.run_day(false).unwrap();
        for item in &engine.state.items {
            let price = engine.state.market_prices[&item.name];
            assert!(
                price >= item.base_cost * 1.2 - 1e-9 && price <= item.base_price * 2.0 + 1e-9,
                "day {}: {} market price {price} outside [{}, {}]",
                engine.state.day, item.name, item.base_cost * 1.2, item.base_price * 2.0
            );
        }
    }
}

#[test]
fn demand_multipliers_stay_within_band() {
    let mut engine = build("market-demand", 0xD3A4_0001);
    engine.run_days(90).unwrap();

    for (item, weight) in &engine.state.item_demand {
        assert!(
            (DEMAND_MIN..=DEMAND_MAX).contains(weight),
            "{item} demand multiplier {weight} outside [{DEMAND_MIN}, {DEMAND_MAX}]"
        );
    }
}

#[test]
fn scripted_event_crashes_and_spikes_then_reverts() {
    let mut state = two_item_world();
    let mut market = MarketSubsystem::new(quiet_rules());
    let mut rng = SimRng::new(99);

    let events = market
        .update(30, &mut state, &mut DayLedger::default(), &mut rng)
        .unwrap();
    let fired = events.iter().find_map(|e| match e {
        SimEvent::MarketEventFired { crashed, spiked, .. } => Some((crashed.clone(), spiked.clone())),
        _ => None,
    });
    let (crashed, spiked) = fired.expect("an event fires on day 30");
    assert_ne!(crashed, spiked);
    assert!((state.market_prices[&crashed] - 5.0).abs() < 1e-9, "crash halves the price");
    assert!((state.market_prices[&spiked] - 15.0).abs() < 1e-9, "spike adds 50%");

    let events = market
        .update(31, &mut state, &mut DayLedger::default(), &mut rng)
        .unwrap();
    assert!(
        events.iter().any(|e| matches!(e, SimEvent::MarketEventReverted { items, .. } if items.len() == 2)),
        "the event must be reverted the next day"
    );
    assert!(state.market_event.is_none());
    assert_eq!(state.market_prices[&crashed], 10.0);
    assert_eq!(state.market_prices[&spiked], 10.0);
}

#[test]
fn no_event_between_intervals() {
    let mut state = two_item_world();
    let mut market = MarketSubsystem::new(quiet_rules());
    let mut rng = SimRng::new(5);

    for day in 1..30 {
        let events = market
            .update(day, &mut state, &mut DayLedger::default(), &mut rng)
            .unwrap();
        assert!(
            events.iter().all(|e| !matches!(e, SimEvent::MarketEventFired { .. })),
            "no scripted event expected on day {day}"
        );
    }
    assert_eq!(state.market_prices["Kettle"], 10.0);
}

#[test]
fn event_crash_respects_price_floor() {
    let items = vec![
        Item::new("Cheap", 4.0, 5.0, Category::FoodGroceries).unwrap(),
        Item::new("Dear", 4.0, 5.0, Category::FoodGroceries).unwrap(),
    ];
    let mut state = GameState::new(items, Vec::new(), Vec::new());
    let mut market = MarketSubsystem::new(quiet_rules());
    let mut rng = SimRng::new(1);

    market.update(30, &mut state, &mut DayLedger::default(), &mut rng).unwrap();
    let event = state.market_event.clone().expect("event fired");
    let crashed_price = state.market_prices[&event.crashed];
    assert!(
        (crashed_price - 4.8).abs() < 1e-9,
        "crash clamps at 1.2 x cost, got {crashed_price}"
    );
    let spiked_price = state.market_prices[&event.spiked];
    assert!((spiked_price - 7.5).abs() < 1e-9);
}
