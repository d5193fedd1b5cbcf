//! Demand tests: attraction scoring, routing and archetype shopping lists.

use std::collections::BTreeMap;
use storefront_core::{
    attraction::{self, route_customer},
    config::{DemandRules, StoreRules},
    customer::{Archetype, Customer, DemandContext},
    demand_subsystem::{score_all, DemandSubsystem},
    event::SimEvent,
    item::{Category, Item},
    ledger::DayLedger,
    player::Player,
    rng::SimRng,
    specialty::{self, category_threshold, redirect, specialty_score},
    state::GameState,
    subsystem::SimSubsystem,
};

fn items() -> Vec<Item> {
    vec![
        Item::new("Bread", 2.0, 5.0, Category::FoodGroceries).unwrap(),
        Item::new("Milk", 3.0, 6.0, Category::FoodGroceries).unwrap(),
        Item::new("Sunscreen", 4.0, 9.0, Category::PersonalCare).unwrap(),
        Item::new("Umbrella", 6.0, 14.0, Category::SportsOutdoor).unwrap(),
        Item::new("Video Game", 30.0, 60.0, Category::Gaming).unwrap(),
        Item::new("Gaming Console", 200.0, 400.0, Category::Gaming).unwrap(),
        Item::new("Watch", 150.0, 350.0, Category::Luxury).unwrap(),
    ]
}

fn stocked(name: &str, item: &str, price: f64) -> Player {
    let mut player = Player::new(name, 1_000.0, true);
    player.add_stock(item, 10, 2.0);
    player.set_price(item, price).unwrap();
    player
}

fn market(items: &[Item]) -> BTreeMap<String, f64> {
    items.iter().map(|i| (i.name.clone(), i.base_price)).collect()
}

// ── Attraction ─────────────────────────────────────────────────

#[test]
fn store_without_qualifying_items_scores_zero() {
    let items = items();
    let market = market(&items);

    let empty = Player::new("Empty", 1_000.0, true);
    assert_eq!(attraction::score_player(&empty, &items, &market, 1.15).total, 0.0);

    let gouger = stocked("Gouger", "Bread", 9.0);
    let breakdown = attraction::score_player(&gouger, &items, &market, 1.15);
    assert_eq!(breakdown.total, 0.0, "price above the ceiling does not qualify");

    let fair = stocked("Fair", "Bread", 4.5);
    let breakdown = attraction::score_player(&fair, &items, &market, 1.15);
    assert!(breakdown.total > 0.0);
    assert!((breakdown.discount - 30.0).abs() < 1e-9, "10% under market x importance 3");
}

#[test]
fn zero_score_store_is_never_chosen() {
    let mut rng = SimRng::new(0xFACE);
    let mut cursor = 0;
    for _ in 0..1_000 {
        let pick = route_customer(&[0.0, 3.5, 0.0], &mut cursor, &mut rng);
        assert_eq!(pick, Some(1));
    }
    assert_eq!(cursor, 0, "round-robin is only for all-zero scores");
}

#[test]
fn reputation_and_fulfillment_raise_attraction() {
    let items = items();
    let market = market(&items);

    let base = stocked("Base", "Bread", 5.0);
    let mut famous = base.clone();
    famous.reputation = 50.0;
    let mut reliable = base.clone();
    reliable.average_fulfillment_pct = 100.0;

    let base_score = attraction::score_player(&base, &items, &market, 1.15).total;
    let famous_score = attraction::score_player(&famous, &items, &market, 1.15).total;
    let reliable_score = attraction::score_player(&reliable, &items, &market, 1.15).total;
    assert!((famous_score / base_score - 10f64.powf(0.5)).abs() < 1e-9);
    assert!((reliable_score / base_score - 2.0).abs() < 1e-9);
}

#[test]
fn frequent_repricing_loses_stability_bonus() {
    let items = items();
    let market = market(&items);

    let steady = stocked("Steady", "Bread", 5.0);
    let mut jumpy = steady.clone();
    jumpy.set_price("Bread", 4.0).unwrap();
    jumpy.set_price("Bread", 5.0).unwrap();

    let steady_stability = attraction::score_player(&steady, &items, &market, 1.15).stability;
    let jumpy_stability = attraction::score_player(&jumpy, &items, &market, 1.15).stability;
    assert!((steady_stability - jumpy_stability - 6.0).abs() < 1e-9);
}

// ── Routing through the demand phase ───────────────────────────

#[test]
fn customers_route_only_to_scoring_stores() {
    let mut state = GameState::new(items(), Vec::new(), Vec::new());
    state.add_player(stocked("Open", "Bread", 5.0)).unwrap();
    state.add_player(Player::new("Closed", 1_000.0, true)).unwrap();
    state.customers = (0..40)
        .map(|i| Customer::new(format!("c{i}"), Archetype::Low, 20.0))
        .collect();

    let scores = score_all(&state, 1.15);
    assert!(scores[0].total > 0.0);
    assert_eq!(scores[1].total, 0.0);

    let rules = DemandRules::default();
    let mut demand = DemandSubsystem::new(rules, &StoreRules::default());
    let mut ledger = DayLedger::default();
    let events = demand.update(1, &mut state, &mut ledger, &mut SimRng::new(11)).unwrap();

    assert_eq!(ledger.shoppers.len(), 40);
    assert!(ledger.shoppers.iter().all(|s| s.player == 0));
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::CustomersRouted { player, regular: 40, .. } if player == "Open")));
    assert!(ledger.demand.get("Closed").is_none());
}

#[test]
fn all_zero_scores_deal_customers_round_robin() {
    let mut state = GameState::new(items(), Vec::new(), Vec::new());
    state.add_player(Player::new("A", 1_000.0, true)).unwrap();
    state.add_player(Player::new("B", 1_000.0, true)).unwrap();
    state.customers = (0..6)
        .map(|i| Customer::new(format!("c{i}"), Archetype::Medium, 100.0))
        .collect();

    let mut demand = DemandSubsystem::new(DemandRules::default(), &StoreRules::default());
    let mut ledger = DayLedger::default();
    demand.update(1, &mut state, &mut ledger, &mut SimRng::new(2)).unwrap();

    let stores: Vec<usize> = ledger.shoppers.iter().map(|s| s.player).collect();
    assert_eq!(stores, vec![0, 1, 0, 1, 0, 1]);
}

// ── Archetype shopping lists ───────────────────────────────────

fn context<'a>(
    items:  &'a [Item],
    market: &'a BTreeMap<String, f64>,
    demand: &'a BTreeMap<String, f64>,
    rules:  &'a DemandRules,
) -> DemandContext<'a> {
    DemandContext { items, market_prices: market, demand, rules }
}

#[test]
fn regular_tiers_respect_budget_and_item_cap() {
    let items = items();
    let market = market(&items);
    let demand = BTreeMap::new();
    let rules = DemandRules::default();
    let ctx = context(&items, &market, &demand, &rules);
    let mut rng = SimRng::new(21);

    for _ in 0..200 {
        let customer = Customer::new("low", Archetype::Low, 30.0);
        let needs = Archetype::Low.generate_needs(&customer, &ctx, &mut rng);
        assert!(needs.len() <= rules.low_item_cap);
        let spend: f64 = needs.iter().map(|n| market[&n.item]).sum();
        assert!(spend <= 30.0 + 1e-9, "basket {spend} exceeds budget");
        assert!(needs.iter().all(|n| n.quantity == 1));
    }
}

#[test]
fn specialists_follow_their_own_rules() {
    let items = items();
    let market = market(&items);
    let demand = BTreeMap::new();
    let rules = DemandRules::default();
    let ctx = context(&items, &market, &demand, &rules);
    let mut rng = SimRng::new(34);

    let mega = Customer::new("mega", Archetype::MegaSpender, 30_000.0);
    let needs = Archetype::MegaSpender.generate_needs(&mega, &ctx, &mut rng);
    assert_eq!(needs.len(), items.len());
    assert!(needs.iter().all(|n| n.quantity == rules.mega_spender_quantity));

    let seasonal = Customer::new("sun", Archetype::SeasonalShopper, 100.0);
    let needs = Archetype::SeasonalShopper.generate_needs(&seasonal, &ctx, &mut rng);
    let names: Vec<&str> = needs.iter().map(|n| n.item.as_str()).collect();
    assert_eq!(names, vec!["Sunscreen", "Umbrella"]);

    let thief = Customer::new("thief", Archetype::Shoplifter, 0.5);
    assert!(Archetype::Shoplifter.generate_needs(&thief, &ctx, &mut rng).is_empty());

    for _ in 0..50 {
        let gamer = Customer::new("gamer", Archetype::Gamer, 800.0);
        let needs = Archetype::Gamer.generate_needs(&gamer, &ctx, &mut rng);
        assert!(!needs.is_empty() && needs.len() <= 2);
        assert!(needs.iter().all(|n| n.item == "Video Game" || n.item == "Gaming Console"));

        let big = Customer::new("big", Archetype::Uncapped, 5_000.0);
        let needs = Archetype::Uncapped.generate_needs(&big, &ctx, &mut rng);
        assert_eq!(needs.len(), 1);
        assert!(market[&needs[0].item] >= rules.uncapped_min_price);

        let hoarder = Customer::new("hoard", Archetype::Hoarder, 100.0);
        let needs = Archetype::Hoarder.generate_needs(&hoarder, &ctx, &mut rng);
        assert_eq!(needs.len(), 1);
        let need = &needs[0];
        assert!(need.quantity as f64 * market[&need.item] <= 100.0 + 1e-9);
        assert!(need.quantity <= rules.hoard_units.1);
    }
}

#[test]
fn party_prep_buys_only_essentials() {
    let items = items();
    let market = market(&items);
    let demand = BTreeMap::new();
    let rules = DemandRules::default();
    let ctx = context(&items, &market, &demand, &rules);
    let mut rng = SimRng::new(55);

    let party = Customer::new("party", Archetype::PartyPrep, 400.0);
    let needs = Archetype::PartyPrep.generate_needs(&party, &ctx, &mut rng);
    let units: u32 = needs.iter().map(|n| n.quantity).sum();
    assert!((rules.party_units.0..=rules.party_units.1).contains(&units), "got {units} units");
    assert!(needs.iter().all(|n| ["Bread", "Milk", "Sunscreen"].contains(&n.item.as_str())));
}

#[test]
fn shoplifters_target_stores_with_stock() {
    let players = vec![Player::new("Bare", 0.0, true), stocked("Full", "Bread", 5.0)];
    let mut rng = SimRng::new(8);
    let mut cursor = 0;
    for _ in 0..100 {
        let pick = Archetype::Shoplifter.choose_supplier(&players, &[0.0, 0.0], &mut cursor, &mut rng);
        assert_eq!(pick, Some(1));
    }

    let bare = vec![Player::new("Bare", 0.0, true)];
    assert_eq!(Archetype::Shoplifter.choose_supplier(&bare, &[0.0], &mut cursor, &mut rng), None);
}

#[test]
fn specializations_pick_two_distinct_categories() {
    let items = items();
    let mut rng = SimRng::new(13);
    for _ in 0..20 {
        let mut customer = Customer::new("picky", Archetype::Medium, 100.0);
        customer.roll_specializations(&items, &mut rng);
        assert_eq!(customer.specializations.len(), 2);
        assert_ne!(customer.specializations[0], customer.specializations[1]);
    }

    let single = vec![Item::new("Bread", 2.0, 5.0, Category::FoodGroceries).unwrap()];
    let mut customer = Customer::new("picky", Archetype::Low, 10.0);
    customer.roll_specializations(&single, &mut rng);
    assert_eq!(customer.specializations, vec![Category::FoodGroceries, Category::FoodGroceries]);
}

#[test]
fn weighted_sample_never_repeats_an_entry() {
    let pool = vec![("heavy", 1_000.0), ("a", 1.0), ("b", 1.0), ("c", 1.0)];
    let mut rng = SimRng::new(0x5A17);
    let mut with_heavy = 0;
    for _ in 0..500 {
        let mut drawn = rng.weighted_sample(&pool, 3);
        assert_eq!(drawn.len(), 3);
        if drawn.contains(&"heavy") {
            with_heavy += 1;
        }
        drawn.sort_unstable();
        drawn.dedup();
        assert_eq!(drawn.len(), 3, "an entry was drawn twice");
    }
    assert!(with_heavy >= 490, "heavy entry drawn in only {with_heavy} of 500 samples");

    let all = rng.weighted_sample(&pool, 10);
    assert_eq!(all.len(), pool.len(), "k beyond the pool returns every entry once");
}

#[test]
fn item_demand_skews_which_items_are_wanted() {
    let items = items();
    let market = market(&items);
    let demand: BTreeMap<String, f64> = [("Bread".to_string(), 4.0)].into_iter().collect();
    let rules = DemandRules::default();
    let ctx = context(&items, &market, &demand, &rules);

    let bread = &items[0];
    let milk = &items[1];
    assert_eq!(ctx.weight(bread), 4.0);
    assert_eq!(ctx.weight(milk), 1.0, "items missing from the demand map weigh 1.0");

    let mut rng = SimRng::new(0xD3_4D);
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for _ in 0..2_000 {
        let picked = ctx.pick_distinct(100.0, 1, |i| i.category == Category::FoodGroceries, &mut rng);
        assert_eq!(picked.len(), 1);
        *counts.entry(picked[0].clone()).or_insert(0) += 1;
    }
    let bread_draws = counts.get("Bread").copied().unwrap_or(0);
    let milk_draws = counts.get("Milk").copied().unwrap_or(0);
    assert_eq!(bread_draws + milk_draws, 2_000);
    assert!(bread_draws > 3 * milk_draws, "bread {bread_draws} vs milk {milk_draws}");
}

#[test]
fn windfall_shopper_buys_distinct_luxury_within_budget() {
    let mut items = items();
    items.extend((0..14).map(|i| {
        Item::new(format!("Jewel {i}"), 40.0 + i as f64, 100.0 + 10.0 * i as f64, Category::Luxury).unwrap()
    }));
    let market = market(&items);
    let demand = BTreeMap::new();
    let rules = DemandRules::default();
    let ctx = context(&items, &market, &demand, &rules);
    let mut rng = SimRng::new(0x77);

    for budget in [150.0, 1_000.0, 2_500.0, 1_000_000.0] {
        let customer = Customer::new("lucky", Archetype::WindfallShopper, budget);
        for _ in 0..20 {
            let needs = Archetype::WindfallShopper.generate_needs(&customer, &ctx, &mut rng);
            assert!(needs.len() <= rules.windfall_max_items);
            let mut names: Vec<&str> = needs.iter().map(|n| n.item.as_str()).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), needs.len(), "luxury items are distinct");
            assert!(needs
                .iter()
                .all(|n| n.quantity == 1 && items.iter().any(|i| i.name == n.item && i.category == Category::Luxury)));
            let spend: f64 = needs.iter().map(|n| market[&n.item]).sum();
            assert!(spend <= budget + 1e-9, "spent {spend} of {budget}");
            if budget >= 1_000_000.0 {
                assert_eq!(needs.len(), rules.windfall_max_items);
            }
        }
    }
}

// ── Category specialties ───────────────────────────────────────

fn shelf(prefix: &str, category: Category, n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| Item::new(format!("{prefix} {i}"), 1.0, 3.0, category).unwrap())
        .collect()
}

fn specialist(name: &str, shelves: &[&[Item]]) -> Player {
    let mut player = Player::new(name, 1_000.0, true);
    for item in shelves.iter().flat_map(|s| s.iter()) {
        player.add_stock(&item.name, 5, 1.0);
        player.set_price(&item.name, item.base_price).unwrap();
    }
    player
}

#[test]
fn every_reached_step_adds_to_the_specialty_score() {
    let food = shelf("Food", Category::FoodGroceries, 60);
    let games = shelf("Game", Category::Gaming, 5);
    let catalog: Vec<Item> = food.iter().chain(games.iter()).cloned().collect();

    let empty = specialty_score(&Player::new("Empty", 0.0, true), &catalog);
    assert_eq!(empty.multiplier, 0.0);
    assert!(empty.per_category.is_empty());

    let near = specialist("Near", &[&food[..9]]);
    assert_eq!(specialty_score(&near, &catalog).multiplier, 0.0);
    assert_eq!(category_threshold(&near, Category::FoodGroceries, &catalog), None);

    let grocer = specialist("Grocer", &[&food[..10]]);
    assert!((specialty_score(&grocer, &catalog).multiplier - 1.2).abs() < 1e-9);
    assert_eq!(category_threshold(&grocer, Category::FoodGroceries, &catalog), Some(10));

    let arcade = specialist("Arcade", &[&games[..]]);
    assert!((specialty_score(&arcade, &catalog).multiplier - 1.5).abs() < 1e-9);

    let mixed = specialist("Mixed", &[&food[..10], &games[..]]);
    let score = specialty_score(&mixed, &catalog);
    assert!((score.multiplier - 2.7).abs() < 1e-9);
    assert_eq!(score.counts[&Category::FoodGroceries], 10);
    assert_eq!(score.counts[&Category::Gaming], 5);

    let big = specialist("Big", &[&food[..30]]);
    assert!((specialty_score(&big, &catalog).multiplier - 2.7).abs() < 1e-9, "1.2 + 1.5");
    assert_eq!(category_threshold(&big, Category::FoodGroceries, &catalog), Some(30));

    let huge = specialist("Huge", &[&food[..]]);
    assert!((specialty_score(&huge, &catalog).multiplier - 5.2).abs() < 1e-9);

    let mut sold_out = grocer.clone();
    sold_out.inventory.insert(food[0].name.clone(), 0);
    assert_eq!(specialty_score(&sold_out, &catalog).multiplier, 0.0, "empty shelves do not count");
}

#[test]
fn category_ladders_differ_by_breadth() {
    assert_eq!(specialty::thresholds(Category::FoodGroceries)[0], (10, 1.2));
    assert_eq!(specialty::thresholds(Category::Gaming)[0], (5, 1.5));
    assert_eq!(specialty::thresholds(Category::Electronics)[0], (5, 1.5));
    assert_eq!(specialty::thresholds(Category::Automotive)[0], (8, 1.3));
    for category in Category::ALL {
        let steps = specialty::thresholds(category);
        assert!(steps.windows(2).all(|w| w[0].0 < w[1].0), "{category:?} steps ascend");
    }
}

fn picky(archetype: Archetype) -> Customer {
    let mut customer = Customer::new("picky", archetype, 100.0);
    customer.specializations = vec![Category::FoodGroceries, Category::Electronics];
    customer
}

#[test]
fn specialized_customer_leaves_a_store_without_their_categories() {
    let food = shelf("Food", Category::FoodGroceries, 30);
    let tech = shelf("Tech", Category::Electronics, 30);
    let games = shelf("Game", Category::Gaming, 10);
    let catalog: Vec<Item> = food.iter().chain(&tech).chain(&games).cloned().collect();
    let players = vec![
        specialist("Grocer", &[&food[..15]]),
        specialist("Superstore", &[&food[..], &tech[..]]),
        specialist("Arcade", &[&games[..]]),
    ];
    let scores = [1.0, 1.0, 1.0];
    let customer = picky(Archetype::Medium);

    assert_eq!(redirect(&customer, 0, &players, &scores, &catalog), 0, "grocer holds one category");
    assert_eq!(redirect(&customer, 2, &players, &scores, &catalog), 1);

    let plain = Customer::new("plain", Archetype::Medium, 100.0);
    assert_eq!(redirect(&plain, 2, &players, &scores, &catalog), 2);
    let hoarder = picky(Archetype::Hoarder);
    assert_eq!(redirect(&hoarder, 2, &players, &scores, &catalog), 2, "specialists keep their pick");

    let closed = [1.0, 0.0, 1.0];
    assert_eq!(redirect(&customer, 2, &players, &closed, &catalog), 0, "zero-score stores are skipped");
    let only_arcade = [0.0, 0.0, 1.0];
    assert_eq!(redirect(&customer, 2, &players, &only_arcade, &catalog), 2, "falls back to the pick");
}

#[test]
fn store_holding_both_categories_beats_bigger_single_specialists() {
    let food = shelf("Food", Category::FoodGroceries, 25);
    let tech = shelf("Tech", Category::Electronics, 20);
    let games = shelf("Game", Category::Gaming, 10);
    let catalog: Vec<Item> = food.iter().chain(&tech).chain(&games).cloned().collect();
    let players = vec![
        specialist("Grocer", &[&food[..]]),
        specialist("Tech Hut", &[&tech[..]]),
        specialist("Balanced", &[&food[..12], &tech[..15]]),
        specialist("Arcade", &[&games[..]]),
    ];
    let scores = [2.0, 2.0, 1.0, 5.0];
    assert!(specialty::has_both_specializations(
        &players[2],
        &[Category::FoodGroceries, Category::Electronics],
        &catalog
    ));
    assert_eq!(redirect(&picky(Archetype::Low), 3, &players, &scores, &catalog), 2);
}

#[test]
fn demand_phase_steers_specialized_regulars() {
    let food = shelf("Food", Category::FoodGroceries, 10);
    let tech = shelf("Tech", Category::Electronics, 5);
    let games = shelf("Game", Category::Gaming, 5);
    let catalog: Vec<Item> = food.iter().chain(&tech).chain(&games).cloned().collect();

    let mut state = GameState::new(catalog, Vec::new(), Vec::new());
    state.add_player(specialist("Arcade", &[&games[..]])).unwrap();
    state.add_player(specialist("Superstore", &[&food[..], &tech[..]])).unwrap();
    state.customers = (0..30)
        .map(|i| {
            let mut customer = picky(Archetype::Medium);
            customer.name = format!("c{i}");
            customer
        })
        .collect();

    let mut demand = DemandSubsystem::new(DemandRules::default(), &StoreRules::default());
    let mut ledger = DayLedger::default();
    demand.update(1, &mut state, &mut ledger, &mut SimRng::new(0x5E)).unwrap();

    assert_eq!(ledger.shoppers.len(), 30);
    assert!(ledger.shoppers.iter().all(|s| s.player == 1));
}
