//! Reputation tests: daily deltas, penalties, decay and persistence.

use storefront_core::{
    config::ReputationRules,
    engine::SimEngine,
    ledger::Visit,
    player::Player,
    reputation_subsystem::{apply_daily_reputation, customer_delta, REPUTATION_MAX, REPUTATION_MIN},
};

fn build(run_id: &str, seed: u64) -> SimEngine {
    SimEngine::build_test(run_id.to_string(), seed).expect("build test engine")
}

fn visit(pct: f64) -> Visit {
    Visit { customer: "c".into(), fulfillment_pct: pct, stores_visited: 1 }
}

fn stocked_player(reputation: f64) -> Player {
    let mut player = Player::new("Shop", 100.0, true);
    player.add_stock("Bread", 5, 2.0);
    player.reputation = reputation;
    player
}

#[test]
fn quiet_day_only_decays() {
    let rules = ReputationRules::default();
    let mut player = stocked_player(40.0);

    let change = apply_daily_reputation(&mut player, &[], 0.0, &rules);
    assert_eq!(change.customer_delta, 0.0);
    assert_eq!(player.reputation, 38.0, "40 - ceil(40 x 0.05)");
    assert_eq!(player.average_fulfillment_pct, 70.0, "no visits keeps the rolling average");
}

#[test]
fn complete_visits_count_double() {
    let rules = ReputationRules::default();
    let visits = [visit(100.0), visit(85.0), visit(50.0), visit(10.0)];
    assert_eq!(customer_delta(&visits, &rules), 2.0 + 1.0 + 0.0 - 1.0);
}

#[test]
fn customer_delta_is_clamped() {
    let rules = ReputationRules::default();
    let great: Vec<Visit> = (0..40).map(|_| visit(100.0)).collect();
    assert_eq!(customer_delta(&great, &rules), rules.max_daily_delta);

    let awful: Vec<Visit> = (0..40).map(|_| visit(0.0)).collect();
    assert_eq!(customer_delta(&awful, &rules), rules.min_daily_delta);
}

#[test]
fn empty_shelves_and_low_average_are_penalised() {
    let rules = ReputationRules::default();
    let mut player = Player::new("Bare", 100.0, true);
    player.average_fulfillment_pct = 20.0;

    let change = apply_daily_reputation(&mut player, &[visit(0.0)], 3.0, &rules);
    assert_eq!(change.penalties, 3.0 + rules.empty_shelves_penalty + rules.low_average_penalty);
    assert_eq!(player.reputation, -1.0 - 13.0, "negative reputation does not decay");
    assert_eq!(player.average_fulfillment_pct, 0.0);
}

#[test]
fn reputation_is_clamped_to_range() {
    let rules = ReputationRules { decay_rate: 0.0, ..ReputationRules::default() };
    let mut high = stocked_player(99.0);
    let visits: Vec<Visit> = (0..10).map(|_| visit(100.0)).collect();
    apply_daily_reputation(&mut high, &visits, 0.0, &rules);
    assert_eq!(high.reputation, REPUTATION_MAX);

    let mut low = stocked_player(-98.0);
    apply_daily_reputation(&mut low, &[], 50.0, &rules);
    assert_eq!(low.reputation, REPUTATION_MIN);
}

#[test]
fn rolling_average_is_todays_mean() {
    let rules = ReputationRules::default();
    let mut player = stocked_player(0.0);
    apply_daily_reputation(&mut player, &[visit(100.0), visit(50.0), visit(0.0)], 0.0, &rules);
    assert_eq!(player.average_fulfillment_pct, 50.0);
}

/// Every player gets one reputation row per day, always within bounds.
#[test]
fn reputation_history_is_persisted_daily() {
    let run_id = "rep-history-test";
    let mut engine = build(run_id, 0x2222_BBBB);
    engine.run_days(20).unwrap();

    let rows = engine.store().reputation_snapshot_count(run_id).unwrap();
    assert_eq!(rows, 20 * engine.state.players.len() as i64);

    for player in &engine.state.players {
        let score = engine
            .store()
            .latest_reputation_score(run_id, &player.name)
            .unwrap()
            .expect("a stored score");
        assert_eq!(score, player.reputation);
        assert!((REPUTATION_MIN..=REPUTATION_MAX).contains(&score));
    }
}

/// Determinism: two engines with the same seed produce identical scores.
#[test]
fn reputation_determinism() {
    const SEED: u64 = 0xBEEF_CAFE;
    let mut engine_a = build("rep-det-a", SEED);
    let mut engine_b = build("rep-det-b", SEED);

    engine_a.run_days(45).unwrap();
    engine_b.run_days(45).unwrap();

    for (a, b) in engine_a.state.players.iter().zip(&engine_b.state.players) {
        assert_eq!(
            a.reputation.to_bits(),
            b.reputation.to_bits(),
            "{} diverged between identical seeds: {} vs {}",
            a.name, a.reputation, b.reputation
        );
    }
}
