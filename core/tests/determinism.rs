//! THE MOST IMPORTANT TEST IN THE PROJECT.
//!
//! Two engines, same seed, same operations.
//! They must produce byte-identical event logs.
//! Any divergence is a blocker: do not merge until fixed.

use storefront_core::engine::SimEngine;

fn build_engine(seed: u64) -> SimEngine {
    SimEngine::build_test(format!("det-test-{seed}"), seed).expect("build test engine")
}

fn collect_event_log(engine: &SimEngine) -> Vec<String> {
    engine
        .event_log()
        .expect("read events")
        .into_iter()
        .map(|e| e.payload)
        .collect()
}

#[test]
fn same_seed_produces_identical_event_logs() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    const DAYS: u64 = 95; // three market events and three snapshots
    let _ = env_logger::builder().is_test(true).try_init();

    let mut engine_a = build_engine(SEED);
    let mut engine_b = build_engine(SEED);

    engine_a.run_days(DAYS).expect("engine_a run");
    engine_b.run_days(DAYS).expect("engine_b run");

    let log_a = collect_event_log(&engine_a);
    let log_b = collect_event_log(&engine_b);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Event log lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );

    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(
            a, b,
            "Event log diverged at entry {i}:\n  A: {a}\n  B: {b}"
        );
    }
    assert_eq!(engine_a.state, engine_b.state, "Final world state diverged");
}

#[test]
fn different_seeds_produce_different_logs() {
    let mut engine_a = build_engine(42);
    let mut engine_b = build_engine(99);

    engine_a.run_days(30).expect("run a");
    engine_b.run_days(30).expect("run b");

    // This test verifies that seed differences are actually observable.
    let log_a = collect_event_log(&engine_a);
    let log_b = collect_event_log(&engine_b);

    let any_different = log_a.iter().zip(log_b.iter()).any(|(a, b)| a != b);
    assert!(any_different, "Different seeds produced identical logs: seed is not being used");
}

#[test]
fn daily_sales_returned_for_every_player() {
    let mut engine = build_engine(7);
    let sales = engine.run_day(false).expect("run day");

    assert_eq!(sales.len(), engine.state.players.len());
    for player in &engine.state.players {
        let revenue = sales[&player.name];
        assert!(revenue >= 0.0, "{} has negative revenue {revenue}", player.name);
    }
    assert_eq!(engine.state.day, 2, "run_day must advance the day counter");

    let stored = engine.store().sales_for_day(&engine.run_id, 1).expect("stored sales");
    assert_eq!(stored, sales);
    assert_eq!(engine.store().run_seed(&engine.run_id).unwrap(), Some(7));
}

#[test]
fn snapshot_restore_resumes_the_same_run() {
    const SEED: u64 = 0x5EED_0030;

    let mut straight = build_engine(SEED);
    straight.run_days(35).expect("straight run");

    let mut restored = build_engine(SEED);
    restored.run_days(35).expect("first pass");
    let snapshot_day = restored.restore_latest().expect("restore");
    assert_eq!(snapshot_day, 30, "Snapshots are taken every 30 days");
    assert_eq!(restored.state.day, 31);

    restored.run_days(5).expect("replay");
    assert_eq!(
        restored.state, straight.state,
        "Replaying from the day-30 snapshot must reach the same day-35 world"
    );
}
