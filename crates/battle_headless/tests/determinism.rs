//! Determinism checks for the headless runner, cross-checked against the
//! shared test-utils harness.

use battle_headless::{run_battle, RunConfig};
use battle_test_utils::determinism::verify_battle_determinism;

#[test]
fn runner_reports_are_reproducible() {
    let config = RunConfig::new(21);
    let reports: Vec<_> = (0..3)
        .map(|_| run_battle(&config).expect("battle runs"))
        .collect();
    assert!(reports
        .windows(2)
        .all(|w| w[0].state_hash == w[1].state_hash && w[0].rounds == w[1].rounds));
}

#[test]
fn shared_harness_agrees_on_engine_determinism() {
    verify_battle_determinism(21, 3, 40).assert_deterministic();
}
