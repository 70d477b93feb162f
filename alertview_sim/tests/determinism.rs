//! Seed-reproducibility and whole-harness invariant tests.

use alertview_sim::{ScenarioId, ScenarioRunner};
use proptest::prelude::*;

#[test]
fn same_seed_reproduces_identical_metrics() {
    for scenario in ScenarioId::all() {
        let a = ScenarioRunner::new(1234, 60).run(scenario);
        let b = ScenarioRunner::new(1234, 60).run(scenario);
        assert_eq!(a.metrics, b.metrics, "scenario {}", scenario.name());
        assert_eq!(a.passed, b.passed);
    }
}

#[test]
fn all_scenarios_pass_with_default_seed() {
    for scenario in ScenarioId::all() {
        let result = ScenarioRunner::new(42, 120).run(scenario);
        assert!(
            result.passed,
            "scenario {} failed: {:?}",
            scenario.name(),
            result.failure_reason
        );
    }
}

proptest! {
    // Scenario runs are slow relative to unit tests; a small case count
    // still covers a wide seed space across CI runs.
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any seed must satisfy the engine invariants end to end.
    #[test]
    fn zoom_sweep_holds_for_any_seed(seed in any::<u64>(), alerts in 1usize..150) {
        let result = ScenarioRunner::new(seed, alerts).run(ScenarioId::ZoomSweep);
        prop_assert!(result.passed, "seed {} failed: {:?}", seed, result.failure_reason);
    }

    /// Treating everything always empties the active set, for any seed.
    #[test]
    fn treat_storm_holds_for_any_seed(seed in any::<u64>(), alerts in 1usize..80) {
        let result = ScenarioRunner::new(seed, alerts).run(ScenarioId::TreatStorm);
        prop_assert!(result.passed, "seed {} failed: {:?}", seed, result.failure_reason);
    }
}
