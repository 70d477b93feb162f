//! Scenario runner: executes scripted stress scenarios against the
//! engine and fails fast on the first invariant violation.

use crate::exporter::{SimExport, SimFrame};
use crate::generator::AlertGenerator;
use crate::oracle::InvariantOracle;
use crate::scenarios::ScenarioId;

use alertview_core::{
    AlertPoint, EngineUpdate, IntensityFilter, IntensityLevel, RecomputeController,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether every invariant held
    pub passed: bool,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during the run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics {
    /// Full recompute passes
    pub full_recomputes: u64,

    /// Restyle-only passes
    pub restyles: u64,

    /// Input changes the engine ignored as no-ops
    pub unchanged: u64,

    /// Treat notifications fired
    pub notifications: u64,

    /// Rejected control values (multiplier out of range)
    pub rejected_inputs: u64,

    /// Largest descriptor list seen
    pub peak_descriptors: usize,

    /// Oracle checks performed
    pub oracle_checks: u64,
}

/// Runs stress scenarios.
pub struct ScenarioRunner {
    seed: u64,
    num_alerts: usize,
    export: Option<SimExport>,
}

struct RunState {
    engine: RecomputeController,
    alerts: Vec<AlertPoint>,
    treated: HashSet<alertview_core::AlertId>,
    conservation_expected: bool,
    oracle: InvariantOracle,
    metrics: ScenarioMetrics,
    tick: u64,
    failure: Option<String>,
}

impl RunState {
    fn new(initial_zoom: f64) -> Self {
        Self {
            engine: RecomputeController::new(initial_zoom),
            alerts: Vec::new(),
            treated: HashSet::new(),
            conservation_expected: true,
            oracle: InvariantOracle::new(),
            metrics: ScenarioMetrics::default(),
            tick: 0,
            failure: None,
        }
    }

    /// Records an engine update, runs the oracle, and notes violations.
    fn observe(&mut self, update: &EngineUpdate, export: &mut Option<SimExport>, events: Vec<String>) {
        self.tick += 1;
        let zoom = self.engine.zoom();

        match update {
            EngineUpdate::Recomputed(plan) => {
                self.metrics.full_recomputes += 1;
                self.metrics.peak_descriptors =
                    self.metrics.peak_descriptors.max(plan.descriptors.len());

                let treated = &self.treated;
                let violations = self.oracle.check_plan(
                    plan,
                    &self.alerts,
                    &|a: &AlertPoint| treated.contains(&a.id),
                    zoom,
                    self.conservation_expected,
                );
                self.fail_on(violations);
            }
            EngineUpdate::Restyled(_) => {
                self.metrics.restyles += 1;
                let violations = self.oracle.check_update(update, zoom);
                self.fail_on(violations);
            }
            EngineUpdate::Unchanged => {
                self.metrics.unchanged += 1;
            }
        }
        self.metrics.oracle_checks = self.oracle.checks_run();

        if let Some(export) = export {
            export.push(SimFrame::from_plan(
                self.tick,
                zoom,
                self.engine.current_plan(),
                events,
            ));
        }
    }

    fn fail_on(&mut self, violations: Vec<String>) {
        if self.failure.is_none() {
            if let Some(first) = violations.into_iter().next() {
                warn!(tick = self.tick, "invariant violated: {}", first);
                self.failure = Some(first);
            }
        }
    }
}

impl ScenarioRunner {
    /// Creates a runner with the given seed and feed size.
    pub fn new(seed: u64, num_alerts: usize) -> Self {
        Self {
            seed,
            num_alerts,
            export: None,
        }
    }

    /// Enables frame export for the next run.
    pub fn with_export(mut self, scenario: ScenarioId) -> Self {
        self.export = Some(SimExport::new(scenario.name(), self.seed));
        self
    }

    /// Runs a scenario and returns the result (and the export, if any).
    pub fn run(&mut self, scenario: ScenarioId) -> ScenarioResult {
        info!("starting scenario {} (seed={})", scenario.name(), self.seed);

        let mut state = RunState::new(12.0);
        let mut generator = AlertGenerator::new(self.seed, 5);

        let batch = generator.batch(self.num_alerts);
        state.alerts = batch.clone();
        let update = state.engine.set_alerts(batch);
        let mut export = self.export.take();
        state.observe(&update, &mut export, vec!["initial feed".to_string()]);

        match scenario {
            ScenarioId::ZoomSweep => self.run_zoom_sweep(&mut state, &mut export),
            ScenarioId::TreatStorm => self.run_treat_storm(&mut state, &mut export),
            ScenarioId::FilterFlip => self.run_filter_flip(&mut state, &mut export),
            ScenarioId::SoloMode => self.run_solo_mode(&mut state, &mut export),
            ScenarioId::RadiusRide => self.run_radius_ride(&mut state, &mut export),
            ScenarioId::RushHour => self.run_rush_hour(&mut state, &mut export, &mut generator),
        }

        self.export = export;
        let passed = state.failure.is_none();
        info!(
            "scenario {} finished: {} (recomputes={}, restyles={})",
            scenario.name(),
            if passed { "PASS" } else { "FAIL" },
            state.metrics.full_recomputes,
            state.metrics.restyles,
        );

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            failure_reason: state.failure,
            metrics: state.metrics,
        }
    }

    /// Takes the collected export, if one was enabled.
    pub fn take_export(&mut self) -> Option<SimExport> {
        self.export.take()
    }

    fn run_zoom_sweep(&self, state: &mut RunState, export: &mut Option<SimExport>) {
        // Half-step sweep up and back down: exercises both in-band
        // restyles and band-crossing recomputes, including the 15→16 edge.
        let mut zooms: Vec<f64> = (10..=36).map(|z| z as f64 * 0.5).collect();
        let down: Vec<f64> = zooms.iter().rev().skip(1).copied().collect();
        zooms.extend(down);

        for zoom in zooms {
            let update = state.engine.set_zoom(zoom);
            debug!(zoom, "zoom step");
            state.observe(&update, export, vec![format!("zoom {}", zoom)]);
        }
    }

    fn run_treat_storm(&self, state: &mut RunState, export: &mut Option<SimExport>) {
        let ids: Vec<_> = state.alerts.iter().map(|a| a.id.clone()).collect();
        for (i, id) in ids.iter().enumerate() {
            let outcome = state.engine.treat(id);
            if outcome.changed {
                state.treated.insert(id.clone());
                if outcome.notification.is_some() {
                    state.metrics.notifications += 1;
                }
            }
            state.observe(&outcome.update, export, vec![format!("treat {}", id)]);

            // Re-treat every third alert; the second call must be inert.
            if i % 3 == 0 {
                let again = state.engine.treat(id);
                if again.changed || again.notification.is_some() {
                    state.failure.get_or_insert_with(|| {
                        format!("second treat of {} was not idempotent", id)
                    });
                }
                state.observe(&again.update, export, vec![format!("re-treat {}", id)]);
            }
        }

        if state.engine.active_count() != 0 && state.failure.is_none() {
            state.failure = Some(format!(
                "{} alerts still active after treating everything",
                state.engine.active_count()
            ));
        }
    }

    fn run_filter_flip(&self, state: &mut RunState, export: &mut Option<SimExport>) {
        let filters = [
            IntensityFilter::Only(IntensityLevel::Moderate),
            IntensityFilter::Only(IntensityLevel::High),
            IntensityFilter::Only(IntensityLevel::Critical),
            IntensityFilter::All,
        ];
        for round in 0..3 {
            for filter in filters {
                state.conservation_expected = filter == IntensityFilter::All;
                let update = state.engine.set_intensity_filter(filter);
                state.observe(
                    &update,
                    export,
                    vec![format!("round {}: filter {:?}", round, filter)],
                );
            }
        }
        state.conservation_expected = true;
    }

    fn run_solo_mode(&self, state: &mut RunState, export: &mut Option<SimExport>) {
        let update = state.engine.set_clustering_enabled(false);
        state.observe(&update, export, vec!["clustering off".to_string()]);

        // Zoom around while disabled, then toggle back.
        for zoom in [9.0, 13.0, 13.5, 16.5, 17.0] {
            let update = state.engine.set_zoom(zoom);
            state.observe(&update, export, vec![format!("zoom {}", zoom)]);
        }
        let update = state.engine.set_clustering_enabled(true);
        state.observe(&update, export, vec!["clustering on".to_string()]);
    }

    fn run_radius_ride(&self, state: &mut RunState, export: &mut Option<SimExport>) {
        for multiplier in [0.5, 1.0, 2.5, 5.0, 10.0] {
            match state.engine.set_radius_multiplier(multiplier) {
                Ok(update) => {
                    state.observe(&update, export, vec![format!("multiplier {}", multiplier)])
                }
                Err(e) => {
                    state.failure.get_or_insert_with(|| {
                        format!("valid multiplier {} rejected: {}", multiplier, e)
                    });
                }
            }
        }
        // Out-of-range values must be rejected without touching the plan.
        let before = state.engine.current_plan().clone();
        for bad in [0.0, 0.49, 10.01, -3.0, f64::NAN] {
            match state.engine.set_radius_multiplier(bad) {
                Err(_) => state.metrics.rejected_inputs += 1,
                Ok(_) => {
                    state.failure.get_or_insert_with(|| {
                        format!("out-of-range multiplier {} accepted", bad)
                    });
                }
            }
        }
        if state.engine.current_plan() != &before && state.failure.is_none() {
            state.failure = Some("rejected multiplier changed the plan".to_string());
        }
    }

    fn run_rush_hour(
        &self,
        state: &mut RunState,
        export: &mut Option<SimExport>,
        generator: &mut AlertGenerator,
    ) {
        for wave in 0..10 {
            let batch = generator.batch(self.num_alerts * 4);
            state.alerts = batch.clone();
            state.treated.clear();
            let update = state.engine.set_alerts(batch);
            state.observe(&update, export, vec![format!("wave {}", wave)]);

            // A couple of treats per wave keep the lifecycle hot.
            let ids: Vec<_> = state.alerts.iter().take(3).map(|a| a.id.clone()).collect();
            for id in ids {
                let outcome = state.engine.treat(&id);
                if outcome.changed {
                    state.treated.insert(id.clone());
                    state.metrics.notifications += 1;
                }
                state.observe(&outcome.update, export, vec![format!("treat {}", id)]);
            }
        }
    }
}
