//! Engine invariant oracle.
//!
//! Checks every plan the engine emits against the contracts the renderer
//! relies on. A violation message names the invariant and the offending
//! value; the runner fails the scenario on the first violation.

use alertview_core::{
    markers_visible, AlertPoint, EngineUpdate, PopupPayload, RenderPlan, ShapeKind,
};

/// Stateless checker for engine outputs.
#[derive(Debug, Default)]
pub struct InvariantOracle {
    checks_run: u64,
}

impl InvariantOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total plan checks performed so far.
    pub fn checks_run(&self) -> u64 {
        self.checks_run
    }

    /// Checks a full plan against the alert batch that produced it.
    ///
    /// `expect_conservation` must be false when an intensity filter other
    /// than "all" is active (dropped clusters legitimately hide members).
    pub fn check_plan(
        &mut self,
        plan: &RenderPlan,
        alerts: &[AlertPoint],
        treated: &dyn Fn(&AlertPoint) -> bool,
        zoom: f64,
        expect_conservation: bool,
    ) -> Vec<String> {
        self.checks_run += 1;
        let mut violations = Vec::new();

        let active: Vec<&AlertPoint> = alerts
            .iter()
            .filter(|a| a.panic && !treated(a) && a.has_finite_position())
            .collect();

        if plan.active_count != active.len() {
            violations.push(format!(
                "active count {} != derived active set {}",
                plan.active_count,
                active.len()
            ));
        }

        for descriptor in &plan.descriptors {
            if !(descriptor.radius > 0.0) {
                violations.push(format!(
                    "descriptor {} has non-positive radius {}",
                    descriptor.id, descriptor.radius
                ));
            }
            if descriptor.kind == ShapeKind::Marker && !markers_visible(zoom) {
                violations.push(format!(
                    "marker {} emitted below the marker zoom gate (zoom {})",
                    descriptor.id, zoom
                ));
            }
        }

        if expect_conservation {
            let circle_total: usize = plan
                .descriptors
                .iter()
                .filter_map(|d| match &d.popup {
                    PopupPayload::Cluster { count, .. } => Some(*count),
                    PopupPayload::Individual { .. }
                        if d.kind == ShapeKind::IndividualCircle =>
                    {
                        Some(1)
                    }
                    _ => None,
                })
                .sum();
            if circle_total != active.len() {
                violations.push(format!(
                    "cluster counts sum to {} but active set holds {}",
                    circle_total,
                    active.len()
                ));
            }
        }

        // Every treated alert must have vanished from popups, in both
        // clustering modes.
        for descriptor in &plan.descriptors {
            if let PopupPayload::Individual { alert_id, .. } = &descriptor.popup {
                if let Some(alert) = alerts.iter().find(|a| &a.id == alert_id) {
                    if treated(alert) {
                        violations.push(format!(
                            "treated alert {} still referenced by descriptor {}",
                            alert_id, descriptor.id
                        ));
                    }
                }
            }
        }

        violations
    }

    /// Checks a restyle update: radii must be positive and marker gating
    /// must match the zoom.
    pub fn check_update(&mut self, update: &EngineUpdate, zoom: f64) -> Vec<String> {
        self.checks_run += 1;
        let mut violations = Vec::new();
        if let EngineUpdate::Restyled(patches) = update {
            for patch in patches {
                if !(patch.radius > 0.0) {
                    violations.push(format!(
                        "style patch {} carries non-positive radius {}",
                        patch.id, patch.radius
                    ));
                }
                if patch.icon_size.is_some() && patch.visible != markers_visible(zoom) {
                    violations.push(format!(
                        "marker patch {} visibility {} contradicts zoom {}",
                        patch.id, patch.visible, zoom
                    ));
                }
            }
        }
        violations
    }
}
