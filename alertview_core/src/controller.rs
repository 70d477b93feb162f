//! Two-speed recompute orchestration.
//!
//! The controller owns the six engine inputs (alert data, zoom, treated
//! set, intensity filter, clustering toggle, radius multiplier) and the
//! current render plan. Every input change is an explicit synchronous
//! method call; there is no reactive machinery and no background work.
//!
//! Update policy: a zoom move that crosses a grid-size band, or a change
//! to any non-zoom input, triggers a full recompute (re-cluster,
//! re-classify, re-size). A zoom move inside the current band only
//! restyles: shapes keep their radius while opacity, fill opacity,
//! marker visibility and icon size are recomputed. Full reclustering is
//! expensive and makes anchors jump; restyling is cheap and continuous.

use crate::error::EngineError;
use crate::grid::grid_size_for_zoom;
use crate::intensity::IntensityFilter;
use crate::lifecycle::EventLifecycleTracker;
use crate::radius::RADIUS_MULTIPLIER_RANGE;
use crate::render::{
    circle_opacity_for_zoom, marker_icon_size, markers_visible, DescriptorId, RenderDescriptor,
    RenderInstructionBuilder, ShapeKind, TreatHandler, TreatNotification, ViewParams,
};
use crate::types::{AlertId, AlertPoint};
use crate::{cluster_alerts, individual_clusters};
use serde::Serialize;
use std::collections::HashMap;

/// Initial map zoom of the monitoring view.
pub const DEFAULT_ZOOM: f64 = 12.0;

/// The full, ordered render plan for one recompute pass.
///
/// Full-replace semantics: consumers swap their entire shape set for this
/// list, never diff against a previous plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderPlan {
    /// Shapes in draw order (circles first, then markers)
    pub descriptors: Vec<RenderDescriptor>,

    /// Number of currently active alerts, for display
    pub active_count: usize,
}

/// Style-only adjustment to an existing descriptor.
///
/// Emitted by in-band zoom moves; the radius is carried through unchanged
/// from the descriptor's build-time value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StylePatch {
    /// Descriptor this patch applies to
    pub id: DescriptorId,

    /// Build-time radius, unchanged by restyling
    pub radius: f64,

    pub opacity: f64,
    pub fill_opacity: f64,
    pub visible: bool,

    /// New icon size in pixels (markers only)
    pub icon_size: Option<f64>,
}

/// Outcome of one input-change call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineUpdate {
    /// Full recompute ran; replace all shapes with this plan
    Recomputed(RenderPlan),

    /// In-band zoom move; apply these patches to existing shapes
    Restyled(Vec<StylePatch>),

    /// The input did not actually change; keep the current shapes
    Unchanged,
}

/// Result of a treat call.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatOutcome {
    /// True only when this call changed treated-set membership
    pub changed: bool,

    /// Confirmation to surface, exactly once per membership change
    pub notification: Option<TreatNotification>,

    /// Recomputed plan when membership changed, Unchanged otherwise
    pub update: EngineUpdate,
}

impl TreatOutcome {
    fn noop() -> Self {
        Self {
            changed: false,
            notification: None,
            update: EngineUpdate::Unchanged,
        }
    }
}

/// Owns the engine inputs and decides when to recluster versus restyle.
#[derive(Debug)]
pub struct RecomputeController {
    alerts: Vec<AlertPoint>,
    zoom: f64,
    tracker: EventLifecycleTracker,
    intensity_filter: IntensityFilter,
    clustering_enabled: bool,
    radius_multiplier: f64,

    builder: RenderInstructionBuilder,

    /// Grid size at the last full recompute; band-change detection
    last_full_grid_size: f64,

    /// Current plan, mirrored so restyle passes stay consistent
    plan: RenderPlan,

    /// Build-time radius per descriptor, for restyle-only passes
    base_radius: HashMap<DescriptorId, f64>,
}

impl RecomputeController {
    /// Creates a controller at the given zoom with clustering on, no
    /// filter, multiplier 1, and an empty alert set.
    pub fn new(zoom: f64) -> Self {
        Self {
            alerts: Vec::new(),
            zoom,
            tracker: EventLifecycleTracker::new(),
            intensity_filter: IntensityFilter::All,
            clustering_enabled: true,
            radius_multiplier: 1.0,
            builder: RenderInstructionBuilder::new(),
            last_full_grid_size: grid_size_for_zoom(zoom),
            plan: RenderPlan::default(),
            base_radius: HashMap::new(),
        }
    }

    /// Replaces the alert data (full-batch delivery from ingestion).
    ///
    /// An unchanged batch (how an upstream fetch failure must surface)
    /// does not recompute.
    pub fn set_alerts(&mut self, alerts: Vec<AlertPoint>) -> EngineUpdate {
        if alerts == self.alerts {
            return EngineUpdate::Unchanged;
        }
        self.alerts = alerts;
        self.full_recompute()
    }

    /// Applies a zoom change from the map surface.
    ///
    /// Crossing a grid-size band reclusters; staying inside the band only
    /// restyles existing shapes.
    pub fn set_zoom(&mut self, zoom: f64) -> EngineUpdate {
        if zoom == self.zoom {
            return EngineUpdate::Unchanged;
        }
        // Band membership is judged against the last full recompute, not
        // the previous zoom event.
        let in_band = grid_size_for_zoom(zoom) == self.last_full_grid_size;
        self.zoom = zoom;
        if in_band {
            self.restyle()
        } else {
            self.full_recompute()
        }
    }

    /// Sets the intensity filter.
    pub fn set_intensity_filter(&mut self, filter: IntensityFilter) -> EngineUpdate {
        if filter == self.intensity_filter {
            return EngineUpdate::Unchanged;
        }
        self.intensity_filter = filter;
        self.full_recompute()
    }

    /// Toggles clustering.
    pub fn set_clustering_enabled(&mut self, enabled: bool) -> EngineUpdate {
        if enabled == self.clustering_enabled {
            return EngineUpdate::Unchanged;
        }
        self.clustering_enabled = enabled;
        self.full_recompute()
    }

    /// Sets the radius multiplier.
    ///
    /// This is the control boundary: values outside the UI-exposed range
    /// are rejected here so the pure radius functions never validate.
    pub fn set_radius_multiplier(&mut self, multiplier: f64) -> Result<EngineUpdate, EngineError> {
        if !multiplier.is_finite() {
            return Err(EngineError::RadiusMultiplierNotFinite);
        }
        if !RADIUS_MULTIPLIER_RANGE.contains(&multiplier) {
            return Err(EngineError::RadiusMultiplierOutOfRange {
                value: multiplier,
                min: *RADIUS_MULTIPLIER_RANGE.start(),
                max: *RADIUS_MULTIPLIER_RANGE.end(),
            });
        }
        if multiplier == self.radius_multiplier {
            return Ok(EngineUpdate::Unchanged);
        }
        self.radius_multiplier = multiplier;
        Ok(self.full_recompute())
    }

    /// Treats one alert by id.
    ///
    /// Idempotent; ids outside the known alert universe are a silent
    /// no-op. The notification is produced exactly once per alert.
    pub fn treat(&mut self, id: &AlertId) -> TreatOutcome {
        let Some(alert) = self.alerts.iter().find(|a| &a.id == id) else {
            return TreatOutcome::noop();
        };
        let prefix = alert.vehicle.prefix.clone();
        if !self.tracker.treat(id) {
            return TreatOutcome::noop();
        }
        TreatOutcome {
            changed: true,
            notification: Some(TreatNotification {
                alert_id: id.clone(),
                vehicle_prefix: prefix,
            }),
            update: self.full_recompute(),
        }
    }

    /// Treats the active alert carrying this vehicle prefix.
    ///
    /// Popups historically identified alerts by fleet prefix rather than
    /// raw id, so the lookup is provided here too.
    pub fn treat_by_vehicle_prefix(&mut self, prefix: &str) -> TreatOutcome {
        let id = self
            .tracker
            .active_set(&self.alerts)
            .iter()
            .find(|a| a.vehicle.prefix == prefix)
            .map(|a| a.id.clone());
        match id {
            Some(id) => self.treat(&id),
            None => TreatOutcome::noop(),
        }
    }

    /// The current render plan.
    pub fn current_plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Number of currently active (finite-coordinate) alerts.
    pub fn active_count(&self) -> usize {
        self.plan.active_count
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Re-clusters, re-classifies, and re-sizes everything.
    fn full_recompute(&mut self) -> EngineUpdate {
        let active = self.tracker.active_set(&self.alerts);
        let active_count = active.iter().filter(|a| a.has_finite_position()).count();

        let clusters = if self.clustering_enabled {
            cluster_alerts(&active, self.zoom)
        } else {
            individual_clusters(&active)
        };

        let view = ViewParams {
            zoom: self.zoom,
            clustering_enabled: self.clustering_enabled,
            intensity_filter: self.intensity_filter,
            radius_multiplier: self.radius_multiplier,
        };
        let descriptors = self.builder.build(&clusters, &view);

        self.base_radius = descriptors.iter().map(|d| (d.id, d.radius)).collect();
        self.last_full_grid_size = grid_size_for_zoom(self.zoom);
        self.plan = RenderPlan {
            descriptors,
            active_count,
        };

        EngineUpdate::Recomputed(self.plan.clone())
    }

    /// Recomputes opacity, visibility, and marker sizing for the existing
    /// shapes without touching clustering or radii.
    fn restyle(&mut self) -> EngineUpdate {
        let (opacity, fill_opacity) = circle_opacity_for_zoom(self.zoom);
        let show_markers = markers_visible(self.zoom);
        let icon_size = marker_icon_size(self.zoom);

        let mut patches = Vec::with_capacity(self.plan.descriptors.len());
        for descriptor in &mut self.plan.descriptors {
            let radius = self
                .base_radius
                .get(&descriptor.id)
                .copied()
                .unwrap_or(descriptor.radius);

            let patch = match descriptor.kind {
                ShapeKind::ClusterCircle | ShapeKind::IndividualCircle => StylePatch {
                    id: descriptor.id,
                    radius,
                    opacity,
                    fill_opacity,
                    visible: true,
                    icon_size: None,
                },
                ShapeKind::Marker => StylePatch {
                    id: descriptor.id,
                    radius: if show_markers { icon_size } else { radius },
                    opacity: if show_markers { 1.0 } else { 0.0 },
                    fill_opacity: if show_markers { 1.0 } else { 0.0 },
                    visible: show_markers,
                    icon_size: show_markers.then_some(icon_size),
                },
            };

            // Keep the mirrored plan in sync with what the renderer shows.
            descriptor.radius = patch.radius;
            descriptor.opacity = patch.opacity;
            descriptor.fill_opacity = patch.fill_opacity;
            descriptor.visible = patch.visible;

            patches.push(patch);
        }

        EngineUpdate::Restyled(patches)
    }
}

impl Default for RecomputeController {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM)
    }
}

impl TreatHandler for RecomputeController {
    fn treat_alert(&mut self, id: &AlertId) -> Option<TreatNotification> {
        self.treat(id).notification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::IntensityLevel;
    use crate::render::PopupPayload;
    use crate::types::VehicleMeta;
    use approx::assert_relative_eq;
    use geo::Coord;

    fn alert(id: &str, lng: f64, lat: f64) -> AlertPoint {
        AlertPoint {
            id: AlertId::from(id),
            position: Coord { x: lng, y: lat },
            timestamp_ms: 1_702_934_400_000,
            panic: true,
            vehicle: VehicleMeta {
                prefix: format!("V-{}", id),
                ..VehicleMeta::default()
            },
        }
    }

    /// Five alerts inside one 0.002-degree cell.
    fn five_in_one_cell() -> Vec<AlertPoint> {
        (0..5)
            .map(|i| alert(&format!("a{}", i), -38.52012 - 0.00001 * i as f64, -3.74012))
            .collect()
    }

    fn circles(plan: &RenderPlan) -> Vec<&RenderDescriptor> {
        plan.descriptors
            .iter()
            .filter(|d| d.kind != ShapeKind::Marker)
            .collect()
    }

    fn expect_recomputed(update: EngineUpdate) -> RenderPlan {
        match update {
            EngineUpdate::Recomputed(plan) => plan,
            other => panic!("expected full recompute, got {:?}", other),
        }
    }

    #[test]
    fn one_critical_cluster_of_five_at_zoom_16() {
        let mut engine = RecomputeController::new(16.0);
        let plan = expect_recomputed(engine.set_alerts(five_in_one_cell()));

        assert_eq!(plan.active_count, 5);
        let circles = circles(&plan);
        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].kind, ShapeKind::ClusterCircle);
        assert_eq!(circles[0].color, IntensityLevel::Critical.color_token());
        // 50 * min(2.5, 3) * (16/14) * 1
        assert!((circles[0].radius - 142.857).abs() < 0.01);

        // At zoom 16 each member also gets a marker.
        let markers = plan
            .descriptors
            .iter()
            .filter(|d| d.kind == ShapeKind::Marker)
            .count();
        assert_eq!(markers, 5);
    }

    #[test]
    fn disabled_clustering_yields_five_individual_circles() {
        let mut engine = RecomputeController::new(16.0);
        engine.set_alerts(five_in_one_cell());
        let plan = expect_recomputed(engine.set_clustering_enabled(false));

        let circles = circles(&plan);
        assert_eq!(circles.len(), 5);
        for c in &circles {
            assert_eq!(c.kind, ShapeKind::IndividualCircle);
            // 30 * (16/14) * 1
            assert!((c.radius - 34.2857).abs() < 0.01);
        }
    }

    #[test]
    fn treating_one_member_shrinks_the_cluster_in_place() {
        let mut engine = RecomputeController::new(16.0);
        let before = expect_recomputed(engine.set_alerts(five_in_one_cell()));
        let anchor_before = circles(&before)[0].position;

        let outcome = engine.treat(&AlertId::from("a2"));
        assert!(outcome.changed);
        let notification = outcome.notification.expect("first treat notifies");
        assert_eq!(notification.vehicle_prefix, "V-a2");

        let after = expect_recomputed(outcome.update);
        assert_eq!(after.active_count, 4);
        let circle = circles(&after)[0];
        assert_eq!(circle.position, anchor_before);
        match &circle.popup {
            PopupPayload::Cluster { count, .. } => assert_eq!(*count, 4),
            other => panic!("expected cluster popup, got {:?}", other),
        }

        // Second treat of the same id: no notification, no recompute.
        let again = engine.treat(&AlertId::from("a2"));
        assert!(!again.changed);
        assert!(again.notification.is_none());
        assert_eq!(again.update, EngineUpdate::Unchanged);
    }

    #[test]
    fn treat_unknown_id_is_a_silent_noop() {
        let mut engine = RecomputeController::new(16.0);
        engine.set_alerts(five_in_one_cell());
        let outcome = engine.treat(&AlertId::from("nope"));
        assert!(!outcome.changed);
        assert!(outcome.notification.is_none());
        assert_eq!(outcome.update, EngineUpdate::Unchanged);
        assert_eq!(engine.active_count(), 5);
    }

    #[test]
    fn treat_by_vehicle_prefix_resolves_the_id() {
        let mut engine = RecomputeController::new(16.0);
        engine.set_alerts(five_in_one_cell());
        let outcome = engine.treat_by_vehicle_prefix("V-a0");
        assert!(outcome.changed);
        assert_eq!(engine.active_count(), 4);

        assert!(!engine.treat_by_vehicle_prefix("V-a0").changed);
        assert!(!engine.treat_by_vehicle_prefix("V-ghost").changed);
    }

    #[test]
    fn zoom_16_to_15_crosses_a_band_and_shifts_anchors() {
        // 16 → 0.002 but 15 → 0.005: this one-step move must recluster.
        let mut engine = RecomputeController::new(16.0);
        let before = expect_recomputed(engine.set_alerts(five_in_one_cell()));
        let anchor_before = circles(&before)[0].position;

        let after = expect_recomputed(engine.set_zoom(15.0));
        let anchor_after = circles(&after)[0].position;
        assert_ne!(anchor_before, anchor_after);
    }

    #[test]
    fn in_band_zoom_only_restyles() {
        let mut engine = RecomputeController::new(14.0);
        let plan = expect_recomputed(engine.set_alerts(five_in_one_cell()));
        let circle_radius = circles(&plan)[0].radius;

        // 14 → 15 stays in the 0.005 band but crosses the opacity tier.
        let update = engine.set_zoom(15.0);
        let patches = match update {
            EngineUpdate::Restyled(patches) => patches,
            other => panic!("expected restyle, got {:?}", other),
        };
        assert_eq!(patches.len(), plan.descriptors.len());

        let circle_patch = patches
            .iter()
            .find(|p| p.icon_size.is_none())
            .expect("cluster circle patch");
        assert_relative_eq!(circle_patch.radius, circle_radius);
        assert_relative_eq!(circle_patch.opacity, 0.8);
        assert_relative_eq!(circle_patch.fill_opacity, 0.6);
        assert!(circle_patch.visible);

        let marker_patch = patches
            .iter()
            .find(|p| p.icon_size.is_some())
            .expect("marker patch");
        assert!(marker_patch.visible);
        assert_relative_eq!(marker_patch.icon_size.unwrap(), 12.0);
    }

    #[test]
    fn unchanged_inputs_do_not_recompute() {
        let mut engine = RecomputeController::new(12.0);
        let alerts = five_in_one_cell();
        engine.set_alerts(alerts.clone());

        assert_eq!(engine.set_alerts(alerts), EngineUpdate::Unchanged);
        assert_eq!(engine.set_zoom(12.0), EngineUpdate::Unchanged);
        assert_eq!(
            engine.set_intensity_filter(IntensityFilter::All),
            EngineUpdate::Unchanged
        );
        assert_eq!(engine.set_clustering_enabled(true), EngineUpdate::Unchanged);
        assert_eq!(
            engine.set_radius_multiplier(1.0),
            Ok(EngineUpdate::Unchanged)
        );
    }

    #[test]
    fn multiplier_validation_at_the_control_boundary() {
        let mut engine = RecomputeController::new(12.0);
        engine.set_alerts(five_in_one_cell());

        assert!(matches!(
            engine.set_radius_multiplier(0.4),
            Err(EngineError::RadiusMultiplierOutOfRange { .. })
        ));
        assert!(matches!(
            engine.set_radius_multiplier(10.5),
            Err(EngineError::RadiusMultiplierOutOfRange { .. })
        ));
        assert!(matches!(
            engine.set_radius_multiplier(f64::NAN),
            Err(EngineError::RadiusMultiplierNotFinite)
        ));

        // A rejected value leaves the plan untouched.
        let radius_before = circles(engine.current_plan())[0].radius;
        let _ = engine.set_radius_multiplier(99.0);
        assert_relative_eq!(circles(engine.current_plan())[0].radius, radius_before);

        // A valid value rescales.
        let plan = expect_recomputed(engine.set_radius_multiplier(2.0).unwrap());
        assert_relative_eq!(circles(&plan)[0].radius, radius_before * 2.0);
    }

    #[test]
    fn critical_filter_drops_small_clusters() {
        let mut alerts = five_in_one_cell();
        // A second cell with two alerts (level High).
        alerts.push(alert("b0", -38.61001, -3.81001));
        alerts.push(alert("b1", -38.61002, -3.81002));

        let mut engine = RecomputeController::new(12.0);
        engine.set_alerts(alerts);
        let plan = expect_recomputed(
            engine.set_intensity_filter(IntensityFilter::Only(IntensityLevel::Critical)),
        );

        let circles = circles(&plan);
        assert_eq!(circles.len(), 1);
        match &circles[0].popup {
            PopupPayload::Cluster { count, .. } => assert!(*count >= 3),
            other => panic!("expected cluster popup, got {:?}", other),
        }
    }

    #[test]
    fn count_conservation_under_all_filter() {
        let mut engine = RecomputeController::new(10.0);
        let mut alerts = five_in_one_cell();
        alerts.push(alert("far", -37.0, -4.5));
        alerts.push(alert("bad", f64::NAN, -4.5));
        let plan = expect_recomputed(engine.set_alerts(alerts));

        let total: usize = plan
            .descriptors
            .iter()
            .filter_map(|d| match &d.popup {
                PopupPayload::Cluster { count, .. } if d.kind == ShapeKind::ClusterCircle => {
                    Some(count)
                }
                _ => None,
            })
            .sum();
        // The NaN point is counted nowhere.
        assert_eq!(total, 6);
        assert_eq!(plan.active_count, 6);
    }
}
