//! Declarative render instructions for the external map surface.
//!
//! The builder performs no drawing: it emits a plain ordered list of
//! shape descriptors (circles and markers with popup payloads) that the
//! renderer consumes as a full replacement each pass.

use crate::cluster::Cluster;
use crate::intensity::{IntensityFilter, IntensityLevel};
use crate::radius::{cluster_radius, individual_radius};
use crate::types::{AlertId, AlertPoint, VehicleMeta};
use geo::Coord;
use serde::{Deserialize, Serialize};

/// Stable id assigned to a descriptor at build time.
///
/// Monotonic per engine instance and never reused, so a style patch can
/// never alias a shape from a different recompute pass.
pub type DescriptorId = u64;

/// Fixed circle stroke weight.
pub const STROKE_WEIGHT: f64 = 4.0;

/// Minimum zoom at which the individual marker layer is shown.
pub const MARKER_MIN_ZOOM: f64 = 14.0;

/// How many member vehicles a cluster popup samples.
pub const POPUP_SAMPLE_SIZE: usize = 3;

/// Design token for the per-alert marker icon.
pub const MARKER_COLOR_TOKEN: &str = "danger";

/// Kind of shape the renderer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    /// Circle over a grid-cell cluster
    ClusterCircle,

    /// Circle over a single ungrouped alert (clustering disabled)
    IndividualCircle,

    /// Per-alert icon marker (high zoom only)
    Marker,
}

/// Structured popup content; the engine never renders it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PopupPayload {
    /// Cluster summary: count, level label, and a sample of member
    /// vehicles. Treating happens on individual markers, hence the hint.
    Cluster {
        count: usize,
        level: IntensityLevel,
        label: &'static str,
        sampled_vehicles: Vec<String>,
        treat_on_markers_hint: bool,
    },

    /// Full single-alert detail plus the treat action reference the
    /// renderer hands back to a [`TreatHandler`].
    Individual {
        alert_id: AlertId,
        vehicle: VehicleMeta,
        position: Coord<f64>,
        timestamp_ms: i64,
        level: IntensityLevel,
        treat: TreatRef,
    },
}

/// Reference to the treat action for one alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatRef {
    /// Id to pass to [`TreatHandler::treat_alert`]
    pub alert_id: AlertId,
}

/// One shape for the renderer to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderDescriptor {
    /// Build-time id, stable until the next full recompute
    pub id: DescriptorId,

    /// What to draw
    pub kind: ShapeKind,

    /// Where to draw it (x = lng, y = lat)
    pub position: Coord<f64>,

    /// Circle radius in meters; for markers, the icon diameter in pixels
    pub radius: f64,

    /// Design token the renderer resolves to a color
    pub color: &'static str,

    /// Stroke opacity
    pub opacity: f64,

    /// Fill opacity
    pub fill_opacity: f64,

    /// Stroke weight
    pub stroke_weight: f64,

    /// Whether the shape is currently visible
    pub visible: bool,

    /// Structured popup content
    pub popup: PopupPayload,
}

/// Handler the embedding renderer invokes when the user confirms a
/// popup treat action.
///
/// Passed by direct reference instead of a globally registered callback,
/// so multiple engine instances can coexist.
pub trait TreatHandler {
    /// Treats one alert; returns the notification to surface, or None
    /// when the call changed nothing (already treated or unknown id).
    fn treat_alert(&mut self, id: &AlertId) -> Option<TreatNotification>;
}

/// One-shot confirmation payload fired per successful treat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatNotification {
    /// The treated alert
    pub alert_id: AlertId,

    /// Vehicle prefix for the "alert for vehicle X treated" message
    pub vehicle_prefix: String,
}

/// View and user-control inputs the builder styles against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    pub zoom: f64,
    pub clustering_enabled: bool,
    pub intensity_filter: IntensityFilter,
    pub radius_multiplier: f64,
}

/// Circle stroke/fill opacity for a zoom level (restyle table).
///
/// | zoom ≥ | opacity | fill opacity |
/// |--------|---------|--------------|
/// | 15     | 0.8     | 0.6          |
/// | 13     | 0.9     | 0.7          |
/// | else   | 1.0     | 0.8          |
pub fn circle_opacity_for_zoom(zoom: f64) -> (f64, f64) {
    if zoom >= 15.0 {
        (0.8, 0.6)
    } else if zoom >= 13.0 {
        (0.9, 0.7)
    } else {
        (1.0, 0.8)
    }
}

/// Marker icon size in pixels: zoom − 10, clamped to [12, 20].
pub fn marker_icon_size(zoom: f64) -> f64 {
    (zoom - 10.0).clamp(12.0, 20.0)
}

/// Whether the per-alert marker layer is visible at this zoom.
pub fn markers_visible(zoom: f64) -> bool {
    zoom >= MARKER_MIN_ZOOM
}

/// Builds the ordered descriptor list for one recompute pass.
#[derive(Debug, Default)]
pub struct RenderInstructionBuilder {
    next_id: DescriptorId,
}

impl RenderInstructionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> DescriptorId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Builds circle descriptors for the surviving clusters plus marker
    /// descriptors for every active member (markers only at high zoom).
    ///
    /// Clusters failing the intensity filter are dropped wholesale; their
    /// members get neither a circle nor redistribution, though they keep
    /// their markers (the marker layer is gated by zoom alone).
    pub fn build(&mut self, clusters: &[Cluster], view: &ViewParams) -> Vec<RenderDescriptor> {
        let mut descriptors = Vec::new();

        for cluster in clusters {
            let level = IntensityLevel::for_count(cluster.count);
            if !view.intensity_filter.matches(level) {
                continue;
            }
            descriptors.push(self.circle_for(cluster, level, view));
        }

        if markers_visible(view.zoom) {
            let icon_size = marker_icon_size(view.zoom);
            for cluster in clusters {
                for member in &cluster.members {
                    descriptors.push(self.marker_for(member, icon_size));
                }
            }
        }

        descriptors
    }

    fn circle_for(
        &mut self,
        cluster: &Cluster,
        level: IntensityLevel,
        view: &ViewParams,
    ) -> RenderDescriptor {
        let (kind, radius, fill_opacity, popup) = if view.clustering_enabled {
            let intensity = (cluster.count as f64 / 2.0).min(1.0);
            (
                ShapeKind::ClusterCircle,
                cluster_radius(cluster.count, view.zoom, view.radius_multiplier),
                0.7 + 0.2 * intensity,
                PopupPayload::Cluster {
                    count: cluster.count,
                    level,
                    label: level.label(),
                    sampled_vehicles: cluster
                        .members
                        .iter()
                        .take(POPUP_SAMPLE_SIZE)
                        .map(|m| m.vehicle.prefix.clone())
                        .collect(),
                    treat_on_markers_hint: true,
                },
            )
        } else {
            let alert = &cluster.members[0];
            (
                ShapeKind::IndividualCircle,
                individual_radius(view.zoom, view.radius_multiplier),
                0.8,
                PopupPayload::Individual {
                    alert_id: alert.id.clone(),
                    vehicle: alert.vehicle.clone(),
                    position: alert.position,
                    timestamp_ms: alert.timestamp_ms,
                    level,
                    treat: TreatRef {
                        alert_id: alert.id.clone(),
                    },
                },
            )
        };

        RenderDescriptor {
            id: self.allocate_id(),
            kind,
            position: cluster.anchor,
            radius,
            color: level.color_token(),
            opacity: 1.0,
            fill_opacity,
            stroke_weight: STROKE_WEIGHT,
            visible: true,
            popup,
        }
    }

    fn marker_for(&mut self, alert: &AlertPoint, icon_size: f64) -> RenderDescriptor {
        RenderDescriptor {
            id: self.allocate_id(),
            kind: ShapeKind::Marker,
            position: alert.position,
            radius: icon_size,
            color: MARKER_COLOR_TOKEN,
            opacity: 1.0,
            fill_opacity: 1.0,
            stroke_weight: STROKE_WEIGHT,
            visible: true,
            popup: PopupPayload::Individual {
                alert_id: alert.id.clone(),
                vehicle: alert.vehicle.clone(),
                position: alert.position,
                timestamp_ms: alert.timestamp_ms,
                level: IntensityLevel::for_count(1),
                treat: TreatRef {
                    alert_id: alert.id.clone(),
                },
            },
        }
    }
}
