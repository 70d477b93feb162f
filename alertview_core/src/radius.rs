//! Render radius computation.
//!
//! Pure with respect to (count, zoom, mode, multiplier); recomputed
//! whenever any of those change. The multiplier is applied exactly as
//! supplied: range enforcement happens at the control boundary, never
//! inside these functions.

use std::ops::RangeInclusive;

/// Base radius (meters) of a clustered circle.
pub const CLUSTER_BASE_RADIUS_M: f64 = 50.0;

/// Base radius (meters) of an individual-alert circle.
pub const INDIVIDUAL_BASE_RADIUS_M: f64 = 30.0;

/// UI-exposed valid range for the radius multiplier.
pub const RADIUS_MULTIPLIER_RANGE: RangeInclusive<f64> = 0.5..=10.0;

/// Shared zoom scaling: grows linearly above zoom 14, floored at 0.5.
fn zoom_scale(zoom: f64) -> f64 {
    (zoom / 14.0).max(0.5)
}

/// Radius (meters) of a cluster circle.
///
/// Scales with alert count up to a 3x cap at six alerts, then with zoom,
/// then with the user multiplier.
pub fn cluster_radius(count: usize, zoom: f64, multiplier: f64) -> f64 {
    let count_scale = (count as f64 * 0.5).min(3.0);
    CLUSTER_BASE_RADIUS_M * count_scale * zoom_scale(zoom) * multiplier
}

/// Radius (meters) of an individual alert circle.
///
/// Independent of count; only zoom and the user multiplier apply.
pub fn individual_radius(zoom: f64, multiplier: f64) -> f64 {
    INDIVIDUAL_BASE_RADIUS_M * zoom_scale(zoom) * multiplier
}
