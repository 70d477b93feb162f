//! AlertView Core - Zoom-Adaptive Panic-Alert Clustering Engine
//!
//! This library turns a stream of geolocated panic-alert records into a
//! declarative render plan for an external map surface:
//! 1. **Spatial clustering**: alerts are grouped into zoom-sized grid cells
//!    (or passed through individually when clustering is off)
//! 2. **Severity classification**: cluster size maps to an intensity level
//!    with a matching color design token
//! 3. **Two-speed updates**: a zoom move that stays inside the current grid
//!    band only restyles existing shapes; crossing a band (or changing any
//!    other input) triggers a full recompute
//!
//! The engine is single-threaded, synchronous, and free of I/O. All core
//! functions are referentially transparent; the only mutable state is the
//! monotonic treated-alert set.

pub mod cluster;
pub mod controller;
pub mod error;
pub mod grid;
pub mod intensity;
pub mod lifecycle;
pub mod radius;
pub mod render;
pub mod types;

// Re-export key types for convenience
pub use cluster::{cluster_alerts, individual_clusters, Cluster};
pub use controller::{EngineUpdate, RecomputeController, RenderPlan, StylePatch, TreatOutcome};
pub use error::EngineError;
pub use grid::{grid_size_for_zoom, GridCell};
pub use intensity::{IntensityFilter, IntensityLevel};
pub use lifecycle::EventLifecycleTracker;
pub use render::{
    circle_opacity_for_zoom, marker_icon_size, markers_visible, DescriptorId, PopupPayload,
    RenderDescriptor, RenderInstructionBuilder, ShapeKind, TreatHandler, TreatNotification,
    ViewParams,
};
pub use types::{AlertId, AlertPoint, VehicleMeta};
