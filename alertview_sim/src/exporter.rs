//! JSON exporter for render plans.
//!
//! Flattens each tick's render plan into plain JSON frames an external
//! viewer can replay.

use alertview_core::{RenderPlan, ShapeKind};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One exported shape.
#[derive(Debug, Clone, Serialize)]
pub struct ShapeFrame {
    pub id: u64,
    pub kind: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub color: &'static str,
    pub opacity: f64,
    pub fill_opacity: f64,
    pub visible: bool,
}

/// A single tick of simulation output.
#[derive(Debug, Clone, Serialize)]
pub struct SimFrame {
    /// Tick index
    pub tick: u64,

    /// Zoom at this tick
    pub zoom: f64,

    /// Active alerts reported by the engine
    pub active_count: usize,

    /// Shapes in draw order
    pub shapes: Vec<ShapeFrame>,

    /// Events recorded this tick (treats, filter flips, rejections)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<String>,
}

impl SimFrame {
    /// Flattens a render plan into a frame.
    pub fn from_plan(tick: u64, zoom: f64, plan: &RenderPlan, events: Vec<String>) -> Self {
        let shapes = plan
            .descriptors
            .iter()
            .map(|d| ShapeFrame {
                id: d.id,
                kind: match d.kind {
                    ShapeKind::ClusterCircle => "cluster-circle",
                    ShapeKind::IndividualCircle => "individual-circle",
                    ShapeKind::Marker => "marker",
                },
                lat: d.position.y,
                lng: d.position.x,
                radius: d.radius,
                color: d.color,
                opacity: d.opacity,
                fill_opacity: d.fill_opacity,
                visible: d.visible,
            })
            .collect();
        Self {
            tick,
            zoom,
            active_count: plan.active_count,
            shapes,
            events,
        }
    }
}

/// Complete export of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Frames in tick order
    pub frames: Vec<SimFrame>,
}

impl SimExport {
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Writes the export as pretty JSON.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }
}
