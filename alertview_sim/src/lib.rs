//! AlertView Simulation Harness
//!
//! Drives the clustering engine through scripted stress scenarios with a
//! fully deterministic alert feed. All entropy derives from a single
//! 64-bit seed, so any invariant violation is reproducible from its seed
//! number. Runs can optionally export frame-by-frame render plans as
//! JSON for an external viewer.

pub mod exporter;
pub mod generator;
pub mod oracle;
pub mod runner;
pub mod scenarios;

pub use exporter::{ShapeFrame, SimExport, SimFrame};
pub use generator::AlertGenerator;
pub use oracle::InvariantOracle;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
