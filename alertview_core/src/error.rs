//! Error types for the alert map engine.
//!
//! Correct inputs never produce an error: bad coordinates are excluded
//! silently, unknown filter values degrade to "all", and treating an
//! unknown id is a no-op. The only failures live at the control boundary,
//! where UI-supplied values are validated before they reach the pure
//! functions.

use thiserror::Error;

/// Errors surfaced by the engine's control boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Radius multiplier outside the UI-exposed bound.
    #[error("radius multiplier {value} outside supported range [{min}, {max}]")]
    RadiusMultiplierOutOfRange { value: f64, min: f64, max: f64 },

    /// Radius multiplier that is NaN (cannot be range-checked).
    #[error("radius multiplier must be a finite number")]
    RadiusMultiplierNotFinite,
}
