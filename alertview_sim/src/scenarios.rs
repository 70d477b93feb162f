//! Stress scenarios for the clustering engine.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: zoom sweep across every grid band, both directions
    ZoomSweep,

    /// SIM-002: mass treating with idempotence re-checks
    TreatStorm,

    /// SIM-003: cycling every intensity filter over a mixed feed
    FilterFlip,

    /// SIM-004: clustering disabled, individual descriptors only
    SoloMode,

    /// SIM-005: radius multiplier sweep, including rejected values
    RadiusRide,

    /// SIM-006: large dense feed with rolling data refreshes
    RushHour,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ZoomSweep,
            ScenarioId::TreatStorm,
            ScenarioId::FilterFlip,
            ScenarioId::SoloMode,
            ScenarioId::RadiusRide,
            ScenarioId::RushHour,
        ]
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ZoomSweep => "zoom-sweep",
            ScenarioId::TreatStorm => "treat-storm",
            ScenarioId::FilterFlip => "filter-flip",
            ScenarioId::SoloMode => "solo-mode",
            ScenarioId::RadiusRide => "radius-ride",
            ScenarioId::RushHour => "rush-hour",
        }
    }

    /// One-line description for the CLI listing.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ZoomSweep => {
                "sweeps zoom 5..18 and back, checking recluster-vs-restyle at every band edge"
            }
            ScenarioId::TreatStorm => {
                "treats every alert one by one, re-treating some to confirm idempotence"
            }
            ScenarioId::FilterFlip => "cycles all/moderate/high/critical filters over a mixed feed",
            ScenarioId::SoloMode => "runs the whole feed with clustering disabled",
            ScenarioId::RadiusRide => {
                "sweeps the radius multiplier across and beyond its valid range"
            }
            ScenarioId::RushHour => "large dense feed with rolling data refreshes",
        }
    }

    /// Parses a CLI name.
    pub fn from_name(name: &str) -> Option<ScenarioId> {
        Self::all().into_iter().find(|s| s.name() == name)
    }
}
