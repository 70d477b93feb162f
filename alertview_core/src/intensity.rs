//! Severity classification for alert clusters.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of a cluster (or of a single ungrouped alert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityLevel {
    /// 1 alert
    Moderate,

    /// 2 alerts
    High,

    /// 3 or more alerts
    Critical,
}

impl IntensityLevel {
    /// Classifies an alert count.
    ///
    /// A single ungrouped alert classifies the same way (count 1 →
    /// moderate).
    pub fn for_count(count: usize) -> Self {
        if count >= 3 {
            Self::Critical
        } else if count >= 2 {
            Self::High
        } else {
            Self::Moderate
        }
    }

    /// Operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Fixed design token the renderer resolves to an actual color.
    pub fn color_token(&self) -> &'static str {
        match self {
            Self::Moderate => "heat-moderate",
            Self::High => "heat-high",
            Self::Critical => "heat-critical",
        }
    }
}

impl std::fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// User-selected intensity filter.
///
/// A cluster failing the filter is dropped wholesale; its members are not
/// redistributed or shown individually.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityFilter {
    /// Show every cluster
    #[default]
    All,

    /// Show only clusters at exactly this level
    Only(IntensityLevel),
}

impl IntensityFilter {
    /// Returns true when a cluster at `level` survives this filter.
    pub fn matches(&self, level: IntensityLevel) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == level,
        }
    }
}

impl FromStr for IntensityFilter {
    type Err = std::convert::Infallible;

    /// Lenient parse: unknown or unsupported values degrade to `All`
    /// (no filtering) rather than erroring.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "moderate" => Self::Only(IntensityLevel::Moderate),
            "high" => Self::Only(IntensityLevel::High),
            "critical" => Self::Only(IntensityLevel::Critical),
            _ => Self::All,
        })
    }
}
