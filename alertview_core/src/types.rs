//! Common types for the alert map engine.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Opaque identifier for a panic alert.
///
/// Assigned by the upstream ingestion service; the engine never inspects
/// its structure, only compares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    /// Creates an AlertId from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AlertId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Vehicle metadata carried on an alert.
///
/// Opaque to the clustering pipeline; surfaced verbatim in popup payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleMeta {
    /// Fleet prefix shown to operators (e.g. "V1234")
    pub prefix: String,

    /// Bus line the vehicle was serving
    pub line: Option<String>,

    /// Operating company
    pub company: Option<String>,

    /// Driver name, when the upstream feed includes it
    pub driver: Option<String>,

    /// Average speed in km/h at transmission time
    pub speed_kmh: Option<f64>,
}

/// One geolocated panic-alert record.
///
/// Created by the external ingestion collaborator and immutable once
/// ingested. Position uses `x` = longitude, `y` = latitude, in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPoint {
    /// Unique identifier
    pub id: AlertId,

    /// Global position (x = longitude, y = latitude)
    pub position: Coord<f64>,

    /// Transmission timestamp (Unix milliseconds)
    pub timestamp_ms: i64,

    /// Whether the panic button was pressed
    pub panic: bool,

    /// Vehicle metadata for popup display
    pub vehicle: VehicleMeta,
}

impl AlertPoint {
    /// Returns true when both coordinates are finite.
    ///
    /// Points failing this check are excluded from clustering and counted
    /// nowhere.
    pub fn has_finite_position(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite()
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.position.y
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.position.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert_at(lng: f64, lat: f64) -> AlertPoint {
        AlertPoint {
            id: AlertId::new("a-1"),
            position: Coord { x: lng, y: lat },
            timestamp_ms: 1_702_934_400_000,
            panic: true,
            vehicle: VehicleMeta::default(),
        }
    }

    #[test]
    fn finite_position_check() {
        assert!(alert_at(-38.52, -3.74).has_finite_position());
        assert!(!alert_at(f64::NAN, -3.74).has_finite_position());
        assert!(!alert_at(-38.52, f64::INFINITY).has_finite_position());
    }

    #[test]
    fn alert_id_display_and_eq() {
        let id = AlertId::from("evt-42");
        assert_eq!(id.to_string(), "evt-42");
        assert_eq!(id, AlertId::new("evt-42"));
    }
}
