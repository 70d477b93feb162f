//! Treat/dismiss lifecycle for alerts.
//!
//! Each alert moves Active → Treated exactly once; there is no reverse
//! transition and the set is scoped to the engine's lifetime (treated
//! state is not persisted across sessions).

use crate::types::{AlertId, AlertPoint};
use std::collections::HashSet;

/// Owns the monotonic set of treated alert identifiers and derives the
/// active alert set from a raw ingestion batch.
#[derive(Debug, Clone, Default)]
pub struct EventLifecycleTracker {
    treated: HashSet<AlertId>,
}

impl EventLifecycleTracker {
    /// Creates a tracker with nothing treated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an alert as treated.
    ///
    /// Idempotent: returns true only when this call changed membership,
    /// which is the signal for firing the one-shot user notification.
    /// Unknown ids are accepted silently (they are simply never active).
    pub fn treat(&mut self, id: &AlertId) -> bool {
        self.treated.insert(id.clone())
    }

    /// Whether an alert has been treated.
    pub fn is_treated(&self, id: &AlertId) -> bool {
        self.treated.contains(id)
    }

    /// Number of treated alerts so far.
    pub fn treated_count(&self) -> usize {
        self.treated.len()
    }

    /// Derives the active set: panic flag set and not yet treated.
    ///
    /// Recomputed on demand, never stored.
    pub fn active_set<'a>(&self, alerts: &'a [AlertPoint]) -> Vec<&'a AlertPoint> {
        alerts
            .iter()
            .filter(|a| a.panic && !self.treated.contains(&a.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleMeta;
    use geo::Coord;

    fn alert(id: &str, panic: bool) -> AlertPoint {
        AlertPoint {
            id: AlertId::from(id),
            position: Coord { x: -38.52, y: -3.74 },
            timestamp_ms: 0,
            panic,
            vehicle: VehicleMeta::default(),
        }
    }

    #[test]
    fn treat_is_idempotent() {
        let mut tracker = EventLifecycleTracker::new();
        let id = AlertId::from("a");
        assert!(tracker.treat(&id));
        assert!(!tracker.treat(&id));
        assert_eq!(tracker.treated_count(), 1);
    }

    #[test]
    fn active_set_excludes_treated_and_non_panic() {
        let alerts = vec![alert("a", true), alert("b", true), alert("c", false)];
        let mut tracker = EventLifecycleTracker::new();

        let active = tracker.active_set(&alerts);
        assert_eq!(active.len(), 2);

        tracker.treat(&AlertId::from("a"));
        let active = tracker.active_set(&alerts);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "b");

        // Second treat of the same id changes nothing.
        tracker.treat(&AlertId::from("a"));
        assert_eq!(tracker.active_set(&alerts).len(), 1);
    }

    #[test]
    fn treat_unknown_id_is_a_noop_for_active_set() {
        let alerts = vec![alert("a", true)];
        let mut tracker = EventLifecycleTracker::new();
        assert!(tracker.treat(&AlertId::from("ghost")));
        assert_eq!(tracker.active_set(&alerts).len(), 1);
    }
}
