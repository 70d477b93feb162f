//! Grid-based spatial clustering of active alerts.
//!
//! Clustering-enabled mode buckets alerts into zoom-sized grid cells;
//! disabled mode passes each alert through as its own degenerate cluster
//! anchored at its exact coordinates. Non-finite coordinates are excluded
//! before grouping and counted nowhere.

use crate::grid::{grid_size_for_zoom, GridCell};
use crate::types::AlertPoint;
use geo::Coord;
use std::collections::HashMap;

/// A group of alerts sharing a grid cell (or a single passed-through
/// alert when clustering is disabled).
///
/// Ephemeral: recomputed every pass, no identity across recomputations.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// The grid cell this cluster occupies; None for degenerate
    /// single-alert clusters in disabled mode (no grid snapping).
    pub cell: Option<GridCell>,

    /// Render anchor: cell origin + half grid in clustered mode, the
    /// alert's exact position otherwise.
    pub anchor: Coord<f64>,

    /// Number of member alerts.
    pub count: usize,

    /// Members in first-seen insertion order (popups sample the first
    /// few, so order is part of the contract).
    pub members: Vec<AlertPoint>,
}

/// Groups active alerts into grid cells at the zoom's grid size.
///
/// Cluster order follows first-seen cell order, member order follows
/// input order. An empty input yields an empty list.
pub fn cluster_alerts(active: &[&AlertPoint], zoom: f64) -> Vec<Cluster> {
    let grid_size = grid_size_for_zoom(zoom);
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut index_by_cell: HashMap<GridCell, usize> = HashMap::new();

    for alert in active {
        if !alert.has_finite_position() {
            continue;
        }
        let cell = GridCell::containing(alert.position, grid_size);
        match index_by_cell.get(&cell) {
            Some(&idx) => {
                let cluster = &mut clusters[idx];
                cluster.count += 1;
                cluster.members.push((*alert).clone());
            }
            None => {
                index_by_cell.insert(cell, clusters.len());
                clusters.push(Cluster {
                    cell: Some(cell),
                    anchor: cell.anchor(grid_size),
                    count: 1,
                    members: vec![(*alert).clone()],
                });
            }
        }
    }

    clusters
}

/// Passes each alert through as a degenerate count-1 cluster.
pub fn individual_clusters(active: &[&AlertPoint]) -> Vec<Cluster> {
    active
        .iter()
        .filter(|a| a.has_finite_position())
        .map(|alert| Cluster {
            cell: None,
            anchor: alert.position,
            count: 1,
            members: vec![(*alert).clone()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertId, VehicleMeta};
    use approx::assert_relative_eq;

    fn alert(id: &str, lng: f64, lat: f64) -> AlertPoint {
        AlertPoint {
            id: AlertId::from(id),
            position: Coord { x: lng, y: lat },
            timestamp_ms: 0,
            panic: true,
            vehicle: VehicleMeta {
                prefix: format!("V-{}", id),
                ..VehicleMeta::default()
            },
        }
    }

    #[test]
    fn empty_input_yields_empty_list() {
        assert!(cluster_alerts(&[], 12.0).is_empty());
        assert!(individual_clusters(&[]).is_empty());
    }

    #[test]
    fn counts_are_conserved_and_disjoint() {
        let alerts = vec![
            alert("a", -38.5201, -3.7401),
            alert("b", -38.5202, -3.7402),
            alert("c", -38.6100, -3.8100),
            alert("d", -38.6102, -3.8102),
            alert("e", -38.7000, -3.9000),
        ];
        let refs: Vec<&AlertPoint> = alerts.iter().collect();
        let clusters = cluster_alerts(&refs, 16.0);

        let total: usize = clusters.iter().map(|c| c.count).sum();
        assert_eq!(total, alerts.len());

        // No alert id appears in two clusters.
        let mut seen = std::collections::HashSet::new();
        for cluster in &clusters {
            assert_eq!(cluster.count, cluster.members.len());
            for member in &cluster.members {
                assert!(seen.insert(member.id.clone()), "{} duplicated", member.id);
            }
        }
    }

    #[test]
    fn five_points_in_one_cell_at_zoom_16() {
        // All within one 0.002-degree cell.
        let alerts: Vec<AlertPoint> = (0..5)
            .map(|i| alert(&format!("a{}", i), -38.5201 - 0.0001 * i as f64, -3.7401))
            .collect();
        let refs: Vec<&AlertPoint> = alerts.iter().collect();
        let clusters = cluster_alerts(&refs, 16.0);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 5);

        // Anchor sits at cell origin + half grid, not the member centroid.
        let cell = clusters[0].cell.expect("clustered mode sets the cell");
        let anchor = clusters[0].anchor;
        assert_relative_eq!(anchor.y, cell.origin(0.002).y + 0.001);
        assert_relative_eq!(anchor.x, cell.origin(0.002).x + 0.001);
    }

    #[test]
    fn member_order_is_first_seen() {
        let alerts = vec![
            alert("first", -38.5201, -3.7401),
            alert("second", -38.5202, -3.7401),
            alert("third", -38.5201, -3.7402),
        ];
        let refs: Vec<&AlertPoint> = alerts.iter().collect();
        let clusters = cluster_alerts(&refs, 16.0);
        assert_eq!(clusters.len(), 1);
        let ids: Vec<&str> = clusters[0].members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn non_finite_coordinates_are_excluded() {
        let good = alert("ok", -38.52, -3.74);
        let bad = alert("nan", f64::NAN, -3.74);
        let worse = alert("inf", -38.52, f64::INFINITY);
        let refs = vec![&good, &bad, &worse];

        let clusters = cluster_alerts(&refs, 12.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 1);

        let singles = individual_clusters(&refs);
        assert_eq!(singles.len(), 1);
        assert_eq!(singles[0].members[0].id.as_str(), "ok");
    }

    #[test]
    fn disabled_mode_anchors_at_exact_coordinates() {
        let a = alert("a", -38.5213, -3.7409);
        let refs = vec![&a];
        let singles = individual_clusters(&refs);
        assert_eq!(singles.len(), 1);
        assert_eq!(singles[0].cell, None);
        assert_relative_eq!(singles[0].anchor.x, -38.5213);
        assert_relative_eq!(singles[0].anchor.y, -3.7409);
    }

    #[test]
    fn coarser_zoom_merges_cells() {
        let alerts = vec![
            alert("a", -38.5201, -3.7401),
            alert("b", -38.5260, -3.7460), // different 0.002 cell, same 0.1 cell
        ];
        let refs: Vec<&AlertPoint> = alerts.iter().collect();
        assert_eq!(cluster_alerts(&refs, 16.0).len(), 2);
        assert_eq!(cluster_alerts(&refs, 5.0).len(), 1);
    }
}
