//! Zoom-banded grid sizing for spatial clustering.
//!
//! The grid size is a step function of zoom: more zoom means a smaller
//! cell (more detailed clustering), less zoom a larger cell. Bands are
//! checked from the highest zoom downward; first match wins.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Returns the clustering grid cell size (in degrees) for a zoom level.
///
/// | zoom ≥ | grid size | footprint |
/// |--------|-----------|-----------|
/// | 16     | 0.002     | ~200 m    |
/// | 14     | 0.005     | ~500 m    |
/// | 12     | 0.01      | ~1 km     |
/// | 10     | 0.02      | ~2 km     |
/// | 8      | 0.05      | ~5 km     |
/// | else   | 0.1       | ~10 km    |
///
/// Identical zoom always yields an identical grid size, so band membership
/// can be compared exactly.
pub fn grid_size_for_zoom(zoom: f64) -> f64 {
    if zoom >= 16.0 {
        0.002
    } else if zoom >= 14.0 {
        0.005
    } else if zoom >= 12.0 {
        0.01
    } else if zoom >= 10.0 {
        0.02
    } else if zoom >= 8.0 {
        0.05
    } else {
        0.1
    }
}

/// Returns true when two zoom levels fall in the same grid-size band.
///
/// The grid sizes are fixed table constants, so exact equality is the
/// band-identity test.
pub fn same_grid_band(zoom_a: f64, zoom_b: f64) -> bool {
    grid_size_for_zoom(zoom_a) == grid_size_for_zoom(zoom_b)
}

/// A rectangular spatial bucket at a given grid size.
///
/// Keyed by integer floor indices so it can serve as a hash-map key; the
/// floating-point cell origin is derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// floor(lat / grid_size)
    pub lat_idx: i64,

    /// floor(lng / grid_size)
    pub lng_idx: i64,
}

impl GridCell {
    /// Returns the cell containing a position at the given grid size.
    ///
    /// Callers must pre-filter non-finite coordinates; a NaN floor would
    /// otherwise collapse to a garbage index.
    pub fn containing(position: Coord<f64>, grid_size: f64) -> Self {
        Self {
            lat_idx: (position.y / grid_size).floor() as i64,
            lng_idx: (position.x / grid_size).floor() as i64,
        }
    }

    /// The cell's south-west origin (x = lng, y = lat).
    pub fn origin(&self, grid_size: f64) -> Coord<f64> {
        Coord {
            x: self.lng_idx as f64 * grid_size,
            y: self.lat_idx as f64 * grid_size,
        }
    }

    /// The cluster anchor: cell origin plus half a grid step on each axis.
    ///
    /// This is the cell's geometric center, not the centroid of member
    /// alerts.
    pub fn anchor(&self, grid_size: f64) -> Coord<f64> {
        let origin = self.origin(grid_size);
        Coord {
            x: origin.x + grid_size / 2.0,
            y: origin.y + grid_size / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grid_size_table_boundaries() {
        let expected = [
            (7.0, 0.1),
            (8.0, 0.05),
            (9.0, 0.05),
            (10.0, 0.02),
            (11.0, 0.02),
            (12.0, 0.01),
            (13.0, 0.01),
            (14.0, 0.005),
            (15.0, 0.005),
            (16.0, 0.002),
            (17.0, 0.002),
        ];
        for (zoom, size) in expected {
            assert_eq!(grid_size_for_zoom(zoom), size, "zoom {}", zoom);
        }
    }

    #[test]
    fn grid_size_is_non_increasing_in_zoom() {
        let mut prev = grid_size_for_zoom(0.0);
        for step in 1..=40 {
            let size = grid_size_for_zoom(step as f64 * 0.5);
            assert!(size <= prev);
            prev = size;
        }
    }

    #[test]
    fn band_identity() {
        assert!(same_grid_band(14.0, 15.9));
        assert!(!same_grid_band(15.0, 16.0));
        assert!(!same_grid_band(16.0, 15.0));
        assert!(same_grid_band(3.0, 7.9));
    }

    #[test]
    fn cell_containing_and_anchor() {
        let g = 0.002;
        let cell = GridCell::containing(Coord { x: -38.5213, y: -3.7409 }, g);
        // floor(-3.7409 / 0.002) = -1871, floor(-38.5213 / 0.002) = -19261
        assert_eq!(cell.lat_idx, -1871);
        assert_eq!(cell.lng_idx, -19261);

        let anchor = cell.anchor(g);
        assert_relative_eq!(anchor.y, -1871.0 * g + g / 2.0);
        assert_relative_eq!(anchor.x, -19261.0 * g + g / 2.0);
    }

    #[test]
    fn nearby_points_share_a_cell() {
        let g = 0.005;
        let a = GridCell::containing(Coord { x: -38.5201, y: -3.7402 }, g);
        let b = GridCell::containing(Coord { x: -38.5204, y: -3.7404 }, g);
        assert_eq!(a, b);
    }
}
