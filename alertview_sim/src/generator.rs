//! Deterministic synthetic alert feed.
//!
//! Produces panic-alert batches the way the real ingestion service would:
//! vehicles scattered in Gaussian hotspots around a city center, a share
//! of non-panic records, and the occasional corrupt coordinate that the
//! engine must exclude silently.

use alertview_core::{AlertId, AlertPoint, VehicleMeta};
use geo::Coord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use uuid::Uuid;

/// Default city center: Fortaleza (lat −3.74, lng −38.52).
pub const DEFAULT_CENTER: Coord<f64> = Coord {
    x: -38.52,
    y: -3.74,
};

/// Hotspot scatter in degrees (roughly a few hundred meters).
const HOTSPOT_SIGMA_DEG: f64 = 0.004;

/// How far hotspot centers spread from the city center, in degrees.
const CITY_SIGMA_DEG: f64 = 0.08;

const COMPANIES: [&str; 3] = ["Via Norte", "TransUrbana", "Litoral Sul"];
const LINES: [&str; 5] = ["045", "077", "130", "222", "815"];

/// Seeded generator of alert batches.
pub struct AlertGenerator {
    rng: ChaCha8Rng,
    center: Coord<f64>,
    hotspots: Vec<Coord<f64>>,

    /// Probability a record has the panic flag unset
    pub non_panic_share: f64,

    /// Probability a record carries a NaN coordinate
    pub corrupt_share: f64,

    serial: u64,
}

impl AlertGenerator {
    /// Creates a generator with the given seed and hotspot count around
    /// the default center.
    pub fn new(seed: u64, num_hotspots: usize) -> Self {
        Self::with_center(seed, num_hotspots, DEFAULT_CENTER)
    }

    /// Creates a generator around an arbitrary center.
    pub fn with_center(seed: u64, num_hotspots: usize, center: Coord<f64>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let spread = Normal::new(0.0, CITY_SIGMA_DEG).unwrap();
        let hotspots = (0..num_hotspots.max(1))
            .map(|_| Coord {
                x: center.x + spread.sample(&mut rng),
                y: center.y + spread.sample(&mut rng),
            })
            .collect();
        Self {
            rng,
            center,
            hotspots,
            non_panic_share: 0.1,
            corrupt_share: 0.02,
            serial: 0,
        }
    }

    /// Generates one batch of alert records.
    pub fn batch(&mut self, size: usize) -> Vec<AlertPoint> {
        let scatter = Normal::new(0.0, HOTSPOT_SIGMA_DEG).unwrap();
        (0..size).map(|_| self.one(&scatter)).collect()
    }

    fn one(&mut self, scatter: &Normal<f64>) -> AlertPoint {
        self.serial += 1;
        let hotspot = self.hotspots[self.rng.gen_range(0..self.hotspots.len())];

        let mut position = Coord {
            x: hotspot.x + scatter.sample(&mut self.rng),
            y: hotspot.y + scatter.sample(&mut self.rng),
        };
        if self.rng.gen_bool(self.corrupt_share) {
            // Upstream GPS glitch: one axis goes NaN.
            if self.rng.gen_bool(0.5) {
                position.x = f64::NAN;
            } else {
                position.y = f64::NAN;
            }
        }

        let prefix_num: u32 = self.rng.gen_range(1000..9999);
        AlertPoint {
            id: AlertId::new(Uuid::from_u64_pair(self.serial, self.rng.gen()).to_string()),
            position,
            timestamp_ms: 1_702_934_400_000 + self.serial as i64 * 1_000,
            panic: !self.rng.gen_bool(self.non_panic_share),
            vehicle: VehicleMeta {
                prefix: format!("V{}", prefix_num),
                line: Some(LINES[self.rng.gen_range(0..LINES.len())].to_string()),
                company: Some(COMPANIES[self.rng.gen_range(0..COMPANIES.len())].to_string()),
                driver: None,
                speed_kmh: Some(self.rng.gen_range(0.0..80.0)),
            },
        }
    }

    /// The configured city center.
    pub fn center(&self) -> Coord<f64> {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_batch() {
        let mut a = AlertGenerator::new(42, 4);
        let mut b = AlertGenerator::new(42, 4);
        assert_eq!(a.batch(50), b.batch(50));
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = AlertGenerator::new(1, 4);
        let mut b = AlertGenerator::new(2, 4);
        assert_ne!(a.batch(50), b.batch(50));
    }

    #[test]
    fn ids_are_unique_within_a_run() {
        let mut gen = AlertGenerator::new(7, 3);
        let batch = gen.batch(200);
        let mut ids: Vec<_> = batch.iter().map(|a| a.id.clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }
}
