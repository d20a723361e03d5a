//! Pairwise planar distances and radial kernel weights.

use mosaic_core::constants::KERNEL_WEIGHT_FLOOR;
use mosaic_core::types::Location;

/// Euclidean distance between two locations.
#[inline]
pub fn euclidean(a: &Location, b: &Location) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Gaussian kernel weight of a distance under the given radius.
#[inline]
pub fn gaussian_weight(distance: f64, radius: f64) -> f64 {
    (-(distance * distance) / (2.0 * radius * radius)).exp()
}

/// Distance beyond which the kernel weight falls under the fixed floor.
/// Contributions past this cutoff are skipped entirely.
pub fn gaussian_cutoff(radius: f64) -> f64 {
    radius * (-2.0 * KERNEL_WEIGHT_FLOOR.ln()).sqrt()
}

/// Dense symmetric pairwise distance matrix.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn build(locations: &[Location]) -> Self {
        let n = locations.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean(&locations[i], &locations[j]);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }
        Self { n, values }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Distances from location `i` to every location, including itself.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }
}
