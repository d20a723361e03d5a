//! Seeded pseudo-random streams for reproducible model fitting.
//!
//! Every random choice in the engine flows from the run seed through
//! [`derive_seed`], so results do not depend on thread scheduling.

use xxhash_rust::xxh3::Xxh3;

/// Linear congruential generator with fixed multiplier and increment.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `0..n`.
    pub fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        for i in (1..values.len()).rev() {
            let j = self.below(i + 1);
            values.swap(i, j);
        }
    }

    /// Bootstrap draw: `rows.len()` indices from `rows`, with replacement.
    pub fn bootstrap(&mut self, rows: &[usize], out: &mut Vec<usize>) {
        out.clear();
        for _ in 0..rows.len() {
            out.push(rows[self.below(rows.len())]);
        }
    }

    /// A random subset of `m` distinct features out of `p`.
    pub fn feature_subset(&mut self, p: usize, m: usize) -> Vec<usize> {
        let mut features: Vec<usize> = (0..p).collect();
        let m = m.min(p);
        // Partial Fisher-Yates: only the first m slots need settling.
        for i in 0..m {
            let j = i + self.below(p - i);
            features.swap(i, j);
        }
        features.truncate(m);
        features
    }
}

/// Stable substream seed for `(root, label, index)`.
///
/// Pure function of its inputs: the same triple gives the same seed in every
/// process, which keeps per-tree randomness independent of scheduling.
pub fn derive_seed(root: u64, label: &str, index: u64) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(&root.to_le_bytes());
    hasher.update(&(label.len() as u64).to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(&index.to_le_bytes());
    hasher.digest()
}
