//! Deterministic k-fold assignment over location indices.

use crate::errors::ModelError;

/// A seeded partition of `0..n` into `k` disjoint, non-empty folds.
///
/// The shuffle is a fixed linear congruential generator, so the same
/// `(n, k, seed)` triple produces the same folds on every platform and in
/// every process.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldAssignment {
    folds: Vec<Vec<usize>>,
    membership: Vec<usize>,
    seed: u64,
}

impl FoldAssignment {
    pub fn new(n: usize, k: usize, seed: u64) -> Result<Self, ModelError> {
        if k < 2 || n < k {
            return Err(ModelError::InsufficientData {
                context: format!("fold assignment with k={k}"),
                available: n,
                required: k.max(2),
            });
        }

        let order = shuffled_indices(n, seed);
        let mut folds = vec![Vec::with_capacity(n / k + 1); k];
        for (pos, idx) in order.into_iter().enumerate() {
            folds[pos % k].push(idx);
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }

        let mut membership = vec![0usize; n];
        for (f, fold) in folds.iter().enumerate() {
            for &idx in fold {
                membership[idx] = f;
            }
        }

        Ok(Self {
            folds,
            membership,
            seed,
        })
    }

    pub fn k(&self) -> usize {
        self.folds.len()
    }

    pub fn n(&self) -> usize {
        self.membership.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fold index of location `i`.
    pub fn fold_of(&self, i: usize) -> usize {
        self.membership[i]
    }

    pub fn membership(&self) -> &[usize] {
        &self.membership
    }

    /// Held-out location indices of fold `f`, ascending.
    pub fn held_out(&self, f: usize) -> &[usize] {
        &self.folds[f]
    }

    /// Training complement of fold `f`, ascending.
    pub fn training(&self, f: usize) -> Vec<usize> {
        (0..self.n()).filter(|&i| self.membership[i] != f).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.folds.iter().enumerate().map(|(f, v)| (f, v.as_slice()))
    }
}

/// Fisher-Yates shuffle of `0..n` driven by a fixed LCG.
fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut state = seed.wrapping_add(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = (next() * (i + 1) as f64) as usize;
        indices.swap(i, j.min(i));
    }
    indices
}
