//! Per-view learner configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MIN_LEAF, DEFAULT_TREES};

/// Configuration for the per-view tree ensembles.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LearnerConfig {
    /// Trees per ensemble. Default: 100.
    pub trees: Option<usize>,
    /// Candidate features per split. Default: ceil(p / 3), min 1.
    pub mtry: Option<usize>,
    /// Minimum samples in a leaf. Default: 2.
    pub min_leaf: Option<usize>,
    /// Maximum tree depth. Default: unlimited.
    pub max_depth: Option<usize>,
}

impl LearnerConfig {
    pub fn effective_trees(&self) -> usize {
        self.trees.unwrap_or(DEFAULT_TREES)
    }

    pub fn effective_min_leaf(&self) -> usize {
        self.min_leaf.unwrap_or(DEFAULT_MIN_LEAF)
    }

    /// Resolve into the concrete hyperparameters used (and fingerprinted).
    pub fn resolve(&self) -> LearnerParams {
        LearnerParams {
            trees: self.effective_trees(),
            mtry: self.mtry,
            min_leaf: self.effective_min_leaf(),
            max_depth: self.max_depth,
        }
    }
}

/// Fully resolved ensemble hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerParams {
    pub trees: usize,
    /// `None` defers to ceil(p / 3) once the predictor count is known.
    pub mtry: Option<usize>,
    pub min_leaf: usize,
    pub max_depth: Option<usize>,
}

impl LearnerParams {
    /// Candidate features per split for a view with `n_predictors` columns.
    pub fn effective_mtry(&self, n_predictors: usize) -> usize {
        let raw = self.mtry.unwrap_or_else(|| n_predictors.div_ceil(3));
        raw.clamp(1, n_predictors.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let params = LearnerConfig::default().resolve();
        assert_eq!(params.trees, DEFAULT_TREES);
        assert_eq!(params.min_leaf, DEFAULT_MIN_LEAF);
        assert_eq!(params.mtry, None);
        assert_eq!(params.max_depth, None);
    }

    #[test]
    fn mtry_defaults_to_third_of_predictors() {
        let params = LearnerConfig::default().resolve();
        assert_eq!(params.effective_mtry(9), 3);
        assert_eq!(params.effective_mtry(10), 4);
        assert_eq!(params.effective_mtry(1), 1);
        assert_eq!(params.effective_mtry(2), 1);
    }

    #[test]
    fn explicit_mtry_is_clamped_to_predictor_count() {
        let config = LearnerConfig {
            mtry: Some(50),
            ..Default::default()
        };
        assert_eq!(config.resolve().effective_mtry(4), 4);
    }
}
