//! Bagged tree ensembles with impurity-based feature importances.

use mosaic_core::config::LearnerParams;

use super::tree::{RegressionTree, TreeParams};
use crate::rng::{derive_seed, LcgRng};

/// A fitted ensemble over one predictor matrix.
///
/// Degenerate fits (no predictors, or a constant target over the training
/// rows) carry no trees and predict the training mean everywhere.
#[derive(Debug, Clone)]
pub(crate) struct Forest {
    trees: Vec<RegressionTree>,
    constant: Option<f64>,
    importance: Vec<f64>,
}

impl Forest {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if let Some(mean) = self.constant {
            return mean;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Normalized per-feature importance. Sums to 1 unless no split was
    /// ever made, in which case it is all zeros.
    pub fn importance(&self) -> &[f64] {
        &self.importance
    }

    #[cfg(test)]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Fit a bagged ensemble on `train_rows`.
///
/// Each tree draws its own bootstrap sample and split randomness from a seed
/// derived as `(base_seed, "tree", t)`, so the fit is reproducible and
/// independent of evaluation order.
pub(crate) fn fit_forest(
    data: &[f64],
    n_features: usize,
    targets: &[f64],
    train_rows: &[usize],
    params: &LearnerParams,
    base_seed: u64,
) -> Forest {
    let mean = if train_rows.is_empty() {
        0.0
    } else {
        train_rows.iter().map(|&i| targets[i]).sum::<f64>() / train_rows.len() as f64
    };
    let sse: f64 = train_rows.iter().map(|&i| (targets[i] - mean).powi(2)).sum();
    if n_features == 0 || train_rows.is_empty() || sse <= 1e-12 {
        return Forest {
            trees: Vec::new(),
            constant: Some(mean),
            importance: vec![0.0; n_features],
        };
    }

    let tree_params = TreeParams {
        mtry: params.effective_mtry(n_features),
        min_leaf: params.min_leaf,
        max_depth: params.max_depth,
    };

    let mut trees = Vec::with_capacity(params.trees);
    let mut importance = vec![0.0; n_features];
    let mut bag = Vec::with_capacity(train_rows.len());

    for t in 0..params.trees {
        let mut rng = LcgRng::new(derive_seed(base_seed, "tree", t as u64));
        rng.bootstrap(train_rows, &mut bag);
        let tree = RegressionTree::fit(data, n_features, targets, &bag, &tree_params, &mut rng);
        tree.add_importance(&mut importance);
        trees.push(tree);
    }

    let total: f64 = importance.iter().sum();
    if total > 0.0 {
        for v in &mut importance {
            *v /= total;
        }
    }

    Forest {
        trees,
        constant: None,
        importance,
    }
}
