//! Per-view ensemble fitting with out-of-fold predictions.

mod forest;
mod tree;

use mosaic_core::config::LearnerParams;
use mosaic_core::constants::MIN_TRAIN_ROWS;
use mosaic_core::errors::ModelError;
use mosaic_core::types::{FeatureImportance, FoldAssignment, View, ViewModelOutput};

use crate::rng::derive_seed;
use forest::fit_forest;

/// Flat row-major predictor matrix derived from one view.
///
/// When the view is the measured sample itself, the target column is
/// dropped so the model never sees the value it predicts. Context views
/// keep every column: their signal for a feature comes from surrounding
/// locations, not the location being predicted.
#[derive(Debug, Clone)]
pub struct PredictorMatrix {
    values: Vec<f64>,
    n_rows: usize,
    feature_names: Vec<String>,
}

impl PredictorMatrix {
    pub fn from_view(view: &View, exclude: Option<usize>) -> Self {
        let n = view.n_locations();
        match exclude {
            None => Self {
                values: view.values().to_vec(),
                n_rows: n,
                feature_names: view.features().to_vec(),
            },
            Some(skip) => {
                let p = view.n_features();
                let mut values = Vec::with_capacity(n * p.saturating_sub(1));
                for i in 0..n {
                    for (j, &v) in view.row(i).iter().enumerate() {
                        if j != skip {
                            values.push(v);
                        }
                    }
                }
                let feature_names = view
                    .features()
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != skip)
                    .map(|(_, f)| f.clone())
                    .collect();
                Self {
                    values,
                    n_rows: n,
                    feature_names,
                }
            }
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.feature_names.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let p = self.n_cols();
        &self.values[i * p..(i + 1) * p]
    }
}

/// Fit one view's ensemble under the shared fold assignment.
///
/// Every location receives a prediction from the fold-model that never
/// trained on it, and importances are averaged over the `k` fold-models.
/// Randomness is derived from `(seed, "target/view", fold)`, so adding or
/// removing other targets or views leaves this fit unchanged.
pub fn fit_view_model(
    view: &View,
    target: &str,
    y: &[f64],
    folds: &FoldAssignment,
    params: &LearnerParams,
    seed: u64,
) -> Result<ViewModelOutput, ModelError> {
    let exclude = if view.kind().is_intrinsic() {
        view.feature_index(target)
    } else {
        None
    };
    let matrix = PredictorMatrix::from_view(view, exclude);

    for (f, held) in folds.iter() {
        let available = folds.n() - held.len();
        if available < MIN_TRAIN_ROWS {
            return Err(ModelError::InsufficientData {
                context: format!("view '{}', fold {f}", view.name()),
                available,
                required: MIN_TRAIN_ROWS,
            });
        }
    }

    let label = format!("{target}/{}", view.name());
    let mut predictions = vec![0.0; folds.n()];
    let mut importance_sum = vec![0.0; matrix.n_cols()];

    for (f, held) in folds.iter() {
        let train = folds.training(f);
        let fold_seed = derive_seed(seed, &label, f as u64);
        let forest = fit_forest(
            matrix.values(),
            matrix.n_cols(),
            y,
            &train,
            params,
            fold_seed,
        );
        for &i in held {
            predictions[i] = forest.predict_row(matrix.row(i));
        }
        for (acc, v) in importance_sum.iter_mut().zip(forest.importance()) {
            *acc += v;
        }
    }

    let k = folds.k() as f64;
    let importances = matrix
        .feature_names()
        .iter()
        .zip(&importance_sum)
        .map(|(feature, &sum)| FeatureImportance {
            feature: feature.clone(),
            score: sum / k,
        })
        .collect();

    Ok(ViewModelOutput {
        view: view.name().to_string(),
        predictions,
        importances,
    })
}
