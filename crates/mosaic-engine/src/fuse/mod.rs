//! Ridge meta-model over per-view out-of-fold predictions.

mod metrics;
mod ridge;

pub use metrics::{r_squared, rmse};

use mosaic_core::constants::NORMALIZATION_EPS;
use mosaic_core::errors::ModelError;
use mosaic_core::types::{FoldAssignment, ModelPerformance, ViewContribution, ViewModelOutput};

use ridge::ridge_fit;

/// Fused meta-model output: contribution weights plus cross-validated
/// performance of the combined model and the intrinsic-only baseline.
#[derive(Debug, Clone)]
pub struct FusedModel {
    pub contributions: Vec<ViewContribution>,
    pub combined: ModelPerformance,
    pub baseline: ModelPerformance,
}

/// Fuse per-view predictions under the shared fold assignment.
///
/// `outputs` is in canonical view order and `intrinsic_index` points at the
/// intrinsic view within it. Both the combined model (all views) and the
/// baseline (intrinsic column alone) are cross-validated with the same
/// folds, so their per-fold measures pair up for the significance test.
/// Contribution weights come from one fit over all rows, reported as
/// `|coefficient| / sum(|coefficients|)`; when every coefficient is zero the
/// mass is spread uniformly.
pub fn fuse_views(
    outputs: &[ViewModelOutput],
    intrinsic_index: usize,
    y: &[f64],
    folds: &FoldAssignment,
    lambda: f64,
) -> Result<FusedModel, ModelError> {
    let n = y.len();
    let v = outputs.len();

    let mut design = vec![0.0; n * v];
    for (j, output) in outputs.iter().enumerate() {
        for (i, &p) in output.predictions.iter().enumerate() {
            design[i * v + j] = p;
        }
    }
    let baseline_design = outputs[intrinsic_index].predictions.as_slice();

    let mut combined_pred = vec![0.0; n];
    let mut baseline_pred = vec![0.0; n];
    for (f, held) in folds.iter() {
        let train = folds.training(f);
        let combined_model = ridge_fit(&design, v, y, &train, lambda)?;
        let baseline_model = ridge_fit(baseline_design, 1, y, &train, lambda)?;
        for &i in held {
            combined_pred[i] = combined_model.predict_row(&design[i * v..(i + 1) * v]);
            baseline_pred[i] = baseline_model.predict_row(&baseline_design[i..i + 1]);
        }
    }

    let all: Vec<usize> = (0..n).collect();
    let full = ridge_fit(&design, v, y, &all, lambda)?;
    let contributions = outputs
        .iter()
        .zip(normalize_abs(&full.coefficients))
        .map(|(output, weight)| ViewContribution {
            view: output.view.clone(),
            weight,
        })
        .collect();

    Ok(FusedModel {
        contributions,
        combined: performance(y, &combined_pred, folds),
        baseline: performance(y, &baseline_pred, folds),
    })
}

fn performance(y: &[f64], predictions: &[f64], folds: &FoldAssignment) -> ModelPerformance {
    let all: Vec<usize> = (0..y.len()).collect();
    ModelPerformance {
        r2: r_squared(y, predictions, &all),
        rmse: rmse(y, predictions, &all),
        fold_r2: folds
            .iter()
            .map(|(_, held)| r_squared(y, predictions, held))
            .collect(),
        fold_rmse: folds
            .iter()
            .map(|(_, held)| rmse(y, predictions, held))
            .collect(),
    }
}

fn normalize_abs(coefficients: &[f64]) -> Vec<f64> {
    let total: f64 = coefficients.iter().map(|c| c.abs()).sum();
    if total <= NORMALIZATION_EPS {
        return vec![1.0 / coefficients.len() as f64; coefficients.len()];
    }
    coefficients.iter().map(|c| c.abs() / total).collect()
}
