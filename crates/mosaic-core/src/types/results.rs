//! Result payloads and the flat rows derived from them.

use serde::{Deserialize, Serialize};

/// Importance score of one predictor feature within one view model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub score: f64,
}

/// Output of one per-view learner fit: out-of-fold predictions in location
/// order plus averaged importances. The trained trees never leave the
/// learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModelOutput {
    pub view: String,
    pub predictions: Vec<f64>,
    pub importances: Vec<FeatureImportance>,
}

/// Cross-validated performance of one model protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub r2: f64,
    pub rmse: f64,
    pub fold_r2: Vec<f64>,
    pub fold_rmse: Vec<f64>,
}

/// Contribution weight of one view in the fused meta-model.
/// Weights are normalized absolute coefficients and sum to 1 per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewContribution {
    pub view: String,
    pub weight: f64,
}

/// Importances of one view's predictors, carried inside a target result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewImportances {
    pub view: String,
    pub features: Vec<FeatureImportance>,
}

/// Schema descriptor persisted with every result so independently produced
/// result sets can be checked for compatibility before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSchema {
    /// Fingerprint of the ordered location ids and coordinates.
    pub location_hash: String,
    pub views: Vec<ViewSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSchema {
    pub name: String,
    pub features: Vec<String>,
}

/// Fully fused modeling result for one target feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: String,
    pub schema: ResultSchema,
    pub contributions: Vec<ViewContribution>,
    pub importances: Vec<ViewImportances>,
    pub combined: ModelPerformance,
    pub baseline: ModelPerformance,
    pub r2_gain: f64,
    pub rmse_reduction: f64,
    pub p_r2: f64,
    pub p_rmse: f64,
}

/// A value held in the result cache: either one view's model output or the
/// fused per-target result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachedResult {
    ViewModel(ViewModelOutput),
    Target(TargetResult),
}

impl CachedResult {
    /// Stable kind discriminator used by persistent backends.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::ViewModel(_) => "view_model",
            Self::Target(_) => "target",
        }
    }
}

// ---- Flat output rows ----

/// One performance row per target, joinable on `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub target: String,
    pub r2_combined: f64,
    pub r2_baseline: f64,
    pub r2_gain: f64,
    pub rmse_combined: f64,
    pub rmse_baseline: f64,
    pub rmse_reduction: f64,
    pub p_r2: f64,
    pub p_rmse: f64,
}

/// One contribution row per (target, view).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    pub target: String,
    pub view: String,
    pub weight: f64,
}

/// One importance row per (target, view, feature).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceRow {
    pub target: String,
    pub view: String,
    pub feature: String,
    pub score: f64,
}

/// One row per failed target, carrying the stable error code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRow {
    pub target: String,
    pub code: String,
    pub message: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_key: String,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailureRow>,
    pub cache_hits: usize,
    pub computed: usize,
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        !self.cancelled
    }
}
