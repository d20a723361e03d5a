//! Core data model: samples, views, folds, and result payloads.

pub mod folds;
pub mod results;
pub mod table;
pub mod view;

pub use folds::FoldAssignment;
pub use results::{
    CachedResult, ContributionRow, FailureRow, FeatureImportance, ImportanceRow,
    ModelPerformance, PerformanceRow, ResultSchema, RunSummary, TargetResult, ViewContribution,
    ViewImportances, ViewModelOutput, ViewSchema,
};
pub use table::{FeatureTable, Location};
pub use view::{View, ViewCollection, ViewKind};
