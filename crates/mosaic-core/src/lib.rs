//! Core types, traits, errors, config, fingerprints, and tracing for the
//! mosaic multi-view spatial modeling engine.

pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod fingerprint;
pub mod tracing;
pub mod types;

pub use cache::{MemoryCache, ResultCache};
pub use config::{LearnerConfig, LearnerParams, RunConfig};
pub use errors::{
    ConfigError, EngineError, MergeError, ModelError, MosaicErrorCode, StoreError, ViewError,
};
pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use types::{
    CachedResult, ContributionRow, FailureRow, FeatureImportance, FeatureTable, FoldAssignment,
    ImportanceRow, Location, ModelPerformance, PerformanceRow, ResultSchema, RunSummary,
    TargetResult, View, ViewCollection, ViewContribution, ViewImportances, ViewKind,
    ViewModelOutput, ViewSchema,
};
