//! Shared constants for the mosaic engine.

/// Mosaic version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 10;

/// Default run seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default number of worker threads (0 = auto-detect).
pub const DEFAULT_WORKERS: usize = 0;

/// Default number of trees per view ensemble.
pub const DEFAULT_TREES: usize = 100;

/// Default minimum samples in a tree leaf.
pub const DEFAULT_MIN_LEAF: usize = 2;

/// Default ridge penalty for the meta-model.
pub const DEFAULT_RIDGE_LAMBDA: f64 = 1.0;

/// Kernel weights below this floor are treated as zero when building
/// distance-weighted views.
pub const KERNEL_WEIGHT_FLOOR: f64 = 1e-6;

/// Minimum rows a fold-training complement must retain for model fitting.
pub const MIN_TRAIN_ROWS: usize = 3;

/// Largest fold count for which the signed-rank null distribution is
/// enumerated exactly; the normal approximation is used above it.
pub const EXACT_SIGNED_RANK_LIMIT: usize = 16;

/// Schema version stamped on every persisted result payload.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// Tolerance used when checking contribution normalization.
pub const NORMALIZATION_EPS: f64 = 1e-9;
