//! Top-level engine error.

use super::config_error::ConfigError;
use super::error_code::MosaicErrorCode;
use super::merge_error::MergeError;
use super::model_error::ModelError;
use super::store_error::StoreError;
use super::view_error::ViewError;

/// Umbrella error used at the pipeline boundary and in run summaries.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether a single retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

impl MosaicErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::View(e) => e.error_code(),
            Self::Model(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Merge(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
