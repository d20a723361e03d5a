//! Result aggregation and merge errors.

use super::error_code::{self, MosaicErrorCode};

/// Errors that can occur while aggregating or merging result sets.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Schema mismatch: {detail}")]
    SchemaMismatch { detail: String },
}

impl MosaicErrorCode for MergeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => error_code::SCHEMA_MISMATCH,
        }
    }
}
