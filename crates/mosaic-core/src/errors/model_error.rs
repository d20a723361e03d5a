//! Model fitting errors.

use super::error_code::{self, MosaicErrorCode};

/// Errors that can occur while fitting per-view or meta models.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error(
        "Insufficient data for '{context}': {available} rows available, {required} required"
    )]
    InsufficientData {
        context: String,
        available: usize,
        required: usize,
    },

    #[error("Meta-model solve failed: {reason}")]
    SolveFailed { reason: String },
}

impl MosaicErrorCode for ModelError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => error_code::INSUFFICIENT_DATA,
            Self::SolveFailed { .. } => error_code::MODEL_ERROR,
        }
    }
}
