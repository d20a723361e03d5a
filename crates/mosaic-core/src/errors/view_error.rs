//! View construction errors.

use super::error_code::{self, MosaicErrorCode};

/// Errors that can occur while validating geometry or building views.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("View '{view}' is empty: {reason}")]
    EmptyView { view: String, reason: String },

    #[error("Unknown feature '{feature}'")]
    UnknownFeature { feature: String },

    #[error("Duplicate view name '{view}'")]
    DuplicateView { view: String },

    #[error("View '{view}' shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        view: String,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite value for feature '{feature}' at location index {location}")]
    NonFiniteValue { feature: String, location: usize },
}

impl MosaicErrorCode for ViewError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidGeometry { .. } => error_code::INVALID_GEOMETRY,
            Self::EmptyView { .. } => error_code::EMPTY_VIEW,
            Self::UnknownFeature { .. } => error_code::UNKNOWN_FEATURE,
            _ => error_code::VIEW_ERROR,
        }
    }
}
