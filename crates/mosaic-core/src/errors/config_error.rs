//! Configuration errors.
//!
//! Configuration problems are fatal at startup: no modeling work starts
//! until `RunConfig::validate` passes.

use super::error_code::{self, MosaicErrorCode};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Worker pool setup failed: {message}")]
    WorkerPool { message: String },
}

impl MosaicErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
