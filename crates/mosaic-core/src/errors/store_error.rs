//! Result store errors.

use std::path::PathBuf;

use super::error_code::{self, MosaicErrorCode};

/// Errors that can occur in the result cache and its persistent backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Migration to v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Corrupt cache entry '{key}': {reason}")]
    CacheCorruption { key: String, reason: String },

    #[error("Serialization failed for cache entry '{key}': {message}")]
    Serialization { key: String, message: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether a single retry is worth attempting (busy database, transient IO).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Sqlite { .. } | Self::Io { .. })
    }
}

impl MosaicErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::CacheCorruption { .. } => error_code::CACHE_CORRUPTION,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
