//! MosaicErrorCode trait and error code constants.

/// Trait giving every error enum a stable, machine-readable code string.
/// Run summaries and persisted failure rows carry these codes so callers
/// can branch without parsing messages.
pub trait MosaicErrorCode {
    /// Returns the error code string (e.g., "INVALID_GEOMETRY").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const INVALID_GEOMETRY: &str = "INVALID_GEOMETRY";
pub const EMPTY_VIEW: &str = "EMPTY_VIEW";
pub const UNKNOWN_FEATURE: &str = "UNKNOWN_FEATURE";
pub const VIEW_ERROR: &str = "VIEW_ERROR";
pub const INSUFFICIENT_DATA: &str = "INSUFFICIENT_DATA";
pub const MODEL_ERROR: &str = "MODEL_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const CACHE_CORRUPTION: &str = "CACHE_CORRUPTION";
pub const SCHEMA_MISMATCH: &str = "SCHEMA_MISMATCH";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CANCELLED: &str = "CANCELLED";
