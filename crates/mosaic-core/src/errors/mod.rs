//! Error types for the mosaic engine, one enum per concern.

pub mod config_error;
pub mod engine_error;
pub mod error_code;
pub mod merge_error;
pub mod model_error;
pub mod store_error;
pub mod view_error;

pub use config_error::ConfigError;
pub use engine_error::EngineError;
pub use error_code::MosaicErrorCode;
pub use merge_error::MergeError;
pub use model_error::ModelError;
pub use store_error::StoreError;
pub use view_error::ViewError;
