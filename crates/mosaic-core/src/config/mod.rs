//! Configuration surface.

pub mod learner_config;
pub mod run_config;

pub use learner_config::{LearnerConfig, LearnerParams};
pub use run_config::RunConfig;
