//! View construction over measured samples.

mod builder;

pub use builder::build_views;
