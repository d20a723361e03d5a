//! # mosaic-engine
//!
//! Modeling pipeline for spatially resolved samples: view construction →
//! per-view out-of-fold ensembles → ridge meta-model fusion → paired
//! significance → cached results, parallel per target.

pub mod fuse;
pub mod geometry;
pub mod learner;
pub mod pipeline;
pub mod rng;
pub mod stats;
pub mod views;

pub use fuse::{fuse_views, FusedModel};
pub use learner::{fit_view_model, PredictorMatrix};
pub use pipeline::{all_targets, CancellationToken, Pipeline};
pub use stats::{compare_performance, signed_rank_greater, SignificanceReport};
pub use views::build_views;
