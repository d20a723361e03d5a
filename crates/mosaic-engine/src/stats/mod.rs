//! Deterministic significance testing.

mod signed_rank;

pub use signed_rank::{compare_performance, signed_rank_greater, SignificanceReport};
