//! SQLite persistence for the mosaic engine: the durable result cache,
//! run markers, and flat aggregated tables with cross-run merging.

pub mod aggregate;
pub mod connection;
pub mod migrations;
pub mod store;

pub use aggregate::AggregatedResultSet;
pub use store::SqliteStore;
