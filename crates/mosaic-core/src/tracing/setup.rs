//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the mosaic tracing/logging system.
///
/// Reads the `MOSAIC_LOG` environment variable for per-subsystem log levels.
/// Format: `MOSAIC_LOG=mosaic_engine=debug,mosaic_store=warn`
///
/// Falls back to `mosaic=info` if `MOSAIC_LOG` is not set or is invalid.
///
/// Idempotent: calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("MOSAIC_LOG")
            .unwrap_or_else(|_| EnvFilter::new("mosaic=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
