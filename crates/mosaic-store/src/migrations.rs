//! Schema migrations using PRAGMA user_version.

use mosaic_core::errors::StoreError;
use rusqlite::Connection;

/// V001: result cache and run marker tables.
pub const V001_RESULT_TABLES: &str = r#"
-- Content-addressed result cache. One row per fingerprint key; the payload
-- is the serialized result and `kind` mirrors its discriminator so per-kind
-- scans never parse unrelated payloads.
CREATE TABLE IF NOT EXISTS result_cache (
    key TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    schema_version INTEGER NOT NULL,
    payload TEXT NOT NULL,
    created_ms INTEGER NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_result_cache_kind ON result_cache(kind);

-- Run markers. A row appears only once every target of the run has a
-- terminal outcome, so readers can tell finished runs from partial ones.
CREATE TABLE IF NOT EXISTS runs (
    run_key TEXT PRIMARY KEY,
    summary TEXT NOT NULL,
    completed_ms INTEGER NOT NULL
) STRICT;
"#;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StoreError::MigrationFailed {
            version: 0,
            message: e.to_string(),
        })?;

    let migrations: &[(&str, u32)] = &[(V001_RESULT_TABLES, 1)];

    for (sql, version) in migrations {
        if current < *version {
            conn.execute_batch(sql)
                .map_err(|e| StoreError::MigrationFailed {
                    version: *version,
                    message: e.to_string(),
                })?;
            conn.pragma_update(None, "user_version", version)
                .map_err(|e| StoreError::MigrationFailed {
                    version: *version,
                    message: e.to_string(),
                })?;
            tracing::info!(version, "applied migration");
        }
    }

    Ok(())
}

/// Current schema version (0 on a fresh database).
pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })
}
