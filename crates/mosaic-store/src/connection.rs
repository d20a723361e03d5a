//! Connection opening and pragma setup.

use std::path::Path;

use mosaic_core::errors::StoreError;
use rusqlite::Connection;

/// Pragmas applied to every connection before use.
///
/// WAL keeps readers unblocked while worker threads upsert results; the
/// busy timeout covers write contention when several processes share one
/// cache file.
const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA cache_size = -64000;
    PRAGMA temp_store = MEMORY;
    PRAGMA mmap_size = 268435456;
    PRAGMA busy_timeout = 5000;
";

/// Open a database file with the standard pragmas applied.
/// Migrations are the caller's responsibility.
pub fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|e| StoreError::Sqlite {
        message: e.to_string(),
    })?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Open an in-memory database with the standard pragmas applied.
pub fn open_in_memory_connection() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory().map_err(|e| StoreError::Sqlite {
        message: e.to_string(),
    })?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

/// Apply the standard pragma set to a connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(CONNECTION_PRAGMAS)
        .map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })
}
