//! SQLite-backed result store.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use mosaic_core::cache::ResultCache;
use mosaic_core::constants::PAYLOAD_SCHEMA_VERSION;
use mosaic_core::errors::StoreError;
use mosaic_core::fingerprint::Fingerprint;
use mosaic_core::types::{CachedResult, RunSummary, TargetResult};

use crate::connection;
use crate::migrations;

/// Persistent result cache on a single SQLite database.
///
/// All access goes through one serialized connection, so worker threads
/// contend on the mutex instead of on SQLITE_BUSY. Cross-process sharing
/// relies on WAL plus the busy timeout; first-open migration is serialized
/// with an advisory file lock next to the database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a store at the given path, creating and migrating as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let lock_path = init_lock_path(path);
        let lock_file = File::create(&lock_path).map_err(|e| StoreError::Io {
            path: lock_path.clone(),
            message: e.to_string(),
        })?;
        let mut init_lock = fd_lock::RwLock::new(lock_file);
        let guard = init_lock.write().map_err(|e| StoreError::Io {
            path: lock_path.clone(),
            message: e.to_string(),
        })?;

        let conn = connection::open_connection(path)?;
        migrations::run_migrations(&conn)?;
        drop(guard);

        tracing::info!(path = %path.display(), "result store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory store (for embedding and tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = connection::open_in_memory_connection()?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of cached entries of any kind.
    pub fn entry_count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM result_cache", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(|e| StoreError::Sqlite {
                message: e.to_string(),
            })
        })
    }

    /// All fused target results at the current payload version, ordered by
    /// key. Corrupt rows are skipped with a warning, never an error.
    pub fn load_target_results(&self) -> Result<Vec<TargetResult>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT key, payload FROM result_cache
                     WHERE kind = 'target' AND schema_version = ?1
                     ORDER BY key",
                )
                .map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })?;
            let rows = stmt
                .query_map(params![PAYLOAD_SCHEMA_VERSION], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })?;

            let mut results = Vec::new();
            for row in rows {
                let (key, payload) = row.map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })?;
                match serde_json::from_str::<CachedResult>(&payload) {
                    Ok(CachedResult::Target(result)) => results.push(result),
                    Ok(other) => {
                        tracing::warn!(
                            key = %key,
                            kind = other.kind_str(),
                            "kind column disagrees with payload, skipping"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "corrupt cache entry, skipping");
                    }
                }
            }
            Ok(results)
        })
    }

    /// Truncate the WAL into the main database file.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&guard)
    }

    fn delete_entry(conn: &Connection, key: &str) -> Result<(), StoreError> {
        conn.execute("DELETE FROM result_cache WHERE key = ?1", params![key])
            .map_err(|e| StoreError::Sqlite {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

impl ResultCache for SqliteStore {
    fn get(&self, key: Fingerprint) -> Result<Option<CachedResult>, StoreError> {
        let hex = key.to_hex();
        self.with_conn(|conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT schema_version, payload FROM result_cache WHERE key = ?1",
                    params![hex],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })?;

            let Some((schema_version, payload)) = row else {
                return Ok(None);
            };

            if schema_version != i64::from(PAYLOAD_SCHEMA_VERSION) {
                tracing::warn!(
                    key = %hex,
                    found = schema_version,
                    expected = PAYLOAD_SCHEMA_VERSION,
                    "cache entry has a stale payload version, discarding"
                );
                Self::delete_entry(conn, &hex)?;
                return Ok(None);
            }

            match serde_json::from_str::<CachedResult>(&payload) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(key = %hex, error = %e, "corrupt cache entry, discarding");
                    Self::delete_entry(conn, &hex)?;
                    Ok(None)
                }
            }
        })
    }

    fn put(&self, key: Fingerprint, value: &CachedResult) -> Result<(), StoreError> {
        let payload = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
            key: key.to_hex(),
            message: e.to_string(),
        })?;
        let mut guard = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError::Sqlite {
                message: e.to_string(),
            })?;
        tx.execute(
            "INSERT INTO result_cache (key, kind, schema_version, payload, created_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
               kind = excluded.kind,
               schema_version = excluded.schema_version,
               payload = excluded.payload,
               created_ms = excluded.created_ms",
            params![
                key.to_hex(),
                value.kind_str(),
                PAYLOAD_SCHEMA_VERSION,
                payload,
                now_ms(),
            ],
        )
        .map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;
        tx.commit().map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn exists(&self, key: Fingerprint) -> Result<bool, StoreError> {
        let hex = key.to_hex();
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT 1 FROM result_cache WHERE key = ?1",
                params![hex],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(|e| StoreError::Sqlite {
                message: e.to_string(),
            })
        })
    }

    fn record_run(&self, run_key: Fingerprint, summary: &RunSummary) -> Result<(), StoreError> {
        let payload = serde_json::to_string(summary).map_err(|e| StoreError::Serialization {
            key: run_key.to_hex(),
            message: e.to_string(),
        })?;
        let mut guard = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StoreError::Sqlite {
                message: e.to_string(),
            })?;
        tx.execute(
            "INSERT INTO runs (run_key, summary, completed_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(run_key) DO UPDATE SET
               summary = excluded.summary,
               completed_ms = excluded.completed_ms",
            params![run_key.to_hex(), payload, now_ms()],
        )
        .map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;
        tx.commit().map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn run_summary(&self, run_key: Fingerprint) -> Result<Option<RunSummary>, StoreError> {
        let hex = run_key.to_hex();
        self.with_conn(|conn| {
            let payload: Option<String> = conn
                .query_row(
                    "SELECT summary FROM runs WHERE run_key = ?1",
                    params![hex],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| StoreError::Sqlite {
                    message: e.to_string(),
                })?;

            let Some(payload) = payload else {
                return Ok(None);
            };

            match serde_json::from_str::<RunSummary>(&payload) {
                Ok(summary) => Ok(Some(summary)),
                Err(e) => {
                    tracing::warn!(run_key = %hex, error = %e, "corrupt run marker, discarding");
                    conn.execute("DELETE FROM runs WHERE run_key = ?1", params![hex])
                        .map_err(|e| StoreError::Sqlite {
                            message: e.to_string(),
                        })?;
                    Ok(None)
                }
            }
        })
    }
}

fn init_lock_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".init.lock");
    PathBuf::from(os)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
