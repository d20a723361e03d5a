//! Result cache interface.
//!
//! Persistence is behind an explicit trait: the pipeline only ever calls
//! `get` / `put` / `exists` and the typed `get_or_compute_*` helpers, so any
//! key-value backend works. `MemoryCache` ships for embedding and tests;
//! the SQLite-backed store lives in `mosaic-store`.

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::errors::{EngineError, StoreError};
use crate::fingerprint::Fingerprint;
use crate::types::{CachedResult, RunSummary, TargetResult, ViewModelOutput};

/// A content-addressed store of modeling results.
///
/// Implementations must be safe to share across worker threads. A corrupt
/// entry is a miss, not an error: `get` returns `Ok(None)` after discarding
/// it, and the caller recomputes.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: Fingerprint) -> Result<Option<CachedResult>, StoreError>;

    /// Atomic replace-or-create. Concurrent writers of the same key must
    /// never produce a torn entry; the last writer wins.
    fn put(&self, key: Fingerprint, value: &CachedResult) -> Result<(), StoreError>;

    fn exists(&self, key: Fingerprint) -> Result<bool, StoreError>;

    /// Record a finished run. Backends without run tracking ignore this.
    fn record_run(&self, _run_key: Fingerprint, _summary: &RunSummary) -> Result<(), StoreError> {
        Ok(())
    }

    /// Summary of a previously completed run, if the backend tracks runs.
    fn run_summary(&self, _run_key: Fingerprint) -> Result<Option<RunSummary>, StoreError> {
        Ok(None)
    }

    /// Fetch-or-compute for one key. The closure runs only on a miss; the
    /// result is persisted before returning. The returned flag is true on a
    /// cache hit.
    fn get_or_compute<F>(
        &self,
        key: Fingerprint,
        compute: F,
    ) -> Result<(CachedResult, bool), EngineError>
    where
        Self: Sized,
        F: FnOnce() -> Result<CachedResult, EngineError>,
    {
        if let Some(hit) = self.get(key)? {
            return Ok((hit, true));
        }
        let value = compute()?;
        self.put(key, &value)?;
        Ok((value, false))
    }

    /// Typed fetch-or-compute for per-view model outputs. An entry of the
    /// wrong kind under this key is treated as corruption: discarded,
    /// recomputed, and overwritten.
    fn get_or_compute_view<F>(
        &self,
        key: Fingerprint,
        compute: F,
    ) -> Result<(ViewModelOutput, bool), EngineError>
    where
        Self: Sized,
        F: FnOnce() -> Result<ViewModelOutput, EngineError>,
    {
        match self.get(key)? {
            Some(CachedResult::ViewModel(output)) => Ok((output, true)),
            Some(other) => {
                tracing::warn!(
                    key = %key,
                    kind = other.kind_str(),
                    "cache entry has wrong kind, recomputing"
                );
                let output = compute()?;
                self.put(key, &CachedResult::ViewModel(output.clone()))?;
                Ok((output, false))
            }
            None => {
                let output = compute()?;
                self.put(key, &CachedResult::ViewModel(output.clone()))?;
                Ok((output, false))
            }
        }
    }

    /// Typed fetch-or-compute for fused target results.
    fn get_or_compute_target<F>(
        &self,
        key: Fingerprint,
        compute: F,
    ) -> Result<(TargetResult, bool), EngineError>
    where
        Self: Sized,
        F: FnOnce() -> Result<TargetResult, EngineError>,
    {
        match self.get(key)? {
            Some(CachedResult::Target(result)) => Ok((result, true)),
            Some(other) => {
                tracing::warn!(
                    key = %key,
                    kind = other.kind_str(),
                    "cache entry has wrong kind, recomputing"
                );
                let result = compute()?;
                self.put(key, &CachedResult::Target(result.clone()))?;
                Ok((result, false))
            }
            None => {
                let result = compute()?;
                self.put(key, &CachedResult::Target(result.clone()))?;
                Ok((result, false))
            }
        }
    }
}

/// In-memory cache backed by a hash map.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<FxHashMap<Fingerprint, CachedResult>>,
    runs: Mutex<FxHashMap<Fingerprint, RunSummary>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: Fingerprint) -> Result<Option<CachedResult>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(&key).cloned())
    }

    fn put(&self, key: Fingerprint, value: &CachedResult) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key, value.clone());
        Ok(())
    }

    fn exists(&self, key: Fingerprint) -> Result<bool, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.contains_key(&key))
    }

    fn record_run(&self, run_key: Fingerprint, summary: &RunSummary) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().map_err(|_| StoreError::LockPoisoned)?;
        runs.insert(run_key, summary.clone());
        Ok(())
    }

    fn run_summary(&self, run_key: Fingerprint) -> Result<Option<RunSummary>, StoreError> {
        let runs = self.runs.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(runs.get(&run_key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn output(view: &str) -> ViewModelOutput {
        ViewModelOutput {
            view: view.into(),
            predictions: vec![1.0, 2.0],
            importances: vec![],
        }
    }

    #[test]
    fn put_get_exists_round_trip() {
        let cache = MemoryCache::new();
        let key = Fingerprint::from_u64(7);
        assert!(!cache.exists(key).unwrap());
        assert!(cache.get(key).unwrap().is_none());

        let value = CachedResult::ViewModel(output("intrinsic"));
        cache.put(key, &value).unwrap();
        assert!(cache.exists(key).unwrap());
        assert_eq!(cache.get(key).unwrap(), Some(value));
    }

    #[test]
    fn put_replaces_existing_entry() {
        let cache = MemoryCache::new();
        let key = Fingerprint::from_u64(7);
        cache
            .put(key, &CachedResult::ViewModel(output("a")))
            .unwrap();
        cache
            .put(key, &CachedResult::ViewModel(output("b")))
            .unwrap();
        match cache.get(key).unwrap() {
            Some(CachedResult::ViewModel(o)) => assert_eq!(o.view, "b"),
            other => panic!("unexpected entry {other:?}"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn get_or_compute_runs_the_closure_once() {
        let cache = MemoryCache::new();
        let key = Fingerprint::from_u64(1);
        let calls = AtomicUsize::new(0);

        for round in 0..3 {
            let (out, hit) = cache
                .get_or_compute_view(key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(output("intrinsic"))
                })
                .unwrap();
            assert_eq!(out.view, "intrinsic");
            assert_eq!(hit, round > 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wrong_kind_entry_is_recomputed_and_overwritten() {
        let cache = MemoryCache::new();
        let key = Fingerprint::from_u64(2);
        cache
            .put(key, &CachedResult::ViewModel(output("intrinsic")))
            .unwrap();

        let err = cache.get_or_compute_target(key, || {
            Err(EngineError::from(StoreError::CacheCorruption {
                key: key.to_hex(),
                reason: "forced".into(),
            }))
        });
        // The closure does run because the stored kind does not match.
        assert!(err.is_err());
    }

    #[test]
    fn run_summaries_round_trip() {
        let cache = MemoryCache::new();
        let run_key = Fingerprint::from_u64(9);
        assert!(cache.run_summary(run_key).unwrap().is_none());

        let summary = RunSummary {
            run_key: run_key.to_hex(),
            succeeded: vec!["f0".into()],
            failed: vec![],
            cache_hits: 0,
            computed: 1,
            cancelled: false,
            elapsed_ms: 12,
        };
        cache.record_run(run_key, &summary).unwrap();
        assert_eq!(cache.run_summary(run_key).unwrap(), Some(summary));
    }
}
