//! Parallel per-target modeling runs.
//!
//! Targets are independent: each one is fingerprinted, looked up in the
//! result cache, and computed only on a miss. A failure in one target is
//! recorded in the run summary and never aborts the others.

mod cancellation;

pub use cancellation::CancellationToken;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use mosaic_core::cache::ResultCache;
use mosaic_core::config::{LearnerParams, RunConfig};
use mosaic_core::errors::{ConfigError, EngineError, MosaicErrorCode, ViewError};
use mosaic_core::fingerprint::{
    fingerprint_locations, fingerprint_run, fingerprint_target, fingerprint_view_model,
};
use mosaic_core::types::{
    FailureRow, FeatureTable, FoldAssignment, ResultSchema, RunSummary, TargetResult,
    ViewCollection, ViewImportances, ViewSchema,
};

use crate::fuse::fuse_views;
use crate::learner::fit_view_model;
use crate::stats::compare_performance;
use crate::views::build_views;

/// Every feature of the sample as a modeling target, in table order.
pub fn all_targets(sample: &FeatureTable) -> Vec<String> {
    sample.features().to_vec()
}

/// A configured modeling pipeline with its own worker pool.
///
/// The pool is owned, never the global one, so embedding processes keep
/// their scheduler untouched and two pipelines with different worker counts
/// can coexist.
pub struct Pipeline {
    config: RunConfig,
    params: LearnerParams,
    pool: rayon::ThreadPool,
    cancellation: CancellationToken,
}

impl Pipeline {
    /// Validate the configuration and build the worker pool.
    pub fn new(config: RunConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let params = config.learner.resolve();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("mosaic-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::WorkerPool {
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            params,
            pool,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// A token that stops dispatch of further targets when cancelled.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Model every requested target of the sample.
    ///
    /// Fatal errors (bad geometry, unknown targets, too few locations for
    /// the fold count) abort before any per-target work. Per-target errors
    /// become [`FailureRow`]s in the summary; transient store errors are
    /// retried once first. The run marker is written only when no target
    /// was skipped by cancellation.
    pub fn run<C: ResultCache>(
        &self,
        cache: &C,
        sample: &FeatureTable,
        targets: &[String],
    ) -> Result<RunSummary, EngineError> {
        let started = Instant::now();

        for target in targets {
            if sample.feature_index(target).is_none() {
                return Err(ViewError::UnknownFeature {
                    feature: target.clone(),
                }
                .into());
            }
        }

        let collection = build_views(sample, &self.config.views)?;
        let folds = FoldAssignment::new(
            sample.n_locations(),
            self.config.effective_folds(),
            self.config.effective_seed(),
        )?;

        let seed = self.config.effective_seed();
        let lambda = self.config.effective_ridge_lambda();
        let run_key = fingerprint_run(&collection, targets, &folds, &self.params, lambda, seed);
        let schema = ResultSchema {
            location_hash: fingerprint_locations(collection.locations()).to_hex(),
            views: collection
                .views()
                .iter()
                .map(|v| ViewSchema {
                    name: v.name().to_string(),
                    features: v.features().to_vec(),
                })
                .collect(),
        };

        tracing::info!(
            run_key = %run_key,
            targets = targets.len(),
            views = collection.views().len(),
            folds = folds.k(),
            seed,
            "run started"
        );

        let hits = AtomicUsize::new(0);
        let computed = AtomicUsize::new(0);
        let ctx = TargetContext {
            collection: &collection,
            folds: &folds,
            schema: &schema,
            params: &self.params,
            lambda,
            seed,
        };

        let outcomes: Vec<Option<Result<TargetResult, FailureRow>>> = self.pool.install(|| {
            targets
                .par_iter()
                .map(|target| {
                    if self.cancellation.is_cancelled() {
                        return None;
                    }
                    Some(run_target(cache, &ctx, target, &hits, &computed))
                })
                .collect()
        });

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                None => cancelled = true,
                Some(Ok(result)) => succeeded.push(result.target),
                Some(Err(row)) => failed.push(row),
            }
        }

        let summary = RunSummary {
            run_key: run_key.to_hex(),
            succeeded,
            failed,
            cache_hits: hits.load(Ordering::Relaxed),
            computed: computed.load(Ordering::Relaxed),
            cancelled,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        if !cancelled {
            if let Err(e) = cache.record_run(run_key, &summary) {
                if e.is_transient() {
                    tracing::warn!(error = %e, "run marker write failed, retrying once");
                    cache.record_run(run_key, &summary)?;
                } else {
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            run_key = %run_key,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            cache_hits = summary.cache_hits,
            computed = summary.computed,
            cancelled = summary.cancelled,
            elapsed_ms = summary.elapsed_ms,
            "run finished"
        );
        Ok(summary)
    }
}

/// Shared per-run inputs threaded through the target tasks.
struct TargetContext<'a> {
    collection: &'a ViewCollection,
    folds: &'a FoldAssignment,
    schema: &'a ResultSchema,
    params: &'a LearnerParams,
    lambda: f64,
    seed: u64,
}

fn run_target<C: ResultCache>(
    cache: &C,
    ctx: &TargetContext<'_>,
    target: &str,
    hits: &AtomicUsize,
    computed: &AtomicUsize,
) -> Result<TargetResult, FailureRow> {
    let attempt = || -> Result<(TargetResult, bool), EngineError> {
        let key = fingerprint_target(
            ctx.collection,
            target,
            ctx.folds,
            ctx.params,
            ctx.lambda,
            ctx.seed,
        );
        cache.get_or_compute_target(key, || compute_target(cache, ctx, target, hits, computed))
    };

    let outcome = match attempt() {
        Err(e) if e.is_transient() => {
            tracing::warn!(target, error = %e, "transient failure, retrying once");
            attempt()
        }
        other => other,
    };

    match outcome {
        Ok((result, hit)) => {
            if hit {
                hits.fetch_add(1, Ordering::Relaxed);
            } else {
                computed.fetch_add(1, Ordering::Relaxed);
            }
            tracing::info!(target, cache_hit = hit, r2 = result.combined.r2, "target finished");
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(target, code = e.error_code(), error = %e, "target failed");
            Err(FailureRow {
                target: target.to_string(),
                code: e.error_code().to_string(),
                message: e.to_string(),
            })
        }
    }
}

fn compute_target<C: ResultCache>(
    cache: &C,
    ctx: &TargetContext<'_>,
    target: &str,
    hits: &AtomicUsize,
    computed: &AtomicUsize,
) -> Result<TargetResult, EngineError> {
    let collection = ctx.collection;
    let intrinsic = collection.intrinsic().ok_or_else(|| ViewError::EmptyView {
        view: "intrinsic".into(),
        reason: "collection has no intrinsic view".into(),
    })?;
    let target_idx = intrinsic
        .feature_index(target)
        .ok_or_else(|| ViewError::UnknownFeature {
            feature: target.to_string(),
        })?;
    let y = intrinsic.column(target_idx);

    let mut outputs = Vec::with_capacity(collection.views().len());
    let mut intrinsic_index = 0;
    for (j, view) in collection.views().iter().enumerate() {
        if view.kind().is_intrinsic() {
            intrinsic_index = j;
        }
        let key = fingerprint_view_model(
            view,
            collection.locations(),
            target,
            ctx.folds,
            ctx.params,
            ctx.seed,
        );
        let (output, hit) = cache.get_or_compute_view(key, || {
            fit_view_model(view, target, &y, ctx.folds, ctx.params, ctx.seed)
                .map_err(EngineError::from)
        })?;
        if hit {
            hits.fetch_add(1, Ordering::Relaxed);
        } else {
            computed.fetch_add(1, Ordering::Relaxed);
        }
        outputs.push(output);
    }

    let fused = fuse_views(&outputs, intrinsic_index, &y, ctx.folds, ctx.lambda)?;
    let significance = compare_performance(&fused.baseline, &fused.combined);
    let r2_gain = fused.combined.r2 - fused.baseline.r2;
    let rmse_reduction = fused.baseline.rmse - fused.combined.rmse;

    let importances = outputs
        .into_iter()
        .map(|o| ViewImportances {
            view: o.view,
            features: o.importances,
        })
        .collect();

    Ok(TargetResult {
        target: target.to_string(),
        schema: ctx.schema.clone(),
        contributions: fused.contributions,
        importances,
        combined: fused.combined,
        baseline: fused.baseline,
        r2_gain,
        rmse_reduction,
        p_r2: significance.p_r2,
        p_rmse: significance.p_rmse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::cache::MemoryCache;
    use mosaic_core::types::{Location, ViewKind};

    fn sample(n: usize) -> FeatureTable {
        let locations = (0..n)
            .map(|i| Location::new(format!("l{i}"), i as f64, 0.0))
            .collect();
        let mut values = Vec::with_capacity(n * 2);
        for i in 0..n {
            values.push(i as f64);
            values.push(2.0 * i as f64 + ((i * 3) % 5) as f64);
        }
        FeatureTable::new(locations, vec!["f0".into(), "f1".into()], values).unwrap()
    }

    fn config() -> RunConfig {
        RunConfig {
            views: vec![ViewKind::Intrinsic, ViewKind::DistanceWeighted { radius: 2.0 }],
            folds: Some(3),
            workers: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let bad = RunConfig {
            views: vec![ViewKind::Intrinsic, ViewKind::Intrinsic],
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(bad),
            Err(EngineError::Config(ConfigError::ValidationFailed { .. }))
        ));
    }

    #[test]
    fn unknown_target_aborts_the_run() {
        let pipeline = Pipeline::new(config()).unwrap();
        let cache = MemoryCache::new();
        let err = pipeline
            .run(&cache, &sample(12), &["missing".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::View(ViewError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn too_few_locations_for_the_folds_aborts_the_run() {
        let pipeline = Pipeline::new(RunConfig {
            folds: Some(10),
            ..config()
        })
        .unwrap();
        let cache = MemoryCache::new();
        let err = pipeline
            .run(&cache, &sample(4), &["f1".into()])
            .unwrap_err();
        assert!(matches!(err, EngineError::Model(_)));
    }

    #[test]
    fn pre_cancelled_run_dispatches_nothing() {
        let pipeline = Pipeline::new(config()).unwrap();
        pipeline.cancellation().cancel();
        let cache = MemoryCache::new();

        let summary = pipeline.run(&cache, &sample(12), &["f1".into()]).unwrap();
        assert!(summary.cancelled);
        assert!(summary.succeeded.is_empty());
        assert_eq!(summary.computed, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn all_targets_lists_the_features_in_order() {
        assert_eq!(all_targets(&sample(5)), vec!["f0", "f1"]);
    }
}
