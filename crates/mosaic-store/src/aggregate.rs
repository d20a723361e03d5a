//! Flat result tables and cross-run merging.
//!
//! Everything here is derived state, rebuildable from the cache at any
//! time. `SqliteStore::load_target_results` plus `from_results` rebuilds
//! the tables of a run; `merge` unions sets produced by different
//! processes over the same sample and view schema.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use mosaic_core::errors::MergeError;
use mosaic_core::types::{
    ContributionRow, FailureRow, ImportanceRow, PerformanceRow, ResultSchema, TargetResult,
};

/// Joinable result tables for one or more runs over a compatible schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResultSet {
    /// Schema shared by every aggregated result. None while empty.
    pub schema: Option<ResultSchema>,
    pub performance: Vec<PerformanceRow>,
    pub contributions: Vec<ContributionRow>,
    pub importances: Vec<ImportanceRow>,
    pub failures: Vec<FailureRow>,
}

impl AggregatedResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.performance.is_empty() && self.failures.is_empty()
    }

    /// Derive flat tables from fused target results plus the failures of
    /// the run that produced them. All results must share one schema; a
    /// failure for a target that also has a result is dropped.
    pub fn from_results(
        results: &[TargetResult],
        failures: &[FailureRow],
    ) -> Result<Self, MergeError> {
        let mut set = Self::new();
        for result in results {
            match &set.schema {
                None => set.schema = Some(result.schema.clone()),
                Some(schema) if *schema != result.schema => {
                    return Err(MergeError::SchemaMismatch {
                        detail: format!(
                            "target '{}' was produced under a different view schema",
                            result.target
                        ),
                    });
                }
                Some(_) => {}
            }
            set.push_result(result);
        }
        set.failures = failures.to_vec();
        set.drop_resolved_failures();
        set.sort_rows();
        Ok(set)
    }

    /// Merge another result set into this one.
    ///
    /// Schemas must match exactly. Overlapping keys take the incoming row;
    /// a failure never shadows a success in either direction.
    pub fn merge(&mut self, other: AggregatedResultSet) -> Result<(), MergeError> {
        if let (Some(ours), Some(theirs)) = (&self.schema, &other.schema) {
            if ours != theirs {
                return Err(MergeError::SchemaMismatch {
                    detail: schema_diff(ours, theirs),
                });
            }
        }
        if self.schema.is_none() {
            self.schema = other.schema;
        }

        let mut performance: FxHashMap<String, PerformanceRow> = self
            .performance
            .drain(..)
            .map(|row| (row.target.clone(), row))
            .collect();
        for row in other.performance {
            performance.insert(row.target.clone(), row);
        }
        self.performance = performance.into_values().collect();

        let mut contributions: FxHashMap<(String, String), ContributionRow> = self
            .contributions
            .drain(..)
            .map(|row| ((row.target.clone(), row.view.clone()), row))
            .collect();
        for row in other.contributions {
            contributions.insert((row.target.clone(), row.view.clone()), row);
        }
        self.contributions = contributions.into_values().collect();

        let mut importances: FxHashMap<(String, String, String), ImportanceRow> = self
            .importances
            .drain(..)
            .map(|row| {
                (
                    (row.target.clone(), row.view.clone(), row.feature.clone()),
                    row,
                )
            })
            .collect();
        for row in other.importances {
            importances.insert(
                (row.target.clone(), row.view.clone(), row.feature.clone()),
                row,
            );
        }
        self.importances = importances.into_values().collect();

        let mut failures: FxHashMap<String, FailureRow> = self
            .failures
            .drain(..)
            .map(|row| (row.target.clone(), row))
            .collect();
        for row in other.failures {
            failures.insert(row.target.clone(), row);
        }
        self.failures = failures.into_values().collect();

        self.drop_resolved_failures();
        self.sort_rows();
        Ok(())
    }

    fn push_result(&mut self, result: &TargetResult) {
        self.performance.push(PerformanceRow {
            target: result.target.clone(),
            r2_combined: result.combined.r2,
            r2_baseline: result.baseline.r2,
            r2_gain: result.r2_gain,
            rmse_combined: result.combined.rmse,
            rmse_baseline: result.baseline.rmse,
            rmse_reduction: result.rmse_reduction,
            p_r2: result.p_r2,
            p_rmse: result.p_rmse,
        });
        for contribution in &result.contributions {
            self.contributions.push(ContributionRow {
                target: result.target.clone(),
                view: contribution.view.clone(),
                weight: contribution.weight,
            });
        }
        for view in &result.importances {
            for feature in &view.features {
                self.importances.push(ImportanceRow {
                    target: result.target.clone(),
                    view: view.view.clone(),
                    feature: feature.feature.clone(),
                    score: feature.score,
                });
            }
        }
    }

    fn drop_resolved_failures(&mut self) {
        let succeeded: FxHashSet<String> = self
            .performance
            .iter()
            .map(|row| row.target.clone())
            .collect();
        self.failures.retain(|row| !succeeded.contains(&row.target));
    }

    fn sort_rows(&mut self) {
        self.performance.sort_by(|a, b| a.target.cmp(&b.target));
        self.contributions
            .sort_by(|a, b| (&a.target, &a.view).cmp(&(&b.target, &b.view)));
        self.importances.sort_by(|a, b| {
            (&a.target, &a.view, &a.feature).cmp(&(&b.target, &b.view, &b.feature))
        });
        self.failures.sort_by(|a, b| a.target.cmp(&b.target));
    }
}

fn schema_diff(ours: &ResultSchema, theirs: &ResultSchema) -> String {
    if ours.location_hash != theirs.location_hash {
        return format!(
            "location sets differ ({} vs {})",
            ours.location_hash, theirs.location_hash
        );
    }
    let our_views: Vec<&str> = ours.views.iter().map(|v| v.name.as_str()).collect();
    let their_views: Vec<&str> = theirs.views.iter().map(|v| v.name.as_str()).collect();
    if our_views != their_views {
        return format!("view sets differ ({our_views:?} vs {their_views:?})");
    }
    "view feature lists differ".to_string()
}
