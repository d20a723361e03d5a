//! Merge semantics across result sets from separate runs.

use mosaic_core::errors::MergeError;
use mosaic_core::types::{
    FailureRow, ModelPerformance, ResultSchema, TargetResult, ViewContribution, ViewSchema,
};
use mosaic_store::AggregatedResultSet;

fn schema() -> ResultSchema {
    ResultSchema {
        location_hash: "feed".into(),
        views: vec![
            ViewSchema {
                name: "intrinsic".into(),
                features: vec!["f0".into(), "f1".into(), "f2".into()],
            },
            ViewSchema {
                name: "neighbor_1".into(),
                features: vec!["f0".into(), "f1".into(), "f2".into()],
            },
        ],
    }
}

fn performance(r2: f64) -> ModelPerformance {
    ModelPerformance {
        r2,
        rmse: (1.0 - r2).max(0.0).sqrt(),
        fold_r2: vec![r2; 4],
        fold_rmse: vec![0.5; 4],
    }
}

fn result(target: &str, r2: f64, intrinsic_weight: f64) -> TargetResult {
    TargetResult {
        target: target.into(),
        schema: schema(),
        contributions: vec![
            ViewContribution {
                view: "intrinsic".into(),
                weight: intrinsic_weight,
            },
            ViewContribution {
                view: "neighbor_1".into(),
                weight: 1.0 - intrinsic_weight,
            },
        ],
        importances: vec![],
        combined: performance(r2),
        baseline: performance(r2 - 0.1),
        r2_gain: 0.1,
        rmse_reduction: 0.05,
        p_r2: 0.2,
        p_rmse: 0.3,
    }
}

fn failure(target: &str) -> FailureRow {
    FailureRow {
        target: target.into(),
        code: "INSUFFICIENT_DATA".into(),
        message: format!("target '{target}' has too few training rows"),
    }
}

#[test]
fn disjoint_sets_concatenate() {
    let mut left =
        AggregatedResultSet::from_results(&[result("f0", 0.8, 0.6), result("f1", 0.5, 0.4)], &[])
            .unwrap();
    let right = AggregatedResultSet::from_results(&[result("f2", 0.9, 0.7)], &[]).unwrap();

    left.merge(right).unwrap();

    assert_eq!(left.performance.len(), 3);
    assert_eq!(left.contributions.len(), 6);
    let targets: Vec<&str> = left.performance.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["f0", "f1", "f2"]);
}

#[test]
fn overlapping_target_takes_the_incoming_rows() {
    let mut left = AggregatedResultSet::from_results(&[result("f0", 0.5, 0.9)], &[]).unwrap();
    let right = AggregatedResultSet::from_results(&[result("f0", 0.8, 0.3)], &[]).unwrap();

    left.merge(right).unwrap();

    assert_eq!(left.performance.len(), 1);
    assert!((left.performance[0].r2_combined - 0.8).abs() < 1e-12);
    let intrinsic = left
        .contributions
        .iter()
        .find(|row| row.view == "intrinsic")
        .unwrap();
    assert!((intrinsic.weight - 0.3).abs() < 1e-12);
}

#[test]
fn incompatible_schemas_refuse_to_merge() {
    let mut left = AggregatedResultSet::from_results(&[result("f0", 0.8, 0.6)], &[]).unwrap();

    let mut odd = result("f1", 0.5, 0.5);
    odd.schema.views[1].name = "distance_2".into();
    odd.contributions[1].view = "distance_2".into();
    let right = AggregatedResultSet::from_results(&[odd], &[]).unwrap();

    let err = left.merge(right).unwrap_err();
    match err {
        MergeError::SchemaMismatch { detail } => {
            assert!(detail.contains("view sets differ"), "detail: {detail}")
        }
    }
    // The failed merge leaves the left set untouched.
    assert_eq!(left.performance.len(), 1);
}

#[test]
fn merging_into_an_empty_set_adopts_the_schema() {
    let mut empty = AggregatedResultSet::new();
    assert!(empty.is_empty());

    let right = AggregatedResultSet::from_results(&[result("f0", 0.8, 0.6)], &[]).unwrap();
    empty.merge(right).unwrap();

    assert_eq!(empty.schema, Some(schema()));
    assert!(!empty.is_empty());
}

#[test]
fn success_clears_an_earlier_failure() {
    let mut left = AggregatedResultSet::from_results(&[], &[failure("f1")]).unwrap();
    assert_eq!(left.failures.len(), 1);

    // A later run computed f1 and failed on f2.
    let right =
        AggregatedResultSet::from_results(&[result("f1", 0.6, 0.5)], &[failure("f2")]).unwrap();
    left.merge(right).unwrap();

    assert_eq!(left.performance.len(), 1);
    assert_eq!(left.failures.len(), 1);
    assert_eq!(left.failures[0].target, "f2");
}

#[test]
fn incoming_failure_never_shadows_an_existing_success() {
    let mut left = AggregatedResultSet::from_results(&[result("f0", 0.8, 0.6)], &[]).unwrap();
    let right = AggregatedResultSet::from_results(&[], &[failure("f0")]).unwrap();

    left.merge(right).unwrap();

    assert_eq!(left.performance.len(), 1);
    assert!(left.failures.is_empty());
}
