//! Paired one-sided significance over per-fold performance measures.

use statrs::distribution::{ContinuousCDF, Normal};

use mosaic_core::constants::EXACT_SIGNED_RANK_LIMIT;
use mosaic_core::types::ModelPerformance;

/// One-sided p-values for "combined improves on baseline".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignificanceReport {
    pub p_r2: f64,
    pub p_rmse: f64,
}

/// Test the per-fold R² gain and RMSE reduction of `combined` over
/// `baseline`. Both performances must come from the same fold assignment so
/// the measures pair up.
pub fn compare_performance(
    baseline: &ModelPerformance,
    combined: &ModelPerformance,
) -> SignificanceReport {
    let r2_diffs: Vec<f64> = combined
        .fold_r2
        .iter()
        .zip(&baseline.fold_r2)
        .map(|(c, b)| c - b)
        .collect();
    let rmse_diffs: Vec<f64> = baseline
        .fold_rmse
        .iter()
        .zip(&combined.fold_rmse)
        .map(|(b, c)| b - c)
        .collect();

    SignificanceReport {
        p_r2: signed_rank_greater(&r2_diffs),
        p_rmse: signed_rank_greater(&rmse_diffs),
    }
}

/// One-sided Wilcoxon signed-rank p-value for "the differences are
/// positive".
///
/// Zero and non-finite differences are dropped; with nothing left the
/// p-value is 1. Up to [`EXACT_SIGNED_RANK_LIMIT`] retained differences the
/// null distribution is enumerated over all sign assignments; above that a
/// normal approximation with continuity correction is used, with the
/// variance computed from the midranks so ties are handled in both
/// branches. Deterministic, no resampling.
pub fn signed_rank_greater(diffs: &[f64]) -> f64 {
    let kept: Vec<f64> = diffs
        .iter()
        .copied()
        .filter(|d| d.is_finite() && d.abs() > 1e-12)
        .collect();
    let n = kept.len();
    if n == 0 {
        return 1.0;
    }

    let ranks = midranks(&kept);
    let w_plus: f64 = kept
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| *r)
        .sum();

    if n <= EXACT_SIGNED_RANK_LIMIT {
        exact_p(&ranks, w_plus)
    } else {
        approx_p(&ranks, w_plus, n)
    }
}

/// Average ranks of the absolute differences, 1-based, ties sharing their
/// midrank.
fn midranks(kept: &[f64]) -> Vec<f64> {
    let n = kept.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        kept[a]
            .abs()
            .partial_cmp(&kept[b].abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && (kept[order[j + 1]].abs() - kept[order[i]].abs()).abs() <= 1e-12 {
            j += 1;
        }
        let midrank = (i + j + 2) as f64 / 2.0;
        for &o in &order[i..=j] {
            ranks[o] = midrank;
        }
        i = j + 1;
    }
    ranks
}

/// Exact tail: the share of the `2^n` sign assignments whose rank sum
/// reaches the observed one.
fn exact_p(ranks: &[f64], w_plus: f64) -> f64 {
    let n = ranks.len();
    let total = 1u64 << n;
    let mut at_least = 0u64;
    for mask in 0..total {
        let mut w = 0.0;
        for (bit, r) in ranks.iter().enumerate() {
            if mask >> bit & 1 == 1 {
                w += *r;
            }
        }
        if w >= w_plus - 1e-9 {
            at_least += 1;
        }
    }
    at_least as f64 / total as f64
}

fn approx_p(ranks: &[f64], w_plus: f64, n: usize) -> f64 {
    let mean = (n * (n + 1)) as f64 / 4.0;
    let variance: f64 = ranks.iter().map(|r| r * r).sum::<f64>() / 4.0;
    if variance <= 0.0 {
        return 1.0;
    }
    let z = (w_plus - mean - 0.5) / variance.sqrt();
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (1.0 - normal.cdf(z)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
