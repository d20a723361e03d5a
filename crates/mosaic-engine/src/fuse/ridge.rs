//! Ridge regression on small view-level design matrices.

use mosaic_core::errors::ModelError;

/// A fitted ridge model. The intercept is never penalized: the design is
/// centered before solving and the intercept recovered from the means.
#[derive(Debug, Clone)]
pub(crate) struct RidgeModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgeModel {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coefficients)
                .map(|(x, b)| x * b)
                .sum::<f64>()
    }
}

/// Solve `(Xc'Xc + lambda I) b = Xc'yc` over the training `rows`.
///
/// `design` is flat row-major with `n_cols` columns. With `lambda > 0` the
/// system is positive definite even for collinear or constant columns.
pub(crate) fn ridge_fit(
    design: &[f64],
    n_cols: usize,
    y: &[f64],
    rows: &[usize],
    lambda: f64,
) -> Result<RidgeModel, ModelError> {
    let n = rows.len() as f64;
    let mut col_means = vec![0.0; n_cols];
    for &i in rows {
        for (m, &x) in col_means.iter_mut().zip(&design[i * n_cols..(i + 1) * n_cols]) {
            *m += x;
        }
    }
    for m in &mut col_means {
        *m /= n;
    }
    let y_mean = rows.iter().map(|&i| y[i]).sum::<f64>() / n;

    let mut gram = vec![0.0; n_cols * n_cols];
    let mut rhs = vec![0.0; n_cols];
    for &i in rows {
        let row = &design[i * n_cols..(i + 1) * n_cols];
        let yc = y[i] - y_mean;
        for a in 0..n_cols {
            let xa = row[a] - col_means[a];
            rhs[a] += xa * yc;
            for b in a..n_cols {
                gram[a * n_cols + b] += xa * (row[b] - col_means[b]);
            }
        }
    }
    for a in 0..n_cols {
        gram[a * n_cols + a] += lambda;
        for b in 0..a {
            gram[a * n_cols + b] = gram[b * n_cols + a];
        }
    }

    let coefficients = cholesky_solve(&gram, &rhs, n_cols).ok_or_else(|| {
        ModelError::SolveFailed {
            reason: format!("ridge system over {n_cols} views is not positive definite"),
        }
    })?;
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(&col_means)
            .map(|(b, m)| b * m)
            .sum::<f64>();

    Ok(RidgeModel {
        coefficients,
        intercept,
    })
}

/// Solve `A x = b` for symmetric positive definite `A` via an in-place
/// Cholesky factorization. `None` when a pivot collapses.
fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 1e-12 {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }
    // L' x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in i + 1..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_zero_penalty_recovers_a_linear_map() {
        // y = 2 * x0 + 1
        let n = 20;
        let design: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = design.iter().map(|x| 2.0 * x + 1.0).collect();
        let rows: Vec<usize> = (0..n).collect();

        let model = ridge_fit(&design, 1, &y, &rows, 1e-9).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((model.intercept - 1.0).abs() < 1e-4);
        assert!((model.predict_row(&[10.0]) - 21.0).abs() < 1e-4);
    }

    #[test]
    fn penalty_shrinks_coefficients_toward_zero() {
        let n = 20;
        let design: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = design.iter().map(|x| 2.0 * x).collect();
        let rows: Vec<usize> = (0..n).collect();

        let light = ridge_fit(&design, 1, &y, &rows, 1e-6).unwrap();
        let heavy = ridge_fit(&design, 1, &y, &rows, 1e5).unwrap();
        assert!(heavy.coefficients[0].abs() < light.coefficients[0].abs());
    }

    #[test]
    fn constant_column_survives_with_a_zero_coefficient() {
        // Column 1 is constant; centering zeroes it out and the penalty
        // keeps the system solvable.
        let n = 10;
        let mut design = Vec::with_capacity(n * 2);
        for i in 0..n {
            design.push(i as f64);
            design.push(3.0);
        }
        let y: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let rows: Vec<usize> = (0..n).collect();

        let model = ridge_fit(&design, 2, &y, &rows, 1.0).unwrap();
        assert!(model.coefficients[1].abs() < 1e-9);
    }

    #[test]
    fn duplicated_columns_share_the_weight() {
        let n = 12;
        let mut design = Vec::with_capacity(n * 2);
        for i in 0..n {
            design.push(i as f64);
            design.push(i as f64);
        }
        let y: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let rows: Vec<usize> = (0..n).collect();

        let model = ridge_fit(&design, 2, &y, &rows, 0.1).unwrap();
        assert!((model.coefficients[0] - model.coefficients[1]).abs() < 1e-9);
        assert!((model.predict_row(&[5.0, 5.0]) - 5.0).abs() < 0.1);
    }

    #[test]
    fn fit_uses_only_the_training_rows() {
        let n = 10;
        let design: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let mut y: Vec<f64> = design.clone();
        y[9] = 1000.0;
        let rows: Vec<usize> = (0..9).collect();

        let model = ridge_fit(&design, 1, &y, &rows, 1e-6).unwrap();
        assert!((model.predict_row(&[4.0]) - 4.0).abs() < 1e-3);
    }
}
