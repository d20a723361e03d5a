//! Fit quality measures over row subsets.

/// Coefficient of determination over `rows`.
///
/// A zero-variance response has no explainable variance; the convention
/// here is 0.0, never NaN.
pub fn r_squared(y: &[f64], predictions: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mean = rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64;
    let ss_tot: f64 = rows.iter().map(|&i| (y[i] - mean).powi(2)).sum();
    if ss_tot <= 1e-12 {
        return 0.0;
    }
    let ss_res: f64 = rows.iter().map(|&i| (y[i] - predictions[i]).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

/// Root mean squared error over `rows`.
pub fn rmse(y: &[f64], predictions: &[f64], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let ss: f64 = rows.iter().map(|&i| (y[i] - predictions[i]).powi(2)).sum();
    (ss / rows.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_one_and_zero() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let rows: Vec<usize> = (0..4).collect();
        assert_eq!(r_squared(&y, &y, &rows), 1.0);
        assert_eq!(rmse(&y, &y, &rows), 0.0);
    }

    #[test]
    fn mean_predictions_score_zero() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let mean = vec![2.5; 4];
        let rows: Vec<usize> = (0..4).collect();
        assert!(r_squared(&y, &mean, &rows).abs() < 1e-12);
    }

    #[test]
    fn constant_response_gives_zero_not_nan() {
        let y = vec![5.0; 6];
        let predictions = vec![4.0; 6];
        let rows: Vec<usize> = (0..6).collect();
        assert_eq!(r_squared(&y, &predictions, &rows), 0.0);
        assert_eq!(rmse(&y, &predictions, &rows), 1.0);
    }

    #[test]
    fn measures_respect_the_row_subset() {
        let y = vec![1.0, 2.0, 100.0];
        let predictions = vec![1.0, 2.0, 0.0];
        assert_eq!(r_squared(&y, &predictions, &[0, 1]), 1.0);
        assert_eq!(rmse(&y, &predictions, &[2]), 100.0);
    }
}
