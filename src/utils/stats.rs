//! Statistical utility functions.

use std::cmp::Ordering;

/// Finite values of `values`, sorted ascending.
pub fn sort_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Quantile of an ascending slice using linear interpolation between order statistics.
///
/// Position `q * (n - 1)` is interpolated between its neighbouring values, the
/// same estimator numpy uses by default.
///
/// # Example
/// ```
/// use forecast_explorer::utils::stats::quantile_sorted;
///
/// let q = quantile_sorted(&[1.0, 2.0, 3.0, 4.0], 0.5);
/// assert!((q - 2.5).abs() < 1e-12);
/// ```
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Arithmetic mean; NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean of squared values; the residual variance of a zero-mean error sequence.
pub fn mean_square(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64
}
