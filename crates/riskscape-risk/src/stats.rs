//! Sample moments used by the risk estimator.
//!
//! Variance and covariance share one online co-moment routine, so that
//! `variance(x) == covariance(x, x)` holds bit for bit and a constant series
//! has a variance of exactly zero.

use ndarray::{ArrayView1, Zip};

/// Sample covariance (divisor n - 1).
///
/// Returns 0.0 with fewer than two observations. Both inputs must have the
/// same length.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len(), "covariance inputs differ in length");

    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    let x = ArrayView1::from(&x[..n]);
    let y = ArrayView1::from(&y[..n]);

    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut co_moment = 0.0;
    let mut count = 0.0;

    // Welford-style update: C_k = C_{k-1} + (x_k - mean_x_{k-1}) * (y_k - mean_y_k)
    Zip::from(&x).and(&y).for_each(|&xi, &yi| {
        count += 1.0;
        let dx = xi - mean_x;
        mean_x += dx / count;
        mean_y += (yi - mean_y) / count;
        co_moment += dx * (yi - mean_y);
    });

    co_moment / (count - 1.0)
}

/// Sample variance (divisor n - 1); 0.0 with fewer than two observations.
pub fn sample_variance(x: &[f64]) -> f64 {
    sample_covariance(x, x).max(0.0)
}

/// Sample standard deviation (divisor n - 1); 0.0 with fewer than two observations.
pub fn sample_std(x: &[f64]) -> f64 {
    sample_variance(x).sqrt()
}
