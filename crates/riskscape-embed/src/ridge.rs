//! Ridge regression
//!
//! Minimizes `||y - Xw - b||² + alpha * ||w||²` with an unpenalized
//! intercept `b`. Inputs are centred, and the normal equations
//! `(XcᵀXc + alpha I) w = Xcᵀyc` are solved by conjugate gradient, stopping
//! once the residual norm falls below `tolerance * ||Xcᵀyc||` or the
//! iteration cap is hit.

use crate::error::{EmbedError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Configuration for ridge regression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeConfig {
    /// L2 penalty strength (default: 1.72)
    pub alpha: f64,
    /// Conjugate gradient iteration cap (default: 5000)
    pub max_iterations: usize,
    /// Relative residual tolerance (default: 1e-3)
    pub tolerance: f64,
    /// Whether to fit an unpenalized intercept (default: true)
    pub fit_intercept: bool,
}

impl Default for RidgeConfig {
    fn default() -> Self {
        Self {
            alpha: 1.72,
            max_iterations: 5000,
            tolerance: 1e-3,
            fit_intercept: true,
        }
    }
}

/// Fitted linear model
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeModel {
    /// Feature weights
    pub coefficients: Array1<f64>,
    /// Intercept (0 when not fitted)
    pub intercept: f64,
    /// Conjugate gradient iterations used
    pub iterations: usize,
    /// Whether the residual tolerance was reached
    pub converged: bool,
}

impl RidgeModel {
    /// Predict targets for `x`
    ///
    /// # Errors
    /// Returns [`EmbedError::DimensionMismatch`] when `x` has a different
    /// number of columns than the training features.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Ridge regression estimator
#[derive(Debug, Default, Clone)]
pub struct RidgeRegression {
    config: RidgeConfig,
}

impl RidgeRegression {
    /// Create an estimator
    pub const fn new(config: RidgeConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub const fn config(&self) -> &RidgeConfig {
        &self.config
    }

    /// Fit weights mapping rows of `x` to `y`
    ///
    /// # Errors
    /// Returns [`EmbedError::EmptyInput`] when `x` has no rows,
    /// [`EmbedError::DimensionMismatch`] when `y` does not have one target
    /// per row, and [`EmbedError::InvalidInput`] for a negative or
    /// non-finite penalty or non-finite data.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<RidgeModel> {
        let (n, p) = x.dim();
        if n == 0 {
            return Err(EmbedError::EmptyInput);
        }
        if y.len() != n {
            return Err(EmbedError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        let RidgeConfig {
            alpha,
            max_iterations,
            tolerance,
            fit_intercept,
        } = self.config;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(EmbedError::InvalidInput(format!(
                "alpha must be finite and non-negative, got {alpha}"
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(EmbedError::InvalidInput(
                "training data contains non-finite values".to_string(),
            ));
        }

        let (x_mean, y_mean) = if fit_intercept {
            (
                x.mean_axis(Axis(0)).ok_or(EmbedError::EmptyInput)?,
                y.mean().ok_or(EmbedError::EmptyInput)?,
            )
        } else {
            (Array1::zeros(p), 0.0)
        };
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        gram.diag_mut().mapv_inplace(|v| v + alpha);
        let rhs = xc.t().dot(&yc);

        let solution = conjugate_gradient(&gram, &rhs, max_iterations, tolerance);
        let intercept = if fit_intercept {
            y_mean - x_mean.dot(&solution.x)
        } else {
            0.0
        };

        tracing::debug!(
            rows = n,
            features = p,
            alpha,
            iterations = solution.iterations,
            converged = solution.converged,
            "fitted ridge regression"
        );
        if !solution.converged {
            tracing::warn!(max_iterations, "ridge solver hit the iteration cap");
        }

        Ok(RidgeModel {
            coefficients: solution.x,
            intercept,
            iterations: solution.iterations,
            converged: solution.converged,
        })
    }
}

struct Solution {
    x: Array1<f64>,
    iterations: usize,
    converged: bool,
}

/// Solve `a x = b` for symmetric positive semi-definite `a`
fn conjugate_gradient(
    a: &Array2<f64>,
    b: &Array1<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Solution {
    let mut x = Array1::<f64>::zeros(b.len());
    let mut residual = b.clone();
    let mut direction = residual.clone();
    let mut rs = residual.dot(&residual);
    let threshold = tolerance * rs.sqrt();

    let mut iterations = 0;
    let mut converged = rs.sqrt() <= threshold;
    while !converged && iterations < max_iterations {
        let ad = a.dot(&direction);
        let curvature = direction.dot(&ad);
        if curvature <= 0.0 {
            // Singular direction: nothing further to gain
            break;
        }
        let step = rs / curvature;
        x.scaled_add(step, &direction);
        residual.scaled_add(-step, &ad);
        iterations += 1;

        let rs_next = residual.dot(&residual);
        if rs_next.sqrt() <= threshold {
            converged = true;
            break;
        }
        direction = &residual + &(direction * (rs_next / rs));
        rs = rs_next;
    }

    Solution {
        x,
        iterations,
        converged,
    }
}
