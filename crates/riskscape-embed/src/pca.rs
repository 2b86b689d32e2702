//! Principal component analysis
//!
//! Rows are centred, the sample covariance (divisor `max(N - 1, 1)`) is
//! eigendecomposed, and rows are projected onto the leading eigenvectors.
//! Each component's sign is fixed so that its largest-magnitude loading is
//! positive, which makes the projection reproducible across runs.

use crate::error::{EmbedError, Result};
use crate::linalg::{DEFAULT_TOLERANCE, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// A point in the 2-D embedding
///
/// Only relative geometry is meaningful; axes have no units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    /// First principal coordinate
    pub x: f64,
    /// Second principal coordinate
    pub y: f64,
}

impl ProjectedPoint {
    /// Create a point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Read the first two columns of a projection, padding with zeros
    pub fn from_projection(projection: &Array2<f64>) -> Vec<Self> {
        projection
            .rows()
            .into_iter()
            .map(|row| {
                Self::new(
                    row.get(0).copied().unwrap_or(0.0),
                    row.get(1).copied().unwrap_or(0.0),
                )
            })
            .collect()
    }
}

/// Fitted principal components
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Array1<f64>,
    /// One component per row
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    total_variance: f64,
}

impl Pca {
    /// Fit `n_components` principal components of `x`
    ///
    /// # Errors
    /// Returns [`EmbedError::EmptyInput`] when `x` has no rows and
    /// [`EmbedError::InvalidInput`] when `n_components` is zero, exceeds the
    /// number of columns, or `x` contains non-finite values.
    pub fn fit(x: &Array2<f64>, n_components: usize) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(EmbedError::EmptyInput);
        }
        if n_components == 0 || n_components > n_features {
            return Err(EmbedError::InvalidInput(format!(
                "n_components must be in 1..={n_features}, got {n_components}"
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::InvalidInput(
                "features contain non-finite values".to_string(),
            ));
        }

        let mean = x.mean_axis(Axis(0)).ok_or(EmbedError::EmptyInput)?;
        let centred = x - &mean;
        let divisor = n_rows.saturating_sub(1).max(1) as f64;
        let covariance = centred.t().dot(&centred) / divisor;

        let eigen = SymmetricEigen::decompose(&covariance, DEFAULT_TOLERANCE)?;

        let mut components = Array2::<f64>::zeros((n_components, n_features));
        for (mut component, vector) in components
            .rows_mut()
            .into_iter()
            .zip(eigen.vectors.columns())
        {
            component.assign(&vector);
            let pivot = component
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                component.mapv_inplace(|v| -v);
            }
        }

        let explained_variance = eigen
            .values
            .iter()
            .take(n_components)
            .map(|&v| v.max(0.0))
            .collect();
        let total_variance = covariance.diag().sum();

        tracing::debug!(n_rows, n_features, n_components, total_variance, "fitted pca");

        Ok(Self {
            mean,
            components,
            explained_variance,
            total_variance,
        })
    }

    /// Fit and project the same rows
    pub fn fit_transform(x: &Array2<f64>, n_components: usize) -> Result<(Self, Array2<f64>)> {
        let pca = Self::fit(x, n_components)?;
        let projection = pca.transform(x)?;
        Ok((pca, projection))
    }

    /// Project rows onto the fitted components
    ///
    /// # Errors
    /// Returns [`EmbedError::DimensionMismatch`] when `x` has a different
    /// number of columns than the fitted data.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean).dot(&self.components.t()))
    }

    /// Number of fitted components
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Column means of the fitted data
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Components as rows of unit loadings
    pub const fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// Variance captured by each component
    pub const fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    /// Share of total variance captured by each component (zeros when the
    /// data has no variance)
    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        if self.total_variance > 0.0 {
            &self.explained_variance / self.total_variance
        } else {
            Array1::zeros(self.explained_variance.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_points_on_a_line() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0]];
        let (pca, projection) = Pca::fit_transform(&x, 2).unwrap();

        // All variance on the first axis
        assert_relative_eq!(pca.explained_variance_ratio()[0], 1.0, epsilon = 1e-12);
        for &y in projection.column(1) {
            assert_relative_eq!(y, 0.0, epsilon = 1e-12);
        }
        // Ordering along the line is preserved with a positive loading
        assert!(projection[[0, 0]] < projection[[3, 0]]);
        assert!(pca.components().row(0).iter().all(|&l| l > 0.0));
    }

    #[test]
    fn test_small_spread_points_on_a_line() {
        let x = Array2::from_shape_fn((5, 2), |(i, j)| {
            let base = if j == 0 { 0.01 } else { 1.0 };
            base + 1e-7 * i as f64
        });
        let (pca, projection) = Pca::fit_transform(&x, 2).unwrap();

        let spread = projection.column(0).iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(spread > 1e-7);
        for &y in projection.column(1) {
            assert!(y.abs() < 1e-6 * spread, "y = {y} vs spread {spread}");
        }
        assert!(pca.explained_variance_ratio()[0] > 0.999_999);
    }

    #[test]
    fn test_projection_is_centred() {
        let x = array![[0.02, 1.1], [0.03, 0.8], [0.015, 1.3], [0.05, 0.2], [0.01, 0.9]];
        let (_, projection) = Pca::fit_transform(&x, 2).unwrap();

        for column in projection.columns() {
            assert_relative_eq!(column.sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_components_are_orthonormal_with_positive_pivot() {
        let x = array![[2.5, 2.4], [0.5, 0.7], [2.2, 2.9], [1.9, 2.2], [3.1, 3.0], [2.3, 2.7]];
        let pca = Pca::fit(&x, 2).unwrap();
        let c = pca.components();

        assert_relative_eq!(c.row(0).dot(&c.row(0)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.row(1).dot(&c.row(1)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.row(0).dot(&c.row(1)), 0.0, epsilon = 1e-12);

        for row in c.rows() {
            let pivot = row.iter().copied().fold(0.0_f64, |b, v| if v.abs() > b.abs() { v } else { b });
            assert!(pivot > 0.0);
        }
        assert!(pca.explained_variance()[0] >= pca.explained_variance()[1]);
    }

    #[test]
    fn test_single_row_projects_to_origin() {
        let (pca, projection) = Pca::fit_transform(&array![[0.02, 1.1]], 2).unwrap();
        assert_eq!(projection.dim(), (1, 2));
        assert!(projection.iter().all(|&v| v == 0.0));
        assert!(pca.explained_variance_ratio().iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_deterministic() {
        let x = array![[0.02, 1.1], [0.03, 0.8], [0.015, 1.3], [0.05, 0.2]];
        let (_, a) = Pca::fit_transform(&x, 2).unwrap();
        let (_, b) = Pca::fit_transform(&x, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_arguments() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(Pca::fit(&x, 0), Err(EmbedError::InvalidInput(_))));
        assert!(matches!(Pca::fit(&x, 3), Err(EmbedError::InvalidInput(_))));
        assert!(matches!(
            Pca::fit(&Array2::zeros((0, 2)), 2),
            Err(EmbedError::EmptyInput)
        ));

        let pca = Pca::fit(&x, 1).unwrap();
        assert!(matches!(
            pca.transform(&array![[1.0]]),
            Err(EmbedError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_points_from_projection() {
        let points = ProjectedPoint::from_projection(&array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(points, vec![ProjectedPoint::new(1.0, 2.0), ProjectedPoint::new(3.0, 4.0)]);

        let padded = ProjectedPoint::from_projection(&array![[5.0]]);
        assert_eq!(padded, vec![ProjectedPoint::new(5.0, 0.0)]);
    }
}
