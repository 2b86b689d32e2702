//! Per-column standardization
//!
//! Each column is shifted to zero mean and scaled to unit population
//! standard deviation (ddof = 0). A column with zero spread carries no
//! information and maps to zeros.

use crate::error::{EmbedError, Result};
use ndarray::{Array1, Array2, Axis, Zip};

/// Fitted per-column mean and scale
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn column means and population standard deviations
    ///
    /// # Errors
    /// Returns [`EmbedError::EmptyInput`] when `x` has no rows.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let mean = x.mean_axis(Axis(0)).ok_or(EmbedError::EmptyInput)?;
        let scale = x.std_axis(Axis(0), 0.0);
        Ok(Self { mean, scale })
    }

    /// Column means
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Column standard deviations (zero for constant columns)
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Apply the fitted statistics to `x`
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

        let mut out = x.to_owned();
        for (mut column, (&mean, &scale)) in out
            .columns_mut()
            .into_iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
        {
            if scale == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - mean) / scale);
            }
        }
        Ok(out)
    }

    /// Map standardized values back to the original units
    pub fn inverse_transform(&self, z: &Array2<f64>) -> Result<Array2<f64>> {
        if z.ncols() != self.mean.len() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.mean.len(),
                actual: z.ncols(),
            });
        }

        let mut out = z.to_owned();
        for mut row in out.rows_mut() {
            Zip::from(&mut row)
                .and(&self.mean)
                .and(&self.scale)
                .for_each(|v, &mean, &scale| *v = *v * scale + mean);
        }
        Ok(out)
    }
}

/// Standardize every column of `x` in one step
///
/// # Errors
/// Returns [`EmbedError::EmptyInput`] when `x` has no rows.
pub fn standardize(x: &Array2<f64>) -> Result<Array2<f64>> {
    StandardScaler::fit(x)?.transform(x)
}
