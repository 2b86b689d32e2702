//! Symmetric eigendecomposition by Jacobi rotations
//!
//! Each step zeroes the largest off-diagonal entry with a plane rotation and
//! accumulates the rotations into the eigenvector matrix. The pivot choice
//! and the rotation angle depend only on the matrix entries, so repeated
//! calls on the same input return bit-identical results.

use crate::error::{EmbedError, Result};
use ndarray::{Array1, Array2};

/// Off-diagonal magnitude, relative to the matrix's Frobenius norm, treated as zero
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Eigenvalues and eigenvectors of a symmetric matrix
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in descending order
    pub values: Array1<f64>,
    /// Unit eigenvectors as columns, matching `values`
    pub vectors: Array2<f64>,
}

impl SymmetricEigen {
    /// Decompose a symmetric matrix
    ///
    /// Rotation stops once every off-diagonal entry is below
    /// `tolerance * ||matrix||_F`, so tiny-scale matrices are diagonalized
    /// as thoroughly as unit-scale ones.
    ///
    /// # Errors
    /// Returns [`EmbedError::DimensionMismatch`] for a non-square matrix and
    /// [`EmbedError::InvalidInput`] when an entry is not finite.
    pub fn decompose(matrix: &Array2<f64>, tolerance: f64) -> Result<Self> {
        let n = matrix.nrows();
        if matrix.ncols() != n {
            return Err(EmbedError::DimensionMismatch {
                expected: n,
                actual: matrix.ncols(),
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::InvalidInput(
                "matrix has non-finite entries".to_string(),
            ));
        }

        let threshold = tolerance * matrix.iter().map(|x| x * x).sum::<f64>().sqrt();
        let mut a = matrix.to_owned();
        let mut v = Array2::<f64>::eye(n);
        let max_rotations = 100 * n * n;

        let mut rotations = 0;
        while rotations < max_rotations {
            let Some((p, q)) = largest_off_diagonal(&a, threshold) else {
                break;
            };
            Rotation::annihilating(a[[p, p]], a[[q, q]], a[[p, q]]).apply(&mut a, &mut v, p, q);
            rotations += 1;
        }
        tracing::trace!(n, rotations, "jacobi eigendecomposition finished");

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

        let values = order.iter().map(|&i| a[[i, i]]).collect();
        let mut vectors = Array2::<f64>::zeros((n, n));
        for (dst, &src) in order.iter().enumerate() {
            vectors.column_mut(dst).assign(&v.column(src));
        }

        Ok(Self { values, vectors })
    }
}

/// Position of the largest off-diagonal entry above `threshold`
fn largest_off_diagonal(a: &Array2<f64>, threshold: f64) -> Option<(usize, usize)> {
    let n = a.nrows();
    let mut best = None;
    let mut largest = threshold;
    for i in 0..n {
        for j in (i + 1)..n {
            let magnitude = a[[i, j]].abs();
            if magnitude > largest {
                largest = magnitude;
                best = Some((i, j));
            }
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
struct Rotation {
    cos: f64,
    sin: f64,
}

impl Rotation {
    /// Rotation that zeroes `a[p][q]`
    fn annihilating(app: f64, aqq: f64, apq: f64) -> Self {
        if apq == 0.0 {
            return Self { cos: 1.0, sin: 0.0 };
        }
        let theta = (aqq - app) / (2.0 * apq);
        // Smaller root of t^2 + 2 t theta - 1 = 0
        let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
        let cos = 1.0 / t.hypot(1.0);
        Self { cos, sin: t * cos }
    }

    fn apply(self, a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
        let Self { cos: c, sin: s } = self;
        let n = a.nrows();

        let app = a[[p, p]];
        let aqq = a[[q, q]];
        let apq = a[[p, q]];
        a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
        a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
        a[[p, q]] = 0.0;
        a[[q, p]] = 0.0;

        for k in (0..n).filter(|&k| k != p && k != q) {
            let akp = a[[k, p]];
            let akq = a[[k, q]];
            a[[k, p]] = c * akp - s * akq;
            a[[p, k]] = a[[k, p]];
            a[[k, q]] = s * akp + c * akq;
            a[[q, k]] = a[[k, q]];
        }

        for k in 0..n {
            let vkp = v[[k, p]];
            let vkq = v[[k, q]];
            v[[k, p]] = c * vkp - s * vkq;
            v[[k, q]] = s * vkp + c * vkq;
        }
    }
}
