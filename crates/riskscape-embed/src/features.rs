//! Feature rows handed to the embedding and regression stages.

use crate::error::{EmbedError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Risk features of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Symbol
    pub symbol: String,
    /// Total volatility
    pub volatility: f64,
    /// Market beta
    pub beta: f64,
}

impl FeatureRow {
    /// Create a feature row
    pub fn new(symbol: impl Into<String>, volatility: f64, beta: f64) -> Self {
        Self {
            symbol: symbol.into(),
            volatility,
            beta,
        }
    }
}

/// Ordered, validated set of feature rows.
///
/// Symbols are unique and non-empty and every value is finite. Row order is
/// the insertion order and is preserved through every downstream stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FeatureRow>", into = "Vec<FeatureRow>")]
pub struct FeatureMatrix {
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    /// Number of feature columns (volatility, beta)
    pub const N_FEATURES: usize = 2;

    /// Validate and wrap feature rows
    ///
    /// # Errors
    /// Returns [`EmbedError::InvalidInput`] for an empty or duplicated
    /// symbol, or a non-finite value.
    pub fn new(rows: Vec<FeatureRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.symbol.is_empty() {
                return Err(EmbedError::InvalidInput("empty symbol".to_string()));
            }
            if !seen.insert(row.symbol.as_str()) {
                return Err(EmbedError::InvalidInput(format!(
                    "duplicate symbol {}",
                    row.symbol
                )));
            }
            if !row.volatility.is_finite() || !row.beta.is_finite() {
                return Err(EmbedError::InvalidInput(format!(
                    "non-finite feature for {}",
                    row.symbol
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Symbols in row order
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.symbol.as_str())
    }

    /// Number of rows
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `N x 2` matrix with columns (volatility, beta)
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows.len(), Self::N_FEATURES), |(i, j)| {
            let row = &self.rows[i];
            if j == 0 { row.volatility } else { row.beta }
        })
    }
}

impl TryFrom<Vec<FeatureRow>> for FeatureMatrix {
    type Error = EmbedError;

    fn try_from(rows: Vec<FeatureRow>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<FeatureMatrix> for Vec<FeatureRow> {
    fn from(matrix: FeatureMatrix) -> Self {
        matrix.rows
    }
}
