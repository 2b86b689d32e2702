//! Error types for embedding and model fitting

use thiserror::Error;

/// Errors raised by the normalizer, reducer, cluster assigner and predictor
#[derive(Debug, Error)]
pub enum EmbedError {
    /// No rows to work with
    #[error("Empty input: at least one row is required")]
    EmptyInput,

    /// Input rejected at the boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Shapes do not line up
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },
}

/// Result type for embedding operations
pub type Result<T> = std::result::Result<T, EmbedError>;
