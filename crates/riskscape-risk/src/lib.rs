#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskscape/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod batch;
pub mod estimator;
pub mod stats;

use riskscape_data::DataError;
use thiserror::Error;

// Re-export main types
pub use batch::{RiskBatch, SymbolRisk, compute_batch};
pub use estimator::{RiskConfig, RiskEstimator, RiskMetrics};

/// Errors that can occur during risk estimation
#[derive(Debug, Error)]
pub enum RiskError {
    /// Price or return data for the symbol is unusable
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Benchmark series is unusable, so no symbol in the batch can be evaluated
    #[error("Benchmark {symbol} unusable: {source}")]
    Benchmark {
        /// Benchmark symbol
        symbol: String,
        /// Underlying data error
        #[source]
        source: DataError,
    },

    /// Estimator configuration is unusable
    #[error("Invalid risk config: {0}")]
    InvalidConfig(String),
}
