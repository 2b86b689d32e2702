//! Top-level error type

use riskscape_data::DataError;
use riskscape_embed::EmbedError;
use riskscape_output::ExportError;
use riskscape_risk::RiskError;
use thiserror::Error;

/// Errors from any pipeline stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Price data error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Risk estimation error
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Embedding or regression error
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// Export error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration file could not be read
    #[error("Config error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
