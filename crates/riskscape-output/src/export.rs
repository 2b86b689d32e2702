//! CSV and JSON export of pipeline results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Csv,

    /// Compact JSON array.
    Json,

    /// Pretty-printed JSON array.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Risk metrics of one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskRecord {
    /// Security symbol.
    pub symbol: String,

    /// Total volatility.
    pub volatility: f64,

    /// Market beta; `None` when undefined (no overlap with the benchmark).
    pub beta: Option<f64>,

    /// Idiosyncratic risk.
    pub idiosyncratic_risk: f64,
}

impl RiskRecord {
    /// Create a record, mapping a NaN beta to `None`.
    pub fn new(symbol: String, volatility: f64, beta: f64, idiosyncratic_risk: f64) -> Self {
        Self {
            symbol,
            volatility,
            beta: (!beta.is_nan()).then_some(beta),
            idiosyncratic_risk,
        }
    }
}

/// A symbol placed in the 2-D embedding with its cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterPoint {
    /// Security symbol.
    pub ticker: String,

    /// First embedding coordinate.
    pub x: f64,

    /// Second embedding coordinate.
    pub y: f64,

    /// Cluster id.
    pub cluster: usize,
}

impl ClusterPoint {
    /// Create a new cluster point.
    pub const fn new(ticker: String, x: f64, y: f64, cluster: usize) -> Self {
        Self {
            ticker,
            x,
            y,
            cluster,
        }
    }
}

/// A symbol placed in the 2-D embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionPoint {
    /// Security symbol.
    pub ticker: String,

    /// First embedding coordinate.
    pub x: f64,

    /// Second embedding coordinate.
    pub y: f64,
}

impl ProjectionPoint {
    /// Create a new projection point.
    pub const fn new(ticker: String, x: f64, y: f64) -> Self {
        Self { ticker, x, y }
    }
}

/// Observed and model-predicted idiosyncratic risk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    /// Security symbol.
    pub symbol: String,

    /// Idiosyncratic risk computed from returns.
    pub idiosyncratic_risk: f64,

    /// Idiosyncratic risk predicted from (volatility, beta).
    pub predicted_risk: f64,
}

impl PredictionRecord {
    /// Create a new prediction record.
    pub const fn new(symbol: String, idiosyncratic_risk: f64, predicted_risk: f64) -> Self {
        Self {
            symbol,
            idiosyncratic_risk,
            predicted_risk,
        }
    }

    /// Prediction minus observation.
    pub fn residual(&self) -> f64 {
        self.predicted_risk - self.idiosyncratic_risk
    }
}

/// The last two closes of a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteRecord {
    /// Security symbol.
    pub symbol: String,

    /// Second-to-last close.
    pub last_close: f64,

    /// Most recent close.
    pub latest_close: f64,

    /// Absolute change.
    pub change: f64,

    /// Fractional change; `None` when the earlier close is zero.
    pub change_pct: Option<f64>,
}

/// One daily close of a symbol's price history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    /// Security symbol.
    pub symbol: String,

    /// Trading date.
    pub date: NaiveDate,

    /// Closing price.
    pub close: f64,
}

/// A symbol that could not be processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureRecord {
    /// Security symbol.
    pub symbol: String,

    /// Error message.
    pub error: String,
}

impl FailureRecord {
    /// Create a failure record from any displayable error.
    pub fn new(symbol: String, error: &impl std::fmt::Display) -> Self {
        Self {
            symbol,
            error: error.to_string(),
        }
    }
}

/// Marker for flat records that serialize to one CSV row each.
pub trait Record: Serialize {}

impl Record for RiskRecord {}
impl Record for ClusterPoint {}
impl Record for ProjectionPoint {}
impl Record for PredictionRecord {}
impl Record for QuoteRecord {}
impl Record for PriceRecord {}
impl Record for FailureRecord {}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_csv<'a, R: Record + 'a>(
    records: impl IntoIterator<Item = &'a R>,
) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

impl<R: Record> Exporter for [R] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl<R: Record> Exporter for Vec<R> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        self.as_slice().export_to_string(format)
    }
}
