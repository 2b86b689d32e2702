//! Batch risk estimation against one shared benchmark
//!
//! The benchmark return series is computed once and shared read-only by every
//! symbol, which are evaluated in parallel. Each symbol carries its own
//! result, so one bad price series never affects the others.

use crate::RiskError;
use crate::estimator::{RiskEstimator, RiskMetrics};
use rayon::prelude::*;
use riskscape_data::{PriceSeries, compute_return_series};

/// Outcome for one symbol in a batch
#[derive(Debug)]
pub struct SymbolRisk {
    /// Symbol
    pub symbol: String,
    /// Risk metrics, or the reason they could not be computed
    pub result: Result<RiskMetrics, RiskError>,
}

/// Per-symbol risk results in request order
#[derive(Debug)]
pub struct RiskBatch {
    benchmark: String,
    entries: Vec<SymbolRisk>,
}

impl RiskBatch {
    /// Benchmark symbol used for every entry
    pub fn benchmark(&self) -> &str {
        &self.benchmark
    }

    /// All entries in request order
    pub fn entries(&self) -> &[SymbolRisk] {
        &self.entries
    }

    /// Successful entries in request order
    pub fn successes(&self) -> impl Iterator<Item = (&str, &RiskMetrics)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().ok().map(|m| (e.symbol.as_str(), m)))
    }

    /// Failed entries in request order
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RiskError)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (e.symbol.as_str(), err)))
    }

    /// Whether every symbol produced metrics
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.result.is_ok())
    }

    /// Number of symbols in the batch
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch is empty
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the batch, keeping only symbols that produced metrics
    pub fn into_successes(self) -> Vec<(String, RiskMetrics)> {
        self.entries
            .into_iter()
            .filter_map(|e| e.result.ok().map(|m| (e.symbol, m)))
            .collect()
    }

    /// Look up the metrics of one symbol
    pub fn get(&self, symbol: &str) -> Option<&RiskMetrics> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .and_then(|e| e.result.as_ref().ok())
    }
}

/// Estimate risk for every symbol against `benchmark`
///
/// # Errors
/// Fails as a whole only when the estimator configuration or the benchmark
/// is unusable; per-symbol failures are recorded in the returned batch.
pub fn compute_batch(
    estimator: &RiskEstimator,
    symbols: &[PriceSeries],
    benchmark: &PriceSeries,
) -> Result<RiskBatch, RiskError> {
    estimator.config().validate()?;
    let benchmark_returns =
        compute_return_series(benchmark).map_err(|source| RiskError::Benchmark {
            symbol: benchmark.symbol().to_string(),
            source,
        })?;

    tracing::debug!(
        symbols = symbols.len(),
        benchmark = benchmark.symbol(),
        observations = benchmark_returns.len(),
        "computing risk batch"
    );

    let entries: Vec<SymbolRisk> = symbols
        .par_iter()
        .map(|prices| {
            let result = compute_return_series(prices)
                .map(|returns| estimator.estimate_returns(&returns, &benchmark_returns))
                .map_err(RiskError::from);

            if let Err(e) = &result {
                tracing::warn!(symbol = prices.symbol(), error = %e, "risk estimation failed");
            }

            SymbolRisk {
                symbol: prices.symbol().to_string(),
                result,
            }
        })
        .collect();

    Ok(RiskBatch {
        benchmark: benchmark.symbol().to_string(),
        entries,
    })
}
