//! Loading of benchmark and symbol price histories.
//!
//! Prices come either from Yahoo Finance or from a directory of
//! `<SYMBOL>.csv` files. Yahoo requests run concurrently with a progress bar.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use riskscape::Pipeline;
use riskscape::data::yahoo::YahooPriceProvider;
use riskscape::data::{DataError, PriceSeries, read_price_csv_dir};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent fetches.
const DEFAULT_CONCURRENCY: usize = 10;

/// Error type for price loading.
#[derive(Debug, thiserror::Error)]
pub(crate) enum FetchError {
    /// The benchmark could not be loaded; nothing can be measured without it.
    #[error("Failed to load benchmark {symbol}: {source}")]
    Benchmark {
        symbol: String,
        #[source]
        source: DataError,
    },
    /// Provider construction error.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Progress bar style error.
    #[error("Progress bar error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
    /// No symbols left after normalization.
    #[error("No symbols given")]
    NoSymbols,
}

/// Where price histories come from.
#[derive(Debug)]
pub(crate) enum PriceSource {
    Yahoo(YahooPriceProvider),
    CsvDir(PathBuf),
}

impl PriceSource {
    /// CSV directory when given, Yahoo Finance otherwise.
    pub(crate) fn new(csv_dir: Option<PathBuf>) -> Result<Self, FetchError> {
        Ok(match csv_dir {
            Some(dir) => Self::CsvDir(dir),
            None => Self::Yahoo(YahooPriceProvider::new()?),
        })
    }

    async fn load(&self, symbol: &str, years: u32) -> Result<PriceSeries, DataError> {
        match self {
            Self::Yahoo(provider) => provider.fetch_history(symbol, years).await,
            Self::CsvDir(dir) => read_price_csv_dir(dir, symbol),
        }
    }

    const fn is_remote(&self) -> bool {
        matches!(self, Self::Yahoo(_))
    }
}

/// Loaded symbols in input order and the symbols that failed to load.
#[derive(Debug)]
pub(crate) struct Loaded {
    pub(crate) series: Vec<PriceSeries>,
    pub(crate) failures: Vec<(String, DataError)>,
}

/// Trim, uppercase and de-duplicate symbols, keeping first occurrences.
pub(crate) fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// Load and prepare the benchmark history.
pub(crate) async fn load_benchmark(
    source: &PriceSource,
    pipeline: &Pipeline,
) -> Result<PriceSeries, FetchError> {
    let symbol = &pipeline.config().benchmark;
    let years = pipeline.config().history_years;

    let loaded = source.load(symbol, years).await;
    loaded
        .and_then(|prices| pipeline.prepare(prices))
        .map_err(|e| FetchError::Benchmark {
            symbol: symbol.clone(),
            source: e,
        })
}

/// Load and prepare every symbol. A symbol that fails is reported in
/// [`Loaded::failures`] without affecting the others.
pub(crate) async fn load_symbols(
    source: &PriceSource,
    pipeline: &Pipeline,
    symbols: &[String],
) -> Result<Loaded, FetchError> {
    let symbols = normalize_symbols(symbols);
    if symbols.is_empty() {
        return Err(FetchError::NoSymbols);
    }
    let years = pipeline.config().history_years;

    let progress = if source.is_remote() {
        Some(progress_bar(symbols.len())?)
    } else {
        None
    };

    let mut results: Vec<(usize, String, Result<PriceSeries, DataError>)> =
        stream::iter(symbols.into_iter().enumerate())
            .map(|(index, symbol)| async move {
                let result = source
                    .load(&symbol, years)
                    .await
                    .and_then(|prices| pipeline.prepare(prices));
                (index, symbol, result)
            })
            .buffer_unordered(DEFAULT_CONCURRENCY)
            .inspect(|(_, symbol, result)| {
                if let Err(e) = result {
                    tracing::warn!(symbol = %symbol, error = %e, "failed to load prices");
                }
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
            })
            .collect()
            .await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    results.sort_by_key(|(index, _, _)| *index);

    let mut loaded = Loaded {
        series: Vec::with_capacity(results.len()),
        failures: Vec::new(),
    };
    for (_, symbol, result) in results {
        match result {
            Ok(series) => loaded.series.push(series),
            Err(e) => loaded.failures.push((symbol, e)),
        }
    }
    Ok(loaded)
}

fn progress_bar(len: usize) -> Result<ProgressBar, FetchError> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Fetching {len} symbols ({DEFAULT_CONCURRENCY} concurrent)..."
    ));
    Ok(pb)
}
