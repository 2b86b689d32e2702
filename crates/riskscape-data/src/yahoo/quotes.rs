//! Daily price history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::series::PriceSeries;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Column used for return computation (dividend and split adjusted).
pub const PRICE_COLUMN: &str = "adjusted_close";

/// Yahoo Finance price provider with a fixed delay between requests.
pub struct YahooPriceProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceProvider {
    /// Create a provider with the default delay (250ms).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a provider with a custom delay between requests.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily quotes for a single symbol.
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, close, adjusted_close
    pub async fn fetch_frame(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        tracing::debug!(symbol, %start, %end, "fetching quote history");
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let df = quotes_frame(symbol, &quotes)?;

        sleep(self.rate_limit_delay).await;

        Ok(df)
    }

    /// Fetch a validated price series for a single symbol.
    pub async fn fetch_prices(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries> {
        let df = self.fetch_frame(symbol, start, end).await?;
        PriceSeries::from_frame(&df, symbol, PRICE_COLUMN)
    }

    /// Fetch the trailing `years` of history ending now.
    pub async fn fetch_history(&self, symbol: &str, years: u32) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(365 * i64::from(years));
        self.fetch_prices(symbol, start, end).await
    }
}

/// Daily quotes as a frame with columns: symbol, date, close, adjusted_close
fn quotes_frame(symbol: &str, quotes: &[yahoo::Quote]) -> Result<DataFrame> {
    let timestamps: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

    let df = DataFrame::new(vec![
        Series::new("symbol".into(), vec![symbol; quotes.len()]).into(),
        Series::new("timestamp".into(), timestamps).into(),
        Series::new("close".into(), closes).into(),
        Series::new(PRICE_COLUMN.into(), adj_closes).into(),
    ])?;

    Ok(df
        .lazy()
        .with_column(
            (col("timestamp") * lit(1_000_000_000))
                .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                .cast(DataType::Date)
                .alias("date"),
        )
        .select(&[
            col("symbol"),
            col("date"),
            col("close"),
            col(PRICE_COLUMN),
        ])
        .collect()?)
}
