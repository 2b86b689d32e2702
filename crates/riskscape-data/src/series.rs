//! Typed price and return series.
//!
//! A [`PriceSeries`] is the boundary type handed to the risk pipeline by a
//! price provider. It is validated once on construction so that everything
//! downstream can rely on strictly increasing dates and finite closes.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered daily closing prices for one symbol.
///
/// Invariants: dates strictly increasing (no duplicates), closes finite and
/// non-negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a validated price series.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidSymbol`] for an empty symbol and
    /// [`DataError::InvalidSeries`] for non-increasing dates or non-finite or
    /// negative closes.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        for point in &points {
            if !point.close.is_finite() || point.close < 0.0 {
                return Err(DataError::invalid_series(
                    &symbol,
                    format!("close {} on {} is not a valid price", point.close, point.date),
                ));
            }
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(DataError::invalid_series(
                &symbol,
                format!("dates not strictly increasing at {}", pair[1].date),
            ));
        }

        Ok(Self { symbol, points })
    }

    /// Create a series from points in any order.
    ///
    /// Points are sorted by date before validation; duplicate dates are still
    /// rejected.
    pub fn from_unsorted(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        Self::new(symbol, points)
    }

    /// Build a series from `(date, close)` tuples.
    pub fn from_pairs(
        symbol: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let points = pairs
            .into_iter()
            .map(|(date, close)| PricePoint::new(date, close))
            .collect();
        Self::new(symbol, points)
    }

    /// Build a series from a quotes frame.
    ///
    /// The frame must contain a `date` column of dtype `Date` and a `Float64`
    /// price column named `price_column`. Rows with a null date or price are
    /// skipped. When several rows share a date (an intraday bar for the
    /// current session next to the last close) the later row wins.
    pub fn from_frame(df: &DataFrame, symbol: &str, price_column: &str) -> Result<Self> {
        let dates = df.column("date")?.date()?;
        let prices = df.column(price_column)?.f64()?;

        let mut points: Vec<PricePoint> = dates
            .as_date_iter()
            .zip(prices)
            .filter_map(|(date, close)| Some(PricePoint::new(date?, close?)))
            .collect();

        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self::new(symbol, deduped)
    }

    /// Convert to a frame with columns `[symbol, date, close]`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let days: Vec<i32> = self
            .points
            .iter()
            .map(|p| (p.date - epoch).num_days() as i32)
            .collect();
        let closes: Vec<f64> = self.points.iter().map(|p| p.close).collect();

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec![self.symbol.as_str(); self.len()]).into(),
            Series::new("date".into(), days)
                .cast(&DataType::Date)?
                .into(),
            Series::new("close".into(), closes).into(),
        ])?;

        Ok(df)
    }

    /// Symbol label.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Price points in date order.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of price points.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last date, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.points.first()?.date, self.points.last()?.date))
    }

    /// Change between the last two closes.
    pub fn latest_change(&self) -> Option<PriceChange> {
        let [.., previous, latest] = self.points.as_slice() else {
            return None;
        };
        Some(PriceChange::new(previous.close, latest.close))
    }
}

/// Movement between the two most recent closes of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    /// Second-to-last close
    pub last_close: f64,
    /// Most recent close
    pub latest_close: f64,
    /// Absolute change
    pub change: f64,
    /// Fractional change, absent when the earlier close is zero
    pub change_pct: Option<f64>,
}

impl PriceChange {
    /// Compute the change from `last_close` to `latest_close`.
    pub fn new(last_close: f64, latest_close: f64) -> Self {
        let change = latest_close - last_close;
        let change_pct = (last_close != 0.0).then(|| change / last_close);
        Self {
            last_close,
            latest_close,
            change,
            change_pct,
        }
    }
}

/// One fractional return observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    /// Date of the later close
    pub date: NaiveDate,
    /// Fractional return since the previous close
    pub value: f64,
}

/// Ordered fractional returns for one symbol.
///
/// Invariants: dates strictly increasing, values finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    symbol: String,
    points: Vec<ReturnPoint>,
}

impl ReturnSeries {
    /// Create a validated return series.
    pub fn new(symbol: impl Into<String>, points: Vec<ReturnPoint>) -> Result<Self> {
        let symbol = symbol.into();

        if let Some(point) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(DataError::invalid_series(
                &symbol,
                format!("non-finite return on {}", point.date),
            ));
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(DataError::invalid_series(
                &symbol,
                format!("return dates not strictly increasing at {}", pair[1].date),
            ));
        }

        Ok(Self { symbol, points })
    }

    /// Construct without validation; callers guarantee the invariants.
    pub(crate) const fn from_trusted(symbol: String, points: Vec<ReturnPoint>) -> Self {
        Self { symbol, points }
    }

    /// Symbol label.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Return points in date order.
    pub fn points(&self) -> &[ReturnPoint] {
        &self.points
    }

    /// Return values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Dates in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Number of observations.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_valid_series() {
        let series =
            PriceSeries::from_pairs("AAPL", [(date(2), 100.0), (date(3), 101.0)]).unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.len(), 2);
        assert_eq!(series.date_range(), Some((date(2), date(3))));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let result = PriceSeries::from_pairs("AAPL", [(date(2), 100.0), (date(2), 101.0)]);
        assert!(matches!(result, Err(DataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_rejects_decreasing_dates() {
        let result = PriceSeries::from_pairs("AAPL", [(date(3), 100.0), (date(2), 101.0)]);
        assert!(matches!(result, Err(DataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_from_unsorted_sorts() {
        let series = PriceSeries::from_unsorted(
            "AAPL",
            vec![PricePoint::new(date(3), 101.0), PricePoint::new(date(2), 100.0)],
        )
        .unwrap();
        assert_eq!(series.points()[0].date, date(2));
    }

    #[test]
    fn test_rejects_non_finite_close() {
        let result = PriceSeries::from_pairs("AAPL", [(date(2), f64::NAN)]);
        assert!(matches!(result, Err(DataError::InvalidSeries { .. })));

        let result = PriceSeries::from_pairs("AAPL", [(date(2), -1.0)]);
        assert!(matches!(result, Err(DataError::InvalidSeries { .. })));
    }

    #[test]
    fn test_rejects_empty_symbol() {
        let result = PriceSeries::new("", vec![]);
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[test]
    fn test_latest_change() {
        let series = PriceSeries::from_pairs(
            "AAPL",
            [(date(2), 100.0), (date(3), 110.0), (date(4), 99.0)],
        )
        .unwrap();
        let change = series.latest_change().unwrap();
        assert_eq!(change.last_close, 110.0);
        assert_eq!(change.latest_close, 99.0);
        assert!((change.change + 11.0).abs() < 1e-12);
        assert!((change.change_pct.unwrap() + 0.1).abs() < 1e-12);

        let single = PriceSeries::from_pairs("AAPL", [(date(2), 100.0)]).unwrap();
        assert!(single.latest_change().is_none());
    }

    #[test]
    fn test_price_change_zero_base() {
        let change = PriceChange::new(0.0, 5.0);
        assert_eq!(change.change, 5.0);
        assert!(change.change_pct.is_none());
    }

    #[test]
    fn test_frame_round_trip() {
        let series = PriceSeries::from_pairs(
            "MSFT",
            [(date(2), 370.0), (date(3), 372.5), (date(4), 368.25)],
        )
        .unwrap();

        let df = series.to_frame().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.get_column_names(), vec!["symbol", "date", "close"]);

        let restored = PriceSeries::from_frame(&df, "MSFT", "close").unwrap();
        assert_eq!(restored, series);
    }

    #[test]
    fn test_return_series_rejects_infinite() {
        let result = ReturnSeries::new(
            "AAPL",
            vec![ReturnPoint {
                date: date(2),
                value: f64::INFINITY,
            }],
        );
        assert!(result.is_err());
    }
}
