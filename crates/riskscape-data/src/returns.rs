//! Return series construction.
//!
//! Daily fractional returns are computed close-to-close:
//! r_t = (P_t - P_{t-1}) / P_{t-1}
//!
//! An observation whose previous close is exactly zero has no defined return
//! and is dropped rather than emitted as an infinity.

use crate::error::{DataError, Result};
use crate::series::{PricePoint, PriceSeries, ReturnPoint, ReturnSeries};
use chrono::{Datelike, Days, Weekday};

/// Minimum number of price points needed to form one return.
pub const MIN_PRICE_POINTS: usize = 2;

/// Convert a price series into a fractional return series.
///
/// The output is dated by the later close of each pair and has at most
/// `prices.len() - 1` observations.
///
/// # Errors
/// Returns [`DataError::InsufficientData`] if fewer than two prices are given.
pub fn compute_return_series(prices: &PriceSeries) -> Result<ReturnSeries> {
    let n = prices.len();
    if n < MIN_PRICE_POINTS {
        return Err(DataError::InsufficientData {
            required: MIN_PRICE_POINTS,
            actual: n,
        });
    }

    let points: Vec<ReturnPoint> = prices
        .points()
        .windows(2)
        .filter(|w| w[0].close != 0.0)
        .map(|w| ReturnPoint {
            date: w[1].date,
            value: (w[1].close - w[0].close) / w[0].close,
        })
        .collect();

    let dropped = n - 1 - points.len();
    if dropped > 0 {
        tracing::debug!(
            symbol = prices.symbol(),
            dropped,
            "dropped returns following a zero close"
        );
    }

    Ok(ReturnSeries::from_trusted(prices.symbol().to_string(), points))
}

/// Reindex a price series onto the weekday calendar.
///
/// Every Monday to Friday between the first and last observation receives a
/// close; dates without an observation take the most recent earlier close.
/// Weekend observations are dropped.
pub fn fill_business_days(prices: &PriceSeries) -> Result<PriceSeries> {
    let Some((start, end)) = prices.date_range() else {
        return Ok(prices.clone());
    };

    let observed = prices.points();
    let mut filled = Vec::new();
    let mut cursor = 0;
    let mut last_close: Option<f64> = None;
    let mut day = start;

    while day <= end {
        while cursor < observed.len() && observed[cursor].date <= day {
            last_close = Some(observed[cursor].close);
            cursor += 1;
        }

        if is_business_day(day)
            && let Some(close) = last_close
        {
            filled.push(PricePoint::new(day, close));
        }

        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    PriceSeries::new(prices.symbol(), filled)
}

fn is_business_day(date: chrono::NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
