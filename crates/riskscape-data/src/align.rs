//! Alignment of a symbol's returns with a benchmark's returns.
//!
//! Both series are re-indexed onto the union of their dates. Each side is
//! forward-filled independently from its own most recent observation, and
//! only dates on which both sides have a value are kept. Dates before a
//! series' first observation stay undefined and are therefore excluded.

use crate::series::ReturnSeries;
use chrono::NaiveDate;
use serde::Serialize;

/// Two return series on an identical date index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedReturnPair {
    dates: Vec<NaiveDate>,
    asset: Vec<f64>,
    benchmark: Vec<f64>,
}

impl AlignedReturnPair {
    /// Align `asset` against `benchmark`.
    pub fn align(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Self {
        let a = asset.points();
        let b = benchmark.points();

        let capacity = a.len().max(b.len());
        let mut dates = Vec::with_capacity(capacity);
        let mut asset_values = Vec::with_capacity(capacity);
        let mut benchmark_values = Vec::with_capacity(capacity);

        let (mut i, mut j) = (0, 0);
        let mut last_a: Option<f64> = None;
        let mut last_b: Option<f64> = None;

        while i < a.len() || j < b.len() {
            // Next date of the union index
            let date = match (a.get(i), b.get(j)) {
                (Some(pa), Some(pb)) => pa.date.min(pb.date),
                (Some(pa), None) => pa.date,
                (None, Some(pb)) => pb.date,
                (None, None) => break,
            };

            if let Some(pa) = a.get(i).filter(|p| p.date == date) {
                last_a = Some(pa.value);
                i += 1;
            }
            if let Some(pb) = b.get(j).filter(|p| p.date == date) {
                last_b = Some(pb.value);
                j += 1;
            }

            if let (Some(va), Some(vb)) = (last_a, last_b) {
                dates.push(date);
                asset_values.push(va);
                benchmark_values.push(vb);
            }
        }

        Self {
            dates,
            asset: asset_values,
            benchmark: benchmark_values,
        }
    }

    /// Shared date index.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Aligned asset returns.
    pub fn asset(&self) -> &[f64] {
        &self.asset
    }

    /// Aligned benchmark returns.
    pub fn benchmark(&self) -> &[f64] {
        &self.benchmark
    }

    /// Number of aligned observations.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether no date has both sides defined.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ReturnPoint;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn returns(symbol: &str, points: &[(u32, f64)]) -> ReturnSeries {
        ReturnSeries::new(
            symbol,
            points
                .iter()
                .map(|&(day, value)| ReturnPoint { date: d(day), value })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_dates() {
        let a = returns("A", &[(1, 0.01), (2, 0.02), (3, -0.01)]);
        let b = returns("B", &[(1, 0.005), (2, 0.01), (3, 0.0)]);

        let pair = AlignedReturnPair::align(&a, &b);
        assert_eq!(pair.len(), 3);
        assert_eq!(pair.asset(), &[0.01, 0.02, -0.01]);
        assert_eq!(pair.benchmark(), &[0.005, 0.01, 0.0]);
    }

    #[test]
    fn test_forward_fills_gaps() {
        // Asset misses day 3, benchmark misses day 2
        let a = returns("A", &[(1, 0.01), (2, 0.02), (4, 0.03)]);
        let b = returns("B", &[(1, 0.1), (3, 0.3), (4, 0.4)]);

        let pair = AlignedReturnPair::align(&a, &b);
        assert_eq!(pair.dates(), &[d(1), d(2), d(3), d(4)]);
        assert_eq!(pair.asset(), &[0.01, 0.02, 0.02, 0.03]);
        assert_eq!(pair.benchmark(), &[0.1, 0.1, 0.3, 0.4]);
    }

    #[test]
    fn test_leading_dates_excluded() {
        // Benchmark starts two days later; earlier asset dates have no benchmark value
        let a = returns("A", &[(1, 0.01), (2, 0.02), (3, 0.03), (4, 0.04)]);
        let b = returns("B", &[(3, 0.3), (4, 0.4)]);

        let pair = AlignedReturnPair::align(&a, &b);
        assert_eq!(pair.dates(), &[d(3), d(4)]);
        assert_eq!(pair.asset(), &[0.03, 0.04]);
    }

    #[test]
    fn test_trailing_dates_forward_filled() {
        let a = returns("A", &[(1, 0.01), (2, 0.02)]);
        let b = returns("B", &[(1, 0.1), (2, 0.2), (3, 0.3), (4, 0.4)]);

        let pair = AlignedReturnPair::align(&a, &b);
        assert_eq!(pair.len(), 4);
        assert_eq!(pair.asset(), &[0.01, 0.02, 0.02, 0.02]);
    }

    #[test]
    fn test_empty_side_yields_empty_pair() {
        let a = returns("A", &[(1, 0.01), (2, 0.02)]);
        let b = returns("B", &[]);

        let pair = AlignedReturnPair::align(&a, &b);
        assert!(pair.is_empty());
        assert_eq!(pair.asset().len(), pair.benchmark().len());
    }
}
