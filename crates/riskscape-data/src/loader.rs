//! CSV price loading.
//!
//! Expects a header row with a `date` column (`YYYY-MM-DD`) and a `close`
//! column. Capitalised headers (`Date`, `Close`) are accepted as well, and any
//! other columns are ignored.

use crate::error::Result;
use crate::series::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Close")]
    close: f64,
}

/// Read a price series from CSV data.
pub fn read_price_csv<R: Read>(reader: R, symbol: &str) -> Result<PriceSeries> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut points = Vec::new();

    for row in rdr.deserialize() {
        let row: PriceRow = row?;
        points.push(PricePoint::new(row.date, row.close));
    }

    PriceSeries::from_unsorted(symbol, points)
}

/// Read `<dir>/<symbol>.csv`.
pub fn read_price_csv_dir(dir: &Path, symbol: &str) -> Result<PriceSeries> {
    let path = dir.join(format!("{symbol}.csv"));
    tracing::debug!(symbol, path = %path.display(), "loading prices from csv");
    let file = std::fs::File::open(path)?;
    read_price_csv(file, symbol)
}
