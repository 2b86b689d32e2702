#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskscape/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod error;
pub mod loader;
pub mod returns;
pub mod series;
pub mod yahoo;

pub use align::AlignedReturnPair;
pub use error::{DataError, Result};
pub use loader::{read_price_csv, read_price_csv_dir};
pub use returns::{compute_return_series, fill_business_days};
pub use series::{PriceChange, PricePoint, PriceSeries, ReturnPoint, ReturnSeries};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
