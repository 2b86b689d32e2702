#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskscape/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;

pub use export::{
    ClusterPoint, ExportError, ExportFormat, Exporter, FailureRecord, PredictionRecord,
    PriceRecord, ProjectionPoint, QuoteRecord, Record, RiskRecord,
};
pub use report::{Report, ReportBuilder};
