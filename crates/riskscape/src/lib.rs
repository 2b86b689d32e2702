#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskscape/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod records;

// Re-export main types from sub-crates
pub use riskscape_data as data;
pub use riskscape_embed as embed;
pub use riskscape_output as output;
pub use riskscape_risk as risk;

pub use config::{DEFAULT_BENCHMARK, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{
    Embedding, Pipeline, batch_features, compute_batch_metrics, compute_return_series,
    compute_risk_metrics, embed_and_cluster, fit_risk_model, project_features,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
