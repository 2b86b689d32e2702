#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/riskscape/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod features;
pub mod kmeans;
pub mod linalg;
pub mod normalize;
pub mod pca;
pub mod ridge;

pub use error::{EmbedError, Result};
pub use features::{FeatureMatrix, FeatureRow};
pub use kmeans::{KMeans, KMeansConfig, KMeansResult};
pub use linalg::SymmetricEigen;
pub use normalize::{StandardScaler, standardize};
pub use pca::{Pca, ProjectedPoint};
pub use ridge::{RidgeConfig, RidgeModel, RidgeRegression};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
