//! Pipeline configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "benchmark": "SPY", "kmeans": { "n_clusters": 4 } }
//! ```

use crate::error::PipelineError;
use riskscape_embed::{KMeansConfig, RidgeConfig};
use riskscape_risk::RiskConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default benchmark symbol (S&P 500 index)
pub const DEFAULT_BENCHMARK: &str = "^GSPC";

/// Configuration for a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Benchmark symbol every asset is measured against
    pub benchmark: String,
    /// Years of daily history to fetch
    pub history_years: u32,
    /// Reindex prices onto Monday-Friday dates before computing returns
    pub business_days: bool,
    /// Risk estimation settings
    pub risk: RiskConfig,
    /// Clustering settings
    pub kmeans: KMeansConfig,
    /// Regression settings
    pub ridge: RidgeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            benchmark: DEFAULT_BENCHMARK.to_string(),
            history_years: 3,
            business_days: false,
            risk: RiskConfig::default(),
            kmeans: KMeansConfig::default(),
            ridge: RidgeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce meaningless metrics
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.risk.validate()?;
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.benchmark, "^GSPC");
        assert_eq!(config.history_years, 3);
        assert!(!config.business_days);
        assert_eq!(config.kmeans.n_clusters, 3);
        assert_eq!(config.ridge.alpha, 1.72);
    }

    #[test]
    fn test_partial_json() {
        let config = PipelineConfig::from_json_str(
            r#"{ "benchmark": "SPY", "kmeans": { "n_clusters": 4, "seed": 7 } }"#,
        )
        .unwrap();

        assert_eq!(config.benchmark, "SPY");
        assert_eq!(config.history_years, 3);
        assert_eq!(config.kmeans.n_clusters, 4);
        assert_eq!(config.kmeans.seed, 7);
        assert_eq!(config.kmeans.max_iterations, 300);
        assert_eq!(config.ridge.max_iterations, 5000);
    }

    #[test]
    fn test_round_trip_file() {
        let path = std::env::temp_dir().join("riskscape_test_config.json");
        let mut config = PipelineConfig::default();
        config.history_years = 5;
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded.history_years, 5);
        assert_eq!(loaded.benchmark, config.benchmark);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = PipelineConfig::from_json_file("/nonexistent/riskscape.json");
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }

    #[rstest]
    #[case(r#"{ "risk": { "annualization_factor": -1.0 } }"#)]
    #[case(r#"{ "risk": { "annualization_factor": 0.0 } }"#)]
    fn test_invalid_risk_config(#[case] json: &str) {
        let result = PipelineConfig::from_json_str(json);
        assert!(matches!(
            result,
            Err(PipelineError::Risk(riskscape_risk::RiskError::InvalidConfig(_)))
        ));
    }

    #[rstest]
    #[case("{ benchmark: }")]
    #[case(r#"{ "history_years": -1 }"#)]
    #[case(r#"{ "kmeans": { "n_clusters": "three" } }"#)]
    fn test_malformed_json(#[case] json: &str) {
        let result = PipelineConfig::from_json_str(json);
        assert!(matches!(result, Err(PipelineError::Json(_))));
    }
}
