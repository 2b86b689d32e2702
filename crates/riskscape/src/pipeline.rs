//! Pipeline stages from prices to embeddings and predictions
//!
//! The free functions run one stage with default settings. [`Pipeline`]
//! runs the same stages with the settings of a [`PipelineConfig`].

use crate::config::PipelineConfig;
use ndarray::Array1;
use riskscape_data::{DataError, PriceSeries, fill_business_days};
use riskscape_embed::{
    EmbedError, FeatureMatrix, FeatureRow, KMeans, KMeansConfig, Pca, ProjectedPoint, RidgeConfig,
    RidgeRegression, standardize,
};
use riskscape_risk::{RiskBatch, RiskError, RiskEstimator, RiskMetrics, compute_batch};

pub use riskscape_data::compute_return_series;

/// 2-D embedding of a feature matrix with cluster ids, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Projected point per row
    pub points: Vec<ProjectedPoint>,
    /// Cluster id per row
    pub clusters: Vec<usize>,
}

/// Volatility, beta and idiosyncratic risk of `prices` against `benchmark`
/// in daily units.
pub fn compute_risk_metrics(
    prices: &PriceSeries,
    benchmark: &PriceSeries,
) -> Result<RiskMetrics, RiskError> {
    RiskEstimator::default().estimate(prices, benchmark)
}

/// Risk metrics for many symbols against one benchmark.
pub fn compute_batch_metrics(
    symbols: &[PriceSeries],
    benchmark: &PriceSeries,
    config: &PipelineConfig,
) -> Result<RiskBatch, RiskError> {
    compute_batch(&RiskEstimator::new(config.risk.clone()), symbols, benchmark)
}

/// Standardize, project to 2-D and cluster into `k` groups.
pub fn embed_and_cluster(
    features: &FeatureMatrix,
    k: usize,
    seed: u64,
) -> Result<Embedding, EmbedError> {
    cluster_with(
        features,
        &KMeansConfig {
            n_clusters: k,
            seed,
            ..Default::default()
        },
    )
}

/// Project raw (unscaled) features to 2-D.
pub fn project_features(features: &FeatureMatrix) -> Result<Vec<ProjectedPoint>, EmbedError> {
    let (_, projection) = Pca::fit_transform(&features.to_array(), 2)?;
    Ok(ProjectedPoint::from_projection(&projection))
}

/// Fit (volatility, beta) -> target with ridge regression and predict the
/// same rows.
pub fn fit_risk_model(features: &FeatureMatrix, targets: &[f64]) -> Result<Vec<f64>, EmbedError> {
    fit_with(features, targets, &RidgeConfig::default())
}

/// Feature rows and idiosyncratic risk targets from the successful symbols
/// of a batch. Symbols with an undefined beta are left out.
pub fn batch_features(batch: &RiskBatch) -> Result<(FeatureMatrix, Vec<f64>), EmbedError> {
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for (symbol, metrics) in batch.successes() {
        if !metrics.beta.is_finite() {
            tracing::warn!(symbol, "skipping symbol with undefined beta");
            continue;
        }
        rows.push(FeatureRow::new(symbol, metrics.volatility, metrics.beta));
        targets.push(metrics.idiosyncratic_risk);
    }
    Ok((FeatureMatrix::new(rows)?, targets))
}

fn cluster_with(features: &FeatureMatrix, config: &KMeansConfig) -> Result<Embedding, EmbedError> {
    let scaled = standardize(&features.to_array())?;
    let (pca, projection) = Pca::fit_transform(&scaled, 2)?;
    let result = KMeans::new(config.clone()).fit(&projection)?;

    tracing::debug!(
        rows = features.len(),
        explained = ?pca.explained_variance_ratio().to_vec(),
        clusters = result.n_clusters(),
        iterations = result.iterations,
        converged = result.converged,
        "embedded and clustered features"
    );

    Ok(Embedding {
        points: ProjectedPoint::from_projection(&projection),
        clusters: result.labels,
    })
}

fn fit_with(
    features: &FeatureMatrix,
    targets: &[f64],
    config: &RidgeConfig,
) -> Result<Vec<f64>, EmbedError> {
    if targets.len() != features.len() {
        return Err(EmbedError::DimensionMismatch {
            expected: features.len(),
            actual: targets.len(),
        });
    }
    let x = features.to_array();
    let model = RidgeRegression::new(config.clone()).fit(&x, &Array1::from(targets.to_vec()))?;
    Ok(model.predict(&x)?.to_vec())
}

/// All pipeline stages with one configuration
#[derive(Debug, Default, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Risk estimator built from the configuration
    pub fn estimator(&self) -> RiskEstimator {
        RiskEstimator::new(self.config.risk.clone())
    }

    /// Apply configured price preprocessing
    pub fn prepare(&self, prices: PriceSeries) -> Result<PriceSeries, DataError> {
        if self.config.business_days {
            fill_business_days(&prices)
        } else {
            Ok(prices)
        }
    }

    /// Risk metrics of one symbol
    pub fn risk_metrics(
        &self,
        prices: &PriceSeries,
        benchmark: &PriceSeries,
    ) -> Result<RiskMetrics, RiskError> {
        self.estimator().estimate(prices, benchmark)
    }

    /// Risk metrics of many symbols
    pub fn batch(
        &self,
        symbols: &[PriceSeries],
        benchmark: &PriceSeries,
    ) -> Result<RiskBatch, RiskError> {
        compute_batch_metrics(symbols, benchmark, &self.config)
    }

    /// Standardized embedding with configured clustering
    pub fn embed_and_cluster(&self, features: &FeatureMatrix) -> Result<Embedding, EmbedError> {
        cluster_with(features, &self.config.kmeans)
    }

    /// Raw 2-D projection
    pub fn project(&self, features: &FeatureMatrix) -> Result<Vec<ProjectedPoint>, EmbedError> {
        project_features(features)
    }

    /// Ridge predictions with configured regularization
    pub fn fit_risk_model(
        &self,
        features: &FeatureMatrix,
        targets: &[f64],
    ) -> Result<Vec<f64>, EmbedError> {
        fit_with(features, targets, &self.config.ridge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    fn prices(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_pairs(
            symbol,
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| (start + Days::new(i as u64), c)),
        )
        .unwrap()
    }

    fn features() -> FeatureMatrix {
        FeatureMatrix::new(vec![
            FeatureRow::new("A", 0.010, 0.5),
            FeatureRow::new("B", 0.011, 0.6),
            FeatureRow::new("C", 0.030, 1.5),
            FeatureRow::new("D", 0.032, 1.6),
        ])
        .unwrap()
    }

    #[test]
    fn test_return_series_scenario() {
        let returns = compute_return_series(&prices("X", &[100.0, 102.0, 101.0])).unwrap();
        let values = returns.values();
        assert_relative_eq!(values[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(values[1], -0.00980392156862745, epsilon = 1e-12);
    }

    #[test]
    fn test_compute_risk_metrics() {
        let closes = [100.0, 101.0, 99.5, 102.0, 103.0];
        let metrics = compute_risk_metrics(&prices("A", &closes), &prices("M", &closes)).unwrap();
        assert_relative_eq!(metrics.beta, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_embed_and_cluster_shapes() {
        let embedding = embed_and_cluster(&features(), 2, 0).unwrap();
        assert_eq!(embedding.points.len(), 4);
        assert_eq!(embedding.clusters.len(), 4);
        assert_eq!(embedding.clusters[0], embedding.clusters[1]);
        assert_eq!(embedding.clusters[2], embedding.clusters[3]);
        assert_ne!(embedding.clusters[0], embedding.clusters[2]);
    }

    #[test]
    fn test_embed_empty() {
        let empty = FeatureMatrix::new(Vec::new()).unwrap();
        assert!(matches!(
            embed_and_cluster(&empty, 3, 0),
            Err(EmbedError::EmptyInput)
        ));
        assert!(matches!(project_features(&empty), Err(EmbedError::EmptyInput)));
    }

    #[test]
    fn test_project_features_raw_scale() {
        let points = project_features(&features()).unwrap();
        assert_eq!(points.len(), 4);
        // Beta dominates the unscaled projection
        assert!(points[0].x < 0.0 && points[3].x > 0.0);
    }

    #[test]
    fn test_fit_risk_model() {
        let predictions = fit_risk_model(&features(), &[0.008, 0.009, 0.02, 0.021]).unwrap();
        assert_eq!(predictions.len(), 4);
        assert!(predictions[0] < predictions[3]);

        let mismatch = fit_risk_model(&features(), &[0.1]);
        assert!(matches!(
            mismatch,
            Err(EmbedError::DimensionMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_pipeline_uses_config() {
        let mut config = PipelineConfig::default();
        config.kmeans.n_clusters = 1;
        let pipeline = Pipeline::new(config);

        let embedding = pipeline.embed_and_cluster(&features()).unwrap();
        assert!(embedding.clusters.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_prepare_business_days() {
        // 2024-01-05 is a Friday, 2024-01-08 a Monday
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let series = PriceSeries::from_pairs(
            "X",
            [(friday, 10.0), (friday + Days::new(1), 10.5), (friday + Days::new(3), 11.0)],
        )
        .unwrap();

        let plain = Pipeline::default().prepare(series.clone()).unwrap();
        assert_eq!(plain.len(), 3);

        let mut config = PipelineConfig::default();
        config.business_days = true;
        let filled = Pipeline::new(config).prepare(series).unwrap();
        assert_eq!(filled.len(), 2);
    }

    #[test]
    fn test_batch_features_skips_undefined_beta() {
        let market = prices("M", &[100.0, 101.0, 99.5, 102.0, 103.0]);
        let symbols = vec![
            prices("A", &[10.0, 10.2, 10.1, 10.4, 10.3]),
            prices("Z", &[0.0, 0.0, 0.0]),
            prices("Q", &[1.0]),
        ];
        let batch = compute_batch_metrics(&symbols, &market, &PipelineConfig::default()).unwrap();
        let (matrix, targets) = batch_features(&batch).unwrap();

        assert_eq!(matrix.symbols().collect::<Vec<_>>(), vec!["A"]);
        assert_eq!(targets.len(), 1);
    }
}
