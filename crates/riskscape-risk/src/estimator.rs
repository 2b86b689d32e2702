//! Single-factor risk estimator
//!
//! Decomposes a symbol's return volatility against a benchmark:
//!
//! β = Cov(R_i, R_m) / Var(R_m)
//! σ_sys = |β| * σ_m
//! σ_idio = sqrt(σ_i² - σ_sys²)
//!
//! The systematic part can never exceed total risk. When σ_sys > σ_i the
//! radicand would be negative, and idiosyncratic risk is reported as the
//! total volatility instead. A symbol that moves exactly with the benchmark
//! (σ_sys = σ_i, up to rounding) has zero idiosyncratic risk.

use crate::RiskError;
use crate::stats::{sample_covariance, sample_std, sample_variance};
use riskscape_data::{AlignedReturnPair, PriceSeries, ReturnSeries, compute_return_series};
use serde::{Deserialize, Serialize};

/// Relative slack below zero that still counts as an exact fit.
/// Scaled copies of the benchmark leave the radicand a few ulps negative.
const RADICAND_TOLERANCE: f64 = 1e-12;

/// Configuration for risk estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Multiplier applied to daily volatilities (default: 1.0, i.e. daily units)
    pub annualization_factor: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            annualization_factor: 1.0,
        }
    }
}

impl RiskConfig {
    /// Annualized volatilities for daily data (factor sqrt(252))
    pub fn annualized() -> Self {
        Self {
            annualization_factor: (252.0_f64).sqrt(),
        }
    }

    /// Check that the configuration yields non-negative volatilities
    ///
    /// # Errors
    /// Returns [`RiskError::InvalidConfig`] for a non-finite or non-positive
    /// annualization factor.
    pub fn validate(&self) -> Result<(), RiskError> {
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(RiskError::InvalidConfig(format!(
                "annualization_factor must be finite and positive, got {}",
                self.annualization_factor
            )));
        }
        Ok(())
    }
}

/// Risk decomposition of one symbol against the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskMetrics {
    /// Total volatility (sample standard deviation of returns)
    pub volatility: f64,
    /// Market beta; NaN when the symbol and benchmark share no dates
    pub beta: f64,
    /// Volatility not explained by the benchmark
    pub idiosyncratic_risk: f64,
}

impl RiskMetrics {
    /// Systematic volatility implied by `volatility - idiosyncratic` decomposition.
    pub fn systematic_risk(&self) -> f64 {
        (self.volatility.powi(2) - self.idiosyncratic_risk.powi(2))
            .max(0.0)
            .sqrt()
    }
}

/// Risk estimator
#[derive(Debug, Default, Clone)]
pub struct RiskEstimator {
    config: RiskConfig,
}

impl RiskEstimator {
    /// Create a new risk estimator
    pub const fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub const fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Estimate risk metrics from raw prices
    ///
    /// # Errors
    /// Returns [`RiskError::InvalidConfig`] for an unusable configuration,
    /// [`RiskError::Data`] if the symbol has fewer than two prices and
    /// [`RiskError::Benchmark`] if the benchmark does.
    pub fn estimate(
        &self,
        prices: &PriceSeries,
        benchmark: &PriceSeries,
    ) -> Result<RiskMetrics, RiskError> {
        self.config.validate()?;
        let benchmark_returns =
            compute_return_series(benchmark).map_err(|source| RiskError::Benchmark {
                symbol: benchmark.symbol().to_string(),
                source,
            })?;
        let returns = compute_return_series(prices)?;

        Ok(self.estimate_returns(&returns, &benchmark_returns))
    }

    /// Estimate risk metrics from return series
    pub fn estimate_returns(
        &self,
        returns: &ReturnSeries,
        benchmark_returns: &ReturnSeries,
    ) -> RiskMetrics {
        let pair = AlignedReturnPair::align(returns, benchmark_returns);

        if pair.is_empty() {
            // No shared dates: beta is undefined and all risk is idiosyncratic
            let volatility = sample_std(&returns.values()) * self.config.annualization_factor;
            tracing::debug!(
                symbol = returns.symbol(),
                benchmark = benchmark_returns.symbol(),
                "no overlapping dates with benchmark"
            );
            return RiskMetrics {
                volatility,
                beta: f64::NAN,
                idiosyncratic_risk: volatility,
            };
        }

        self.estimate_aligned(&pair)
    }

    /// Estimate risk metrics from an aligned return pair
    pub fn estimate_aligned(&self, pair: &AlignedReturnPair) -> RiskMetrics {
        let scale = self.config.annualization_factor;

        if pair.is_empty() {
            return RiskMetrics {
                volatility: 0.0,
                beta: f64::NAN,
                idiosyncratic_risk: 0.0,
            };
        }

        let volatility = sample_std(pair.asset()) * scale;
        let benchmark_volatility = sample_std(pair.benchmark()) * scale;

        let benchmark_variance = sample_variance(pair.benchmark());
        let beta = if benchmark_variance == 0.0 {
            0.0
        } else {
            sample_covariance(pair.asset(), pair.benchmark()) / benchmark_variance
        };

        let systematic = beta.abs() * benchmark_volatility;
        let total_variance = volatility.powi(2);
        let radicand = total_variance - systematic.powi(2);
        let idiosyncratic_risk = if systematic == 0.0 {
            volatility
        } else if radicand >= -RADICAND_TOLERANCE * total_variance {
            radicand.max(0.0).sqrt()
        } else {
            volatility
        };

        RiskMetrics {
            volatility,
            beta,
            idiosyncratic_risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};
    use riskscape_data::DataError;
    use rstest::rstest;

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

    const ASSET: [f64; 8] = [100.0, 102.0, 101.0, 104.0, 103.5, 106.0, 105.0, 108.0];
    const MARKET: [f64; 8] = [4700.0, 4720.0, 4710.0, 4750.0, 4745.0, 4770.0, 4760.0, 4790.0];

    #[test]
    fn test_config_defaults() {
        let config = RiskConfig::default();
        assert_eq!(config.annualization_factor, 1.0);
        assert_relative_eq!(RiskConfig::annualized().annualization_factor, 252.0_f64.sqrt());
    }

    #[test]
    fn test_identical_series_has_unit_beta() {
        let estimator = RiskEstimator::default();
        let metrics = estimator
            .estimate(&prices("AAA", &ASSET), &prices("MKT", &ASSET))
            .unwrap();

        assert_relative_eq!(metrics.beta, 1.0, epsilon = 1e-12);
        assert!(metrics.volatility > 0.0);
        assert!(metrics.idiosyncratic_risk < 1e-9);
    }

    #[test]
    fn test_scaled_copy_of_benchmark_has_no_idiosyncratic_risk() {
        let estimator = RiskEstimator::default();
        let market = prices("MKT", &MARKET);
        for multiple in [0.3, 1.1, 3.0, 7.0] {
            let scaled: Vec<f64> = MARKET.iter().map(|p| p * multiple).collect();
            let metrics = estimator
                .estimate(&prices("LEV", &scaled), &market)
                .unwrap();

            assert_relative_eq!(metrics.beta, 1.0, epsilon = 1e-9);
            assert!(metrics.volatility > 0.0);
            assert!(
                metrics.idiosyncratic_risk < 1e-6 * metrics.volatility,
                "multiple {multiple}: idio {} vs vol {}",
                metrics.idiosyncratic_risk,
                metrics.volatility
            );
        }
    }

    #[test]
    fn test_flat_benchmark_has_zero_beta() {
        let estimator = RiskEstimator::default();
        let flat = [100.0; 8];
        let metrics = estimator
            .estimate(&prices("AAA", &ASSET), &prices("MKT", &flat))
            .unwrap();

        assert_eq!(metrics.beta, 0.0);
        assert_eq!(metrics.idiosyncratic_risk, metrics.volatility);
        assert!(metrics.volatility > 0.0);
    }

    #[test]
    fn test_constant_return_benchmark_has_zero_beta() {
        // 10% every period: returns are exactly 0.1 each
        let estimator = RiskEstimator::default();
        let growth = [100.0, 110.0, 121.0];
        let metrics = estimator
            .estimate(&prices("AAA", &[50.0, 51.0, 49.0]), &prices("MKT", &growth))
            .unwrap();

        assert_eq!(metrics.beta, 0.0);
        assert_eq!(metrics.idiosyncratic_risk, metrics.volatility);
    }

    #[test]
    fn test_decomposition() {
        let estimator = RiskEstimator::default();
        let asset = prices("AAA", &ASSET);
        let market = prices("MKT", &MARKET);
        let metrics = estimator.estimate(&asset, &market).unwrap();

        let r = compute_return_series(&asset).unwrap().values();
        let m = compute_return_series(&market).unwrap().values();
        let expected_beta = sample_covariance(&r, &m) / sample_variance(&m);
        let systematic = expected_beta.abs() * sample_std(&m);

        assert_relative_eq!(metrics.volatility, sample_std(&r), epsilon = 1e-15);
        assert_relative_eq!(metrics.beta, expected_beta, epsilon = 1e-12);
        if metrics.volatility > systematic {
            assert_relative_eq!(
                metrics.idiosyncratic_risk,
                (metrics.volatility.powi(2) - systematic.powi(2)).sqrt(),
                epsilon = 1e-12
            );
        } else {
            assert_eq!(metrics.idiosyncratic_risk, metrics.volatility);
        }
        assert!(metrics.idiosyncratic_risk <= metrics.volatility);
    }

    #[test]
    fn test_negative_beta() {
        let estimator = RiskEstimator::default();
        let inverse = [100.0, 98.0, 99.0, 96.0, 96.5, 94.0, 95.0, 92.0];
        let metrics = estimator
            .estimate(&prices("INV", &inverse), &prices("AAA", &ASSET))
            .unwrap();

        assert!(metrics.beta < 0.0);
        assert!(metrics.idiosyncratic_risk <= metrics.volatility);
    }

    #[test]
    fn test_annualization_scales_volatility() {
        let daily = RiskEstimator::default();
        let annual = RiskEstimator::new(RiskConfig::annualized());
        let asset = prices("AAA", &ASSET);
        let market = prices("MKT", &MARKET);

        let d = daily.estimate(&asset, &market).unwrap();
        let a = annual.estimate(&asset, &market).unwrap();

        assert_relative_eq!(a.volatility, d.volatility * 252.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(a.beta, d.beta, epsilon = 1e-12);
    }

    #[test]
    fn test_no_overlap_yields_nan_beta() {
        // All asset returns are dropped after zero closes
        let estimator = RiskEstimator::default();
        let metrics = estimator
            .estimate(&prices("ZZZ", &[0.0, 0.0, 0.0]), &prices("MKT", &MARKET))
            .unwrap();

        assert!(metrics.beta.is_nan());
        assert_eq!(metrics.idiosyncratic_risk, metrics.volatility);
        assert_eq!(metrics.volatility, 0.0);
    }

    #[test]
    fn test_insufficient_symbol_data() {
        let estimator = RiskEstimator::default();
        let result = estimator.estimate(&prices("AAA", &[100.0]), &prices("MKT", &MARKET));
        assert!(matches!(
            result,
            Err(RiskError::Data(DataError::InsufficientData { .. }))
        ));
    }

    #[test]
    fn test_insufficient_benchmark_data() {
        let estimator = RiskEstimator::default();
        let result = estimator.estimate(&prices("AAA", &ASSET), &prices("MKT", &[4700.0]));
        assert!(matches!(result, Err(RiskError::Benchmark { .. })));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(0.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_annualization_factor(#[case] factor: f64) {
        let config = RiskConfig {
            annualization_factor: factor,
        };
        assert!(matches!(config.validate(), Err(RiskError::InvalidConfig(_))));

        let result =
            RiskEstimator::new(config).estimate(&prices("AAA", &ASSET), &prices("MKT", &MARKET));
        assert!(matches!(result, Err(RiskError::InvalidConfig(_))));
    }

    #[test]
    fn test_systematic_risk() {
        let metrics = RiskMetrics {
            volatility: 0.05,
            beta: 1.0,
            idiosyncratic_risk: 0.03,
        };
        assert_relative_eq!(metrics.systematic_risk(), 0.04, epsilon = 1e-12);
    }
}
