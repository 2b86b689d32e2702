//! Human-readable reports of a pipeline run.

use crate::export::{
    ClusterPoint, ExportError, FailureRecord, PredictionRecord, ProjectionPoint, RiskRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Results of one pipeline run against a benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Benchmark symbol.
    pub benchmark: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// History length in years.
    pub period_years: u32,

    /// Per-symbol risk metrics.
    pub risks: Vec<RiskRecord>,

    /// Embedding with cluster ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterPoint>,

    /// Embedding without clustering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projections: Vec<ProjectionPoint>,

    /// Ridge predictions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predictions: Vec<PredictionRecord>,

    /// Symbols that could not be processed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
}

fn fmt_beta(beta: Option<f64>) -> String {
    beta.map_or_else(|| "n/a".to_string(), |b| format!("{b:.3}"))
}

impl Report {
    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a plain-text table for terminals.
    pub fn to_ascii_table(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("\nRisk Report vs {}\n", self.benchmark));
        out.push_str(&format!(
            "Generated: {} ({}y history)\n",
            self.timestamp.format("%Y-%m-%d %H:%M UTC"),
            self.period_years
        ));
        out.push_str(&"=".repeat(64));
        out.push('\n');

        if !self.risks.is_empty() {
            out.push_str(&format!(
                "{:<10} {:>14} {:>10} {:>16}\n",
                "Symbol", "Volatility", "Beta", "Idiosyncratic"
            ));
            out.push_str(&"-".repeat(64));
            out.push('\n');
            for r in &self.risks {
                out.push_str(&format!(
                    "{:<10} {:>13.4}% {:>10} {:>15.4}%\n",
                    r.symbol,
                    r.volatility * 100.0,
                    fmt_beta(r.beta),
                    r.idiosyncratic_risk * 100.0
                ));
            }
        }

        if !self.clusters.is_empty() {
            out.push_str("\nClusters:\n");
            out.push_str(&"-".repeat(64));
            out.push('\n');
            for p in &self.clusters {
                out.push_str(&format!(
                    "{:<10} cluster {:>2}  ({:>8.4}, {:>8.4})\n",
                    p.ticker, p.cluster, p.x, p.y
                ));
            }
        }

        if !self.projections.is_empty() {
            out.push_str("\nProjection:\n");
            out.push_str(&"-".repeat(64));
            out.push('\n');
            for p in &self.projections {
                out.push_str(&format!("{:<10} ({:>8.4}, {:>8.4})\n", p.ticker, p.x, p.y));
            }
        }

        if !self.predictions.is_empty() {
            out.push_str("\nPredicted Idiosyncratic Risk:\n");
            out.push_str(&"-".repeat(64));
            out.push('\n');
            for p in &self.predictions {
                out.push_str(&format!(
                    "{:<10} observed {:>8.4}%  predicted {:>8.4}%\n",
                    p.symbol,
                    p.idiosyncratic_risk * 100.0,
                    p.predicted_risk * 100.0
                ));
            }
        }

        if !self.failures.is_empty() {
            out.push_str("\nSkipped:\n");
            for f in &self.failures {
                out.push_str(&format!("  {}: {}\n", f.symbol, f.error));
            }
        }

        out
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("# Risk Report vs {}\n\n", self.benchmark));
        out.push_str(&format!(
            "**Generated:** {} ({} years of history)\n\n",
            self.timestamp.format("%Y-%m-%d %H:%M UTC"),
            self.period_years
        ));

        if !self.risks.is_empty() {
            out.push_str("## Risk Metrics\n\n");
            out.push_str("| Symbol | Volatility | Beta | Idiosyncratic Risk |\n");
            out.push_str("|--------|-----------:|-----:|-------------------:|\n");
            for r in &self.risks {
                out.push_str(&format!(
                    "| {} | {:.4}% | {} | {:.4}% |\n",
                    r.symbol,
                    r.volatility * 100.0,
                    fmt_beta(r.beta),
                    r.idiosyncratic_risk * 100.0
                ));
            }
            out.push('\n');
        }

        if !self.clusters.is_empty() {
            out.push_str("## Clusters\n\n");
            out.push_str("| Symbol | Cluster | x | y |\n");
            out.push_str("|--------|--------:|--:|--:|\n");
            for p in &self.clusters {
                out.push_str(&format!("| {} | {} | {:.4} | {:.4} |\n", p.ticker, p.cluster, p.x, p.y));
            }
            out.push('\n');
        }

        if !self.projections.is_empty() {
            out.push_str("## Projection\n\n");
            out.push_str("| Symbol | x | y |\n");
            out.push_str("|--------|--:|--:|\n");
            for p in &self.projections {
                out.push_str(&format!("| {} | {:.4} | {:.4} |\n", p.ticker, p.x, p.y));
            }
            out.push('\n');
        }

        if !self.predictions.is_empty() {
            out.push_str("## Predicted Idiosyncratic Risk\n\n");
            out.push_str("| Symbol | Observed | Predicted |\n");
            out.push_str("|--------|---------:|----------:|\n");
            for p in &self.predictions {
                out.push_str(&format!(
                    "| {} | {:.4}% | {:.4}% |\n",
                    p.symbol,
                    p.idiosyncratic_risk * 100.0,
                    p.predicted_risk * 100.0
                ));
            }
            out.push('\n');
        }

        if !self.failures.is_empty() {
            out.push_str("## Skipped\n\n");
            for f in &self.failures {
                out.push_str(&format!("- **{}**: {}\n", f.symbol, f.error));
            }
            out.push('\n');
        }

        out
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    benchmark: Option<String>,
    period_years: Option<u32>,
    risks: Vec<RiskRecord>,
    clusters: Vec<ClusterPoint>,
    projections: Vec<ProjectionPoint>,
    predictions: Vec<PredictionRecord>,
    failures: Vec<FailureRecord>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the benchmark.
    pub fn benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    /// Set the history length.
    pub const fn period_years(mut self, years: u32) -> Self {
        self.period_years = Some(years);
        self
    }

    /// Set the risk metrics.
    pub fn risks(mut self, risks: Vec<RiskRecord>) -> Self {
        self.risks = risks;
        self
    }

    /// Set the cluster points.
    pub fn clusters(mut self, clusters: Vec<ClusterPoint>) -> Self {
        self.clusters = clusters;
        self
    }

    /// Set the projection points.
    pub fn projections(mut self, projections: Vec<ProjectionPoint>) -> Self {
        self.projections = projections;
        self
    }

    /// Set the predictions.
    pub fn predictions(mut self, predictions: Vec<PredictionRecord>) -> Self {
        self.predictions = predictions;
        self
    }

    /// Set the failed symbols.
    pub fn failures(mut self, failures: Vec<FailureRecord>) -> Self {
        self.failures = failures;
        self
    }

    /// Build the report.
    pub fn build(self) -> Report {
        Report {
            benchmark: self.benchmark.unwrap_or_else(|| "^GSPC".to_string()),
            timestamp: Utc::now(),
            period_years: self.period_years.unwrap_or(3),
            risks: self.risks,
            clusters: self.clusters,
            projections: self.projections,
            predictions: self.predictions,
            failures: self.failures,
        }
    }
}
