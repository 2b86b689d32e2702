//! Conversion of pipeline results into exportable records.

use crate::pipeline::Embedding;
use riskscape_data::{PriceChange, PriceSeries};
use riskscape_embed::{FeatureMatrix, ProjectedPoint};
use riskscape_output::{
    ClusterPoint, FailureRecord, PredictionRecord, PriceRecord, ProjectionPoint, QuoteRecord,
    RiskRecord,
};
use riskscape_risk::RiskBatch;

/// Risk records for successes and failure records for the rest, in batch order.
pub fn risk_records(batch: &RiskBatch) -> (Vec<RiskRecord>, Vec<FailureRecord>) {
    let risks = batch
        .successes()
        .map(|(symbol, m)| {
            RiskRecord::new(
                symbol.to_string(),
                m.volatility,
                m.beta,
                m.idiosyncratic_risk,
            )
        })
        .collect();
    let failures = batch
        .failures()
        .map(|(symbol, e)| FailureRecord::new(symbol.to_string(), e))
        .collect();
    (risks, failures)
}

/// One cluster point per feature row.
pub fn cluster_points(features: &FeatureMatrix, embedding: &Embedding) -> Vec<ClusterPoint> {
    features
        .symbols()
        .zip(embedding.points.iter().zip(&embedding.clusters))
        .map(|(symbol, (p, &cluster))| ClusterPoint::new(symbol.to_string(), p.x, p.y, cluster))
        .collect()
}

/// One projection point per feature row.
pub fn projection_points(
    features: &FeatureMatrix,
    points: &[ProjectedPoint],
) -> Vec<ProjectionPoint> {
    features
        .symbols()
        .zip(points)
        .map(|(symbol, p)| ProjectionPoint::new(symbol.to_string(), p.x, p.y))
        .collect()
}

/// Observed and predicted targets per feature row.
pub fn prediction_records(
    features: &FeatureMatrix,
    observed: &[f64],
    predicted: &[f64],
) -> Vec<PredictionRecord> {
    features
        .symbols()
        .zip(observed.iter().zip(predicted))
        .map(|(symbol, (&o, &p))| PredictionRecord::new(symbol.to_string(), o, p))
        .collect()
}

/// Quote record from the last two closes.
pub fn quote_record(symbol: &str, change: PriceChange) -> QuoteRecord {
    QuoteRecord {
        symbol: symbol.to_string(),
        last_close: change.last_close,
        latest_close: change.latest_close,
        change: change.change,
        change_pct: change.change_pct,
    }
}

/// One record per close, oldest first.
pub fn price_records(series: &PriceSeries) -> Vec<PriceRecord> {
    series
        .points()
        .iter()
        .map(|p| PriceRecord {
            symbol: series.symbol().to_string(),
            date: p.date,
            close: p.close,
        })
        .collect()
}
