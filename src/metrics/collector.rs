//! Metrics collection using Prometheus
//!
//! This module records ingestion outcomes of the rating engine.

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for the rating engine
#[derive(Clone)]
pub struct RatingMetrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Matches applied, by normalized tier
    pub matches_ingested_total: IntCounterVec,

    /// Matches refused, by error kind
    pub matches_rejected_total: IntCounterVec,

    /// Predictions served
    pub predictions_total: IntCounter,

    /// Records whose decay was settled by a sweep
    pub decay_settlements_total: IntCounter,

    /// Absolute rating change per side per match
    pub rating_delta_abs: Histogram,

    /// Entities in the store
    pub rated_entities: IntGauge,
}

impl RatingMetrics {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let matches_ingested_total = IntCounterVec::new(
            Opts::new("dota_elo_matches_ingested_total", "Total matches applied"),
            &["tier"],
        )?;
        registry.register(Box::new(matches_ingested_total.clone()))?;

        let matches_rejected_total = IntCounterVec::new(
            Opts::new("dota_elo_matches_rejected_total", "Total matches rejected"),
            &["reason"],
        )?;
        registry.register(Box::new(matches_rejected_total.clone()))?;

        let predictions_total =
            IntCounter::new("dota_elo_predictions_total", "Total predictions served")?;
        registry.register(Box::new(predictions_total.clone()))?;

        let decay_settlements_total = IntCounter::new(
            "dota_elo_decay_settlements_total",
            "Total records settled by decay sweeps",
        )?;
        registry.register(Box::new(decay_settlements_total.clone()))?;

        let rating_delta_abs = Histogram::with_opts(
            HistogramOpts::new(
                "dota_elo_rating_delta_abs",
                "Absolute rating change per side per match",
            )
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 45.0, 60.0]),
        )?;
        registry.register(Box::new(rating_delta_abs.clone()))?;

        let rated_entities = IntGauge::new("dota_elo_rated_entities", "Entities in the store")?;
        registry.register(Box::new(rated_entities.clone()))?;

        Ok(Self {
            registry,
            matches_ingested_total,
            matches_rejected_total,
            predictions_total,
            decay_settlements_total,
            rating_delta_abs,
            rated_entities,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record an applied match
    pub fn record_ingested(&self, tier: &str, delta_a: f64, delta_b: f64, entities: usize) {
        let tier = if tier.is_empty() { "unknown" } else { tier };

        self.matches_ingested_total.with_label_values(&[tier]).inc();
        self.rating_delta_abs.observe(delta_a.abs());
        self.rating_delta_abs.observe(delta_b.abs());
        self.rated_entities.set(entities as i64);
    }

    /// Record a refused match
    pub fn record_rejected(&self, reason: &str) {
        self.matches_rejected_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_prediction(&self) {
        self.predictions_total.inc();
    }

    pub fn record_decay_settlements(&self, count: u64) {
        self.decay_settlements_total.inc_by(count);
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = RatingMetrics::new().unwrap();
        assert!(metrics.registry().gather().len() >= 4);
    }

    #[test]
    fn test_record_ingested_and_rejected() {
        let metrics = RatingMetrics::new().unwrap();

        metrics.record_ingested("ti", 12.0, -12.0, 2);
        metrics.record_ingested("", 3.0, -3.0, 4);
        metrics.record_rejected("out_of_order");

        assert_eq!(
            metrics.matches_ingested_total.with_label_values(&["ti"]).get(),
            1
        );
        assert_eq!(
            metrics
                .matches_ingested_total
                .with_label_values(&["unknown"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .matches_rejected_total
                .with_label_values(&["out_of_order"])
                .get(),
            1
        );
        assert_eq!(metrics.rating_delta_abs.get_sample_count(), 4);
        assert_eq!(metrics.rated_entities.get(), 4);
    }

    #[test]
    fn test_encode_text() {
        let metrics = RatingMetrics::new().unwrap();
        metrics.record_prediction();

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("dota_elo_predictions_total 1"));
    }
}
