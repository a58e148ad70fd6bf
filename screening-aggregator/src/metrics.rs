//! Metrics collection for observability
//!
//! Prometheus metrics for the screening aggregator, kept on their own
//! registry so several aggregators can live in one process.
//!
//! # Metrics
//!
//! - `screening_requests_total` - Screenings started
//! - `screening_failures_total` - Screenings that returned an error
//! - `screening_source_failures_total{source}` - Failed source calls per list
//! - `screening_matches_total` - Matches returned after deduplication
//! - `screening_duration_seconds` - Histogram of screening latencies

use crate::types::SourceKind;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Screenings started
    pub requests_total: IntCounter,

    /// Screenings that failed as a whole
    pub failures_total: IntCounter,

    /// Failed source calls, labelled by source
    pub source_failures_total: IntCounterVec,

    /// Matches returned
    pub matches_total: IntCounter,

    /// Screening duration histogram
    pub duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let requests_total =
            IntCounter::new("screening_requests_total", "Total number of screenings started")?;
        registry.register(Box::new(requests_total.clone()))?;

        let failures_total = IntCounter::new(
            "screening_failures_total",
            "Total number of screenings that returned an error",
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let source_failures_total = IntCounterVec::new(
            Opts::new(
                "screening_source_failures_total",
                "Total number of failed or timed out source calls",
            ),
            &["source"],
        )?;
        registry.register(Box::new(source_failures_total.clone()))?;

        let matches_total = IntCounter::new(
            "screening_matches_total",
            "Total number of matches returned after deduplication",
        )?;
        registry.register(Box::new(matches_total.clone()))?;

        let duration = Histogram::with_opts(
            HistogramOpts::new("screening_duration_seconds", "Histogram of screening latencies")
                .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 5.0]),
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            requests_total,
            failures_total,
            source_failures_total,
            matches_total,
            duration,
            registry,
        })
    }

    /// Record a failed call to `source`
    pub fn record_source_failure(&self, source: SourceKind) {
        self.source_failures_total
            .with_label_values(&[source.label()])
            .inc();
    }

    /// Record a completed screening
    pub fn record_success(&self, matches: usize, elapsed_secs: f64) {
        self.matches_total.inc_by(matches as u64);
        self.duration.observe(elapsed_secs);
    }

    /// Record a screening that ended in error
    pub fn record_failure(&self, elapsed_secs: f64) {
        self.failures_total.inc();
        self.duration.observe(elapsed_secs);
    }

    /// Render all metrics in the text exposition format
    pub fn gather_text(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("requests_total", &self.requests_total.get())
            .field("failures_total", &self.failures_total.get())
            .field("matches_total", &self.matches_total.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.requests_total.get(), 0);
        // Independent registries, no duplicate registration error
        assert!(Metrics::new().is_ok());
    }

    #[test]
    fn test_gather_text() {
        let metrics = Metrics::new().unwrap();
        metrics.requests_total.inc();
        metrics.record_source_failure(SourceKind::UkHmt);
        metrics.record_success(3, 0.02);

        let text = metrics.gather_text().unwrap();
        assert!(text.contains("screening_requests_total 1"));
        assert!(text.contains("screening_source_failures_total{source=\"UK_HMT\"} 1"));
        assert!(text.contains("screening_matches_total 3"));
        assert!(text.contains("screening_duration_seconds_count 1"));
    }
}
