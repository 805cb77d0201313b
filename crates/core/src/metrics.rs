//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Coordinator (search duration, ranked candidates, provider outcomes)
//! - Policing (rejected checks)
//! - Fetch (retries)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

// =============================================================================
// Coordinator
// =============================================================================

/// Final status of every provider that took part in a search.
pub static PROVIDER_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scout_provider_outcomes_total",
            "Provider outcomes per search",
        ),
        &["provider", "status"], // "succeeded", "policed", "fetch_failed", ...
    )
    .unwrap()
});

/// Search duration in seconds, by final state.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("scout_search_duration_seconds", "Duration of a search")
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["state"],
    )
    .unwrap()
});

/// Candidates in the ranked list of a search.
pub static CANDIDATES_RANKED: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "scout_candidates_ranked",
            "Number of ranked candidates per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
    )
    .unwrap()
});

// =============================================================================
// Policing
// =============================================================================

/// Provider checks rejected by the request police.
pub static POLICED_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scout_policed_checks_total",
            "Provider requests rejected by quota policing",
        ),
        &["provider", "reason"], // "score_exceeded", "daily_exceeded", "invalid_configuration"
    )
    .unwrap()
});

// =============================================================================
// Fetch
// =============================================================================

/// Retry attempts made by the fetch session.
pub static FETCH_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("scout_fetch_retries_total", "Total HTTP retry attempts").unwrap()
});

/// Get all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PROVIDER_OUTCOMES.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(CANDIDATES_RANKED.clone()),
        Box::new(POLICED_CHECKS.clone()),
        Box::new(FETCH_RETRIES.clone()),
    ]
}

/// Render every core metric in the Prometheus text exposition format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    for collector in all_metrics() {
        registry.register(collector)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_text_includes_core_metrics() {
        FETCH_RETRIES.inc();
        POLICED_CHECKS
            .with_label_values(&["metrics-test", "daily_exceeded"])
            .inc();

        let text = gather_text().unwrap();
        assert!(text.contains("scout_fetch_retries_total"));
        assert!(text.contains("scout_policed_checks_total"));
        assert!(text.contains("metrics-test"));
    }
}
