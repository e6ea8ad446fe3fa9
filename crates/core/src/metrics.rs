//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Searches (two-phase fetches, stale responses, latency)
//! - Favorites (toggles, persistence failures)
//! - Match generation

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Search Metrics
// =============================================================================

/// Searches total by result.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchmate_searches_total", "Total searches issued"),
        &["result"], // "applied", "superseded", "failed"
    )
    .unwrap()
});

/// Responses dropped because a newer search was issued.
pub static STALE_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fetchmate_stale_responses_total",
            "Search responses discarded because a newer search was issued",
        ),
        &["phase"], // "ids", "bodies"
    )
    .unwrap()
});

/// End-to-end search duration (ids + bodies) in seconds.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchmate_search_duration_seconds",
            "Duration of two-phase searches",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Favorites Metrics
// =============================================================================

/// Favorite toggles by action.
pub static FAVORITE_TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchmate_favorite_toggles_total", "Total favorite toggles"),
        &["action"], // "added", "removed"
    )
    .unwrap()
});

/// Persistence failures by operation.
pub static PERSISTENCE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fetchmate_persistence_failures_total",
            "Local storage read/write failures",
        ),
        &["operation"], // "read", "write"
    )
    .unwrap()
});

// =============================================================================
// Match Metrics
// =============================================================================

/// Match requests by result.
pub static MATCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchmate_match_requests_total", "Total match requests"),
        &["result"], // "matched", "unresolved", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(STALE_RESPONSES.clone()),
        Box::new(SEARCH_DURATION.clone()),
        // Favorites
        Box::new(FAVORITE_TOGGLES.clone()),
        Box::new(PERSISTENCE_FAILURES.clone()),
        // Match
        Box::new(MATCH_REQUESTS.clone()),
    ]
}
