//! Prometheus metrics for the shell.
//!
//! Holds the process registry: shell command counts plus every metric
//! exported by the core (searches, favorites, matching).

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Shell commands by name and result.
pub static COMMANDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchmate_commands_total", "Shell commands executed"),
        &["command", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Notices shown to the user, by kind.
pub static NOTICES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchmate_notices_total", "Session notices received"),
        &["kind"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(COMMANDS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(NOTICES_TOTAL.clone()))
        .unwrap();

    // Core metrics (search, favorites, match)
    for metric in fetchmate_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_core_metrics() {
        COMMANDS_TOTAL.with_label_values(&["show", "ok"]).inc();
        fetchmate_core::metrics::SEARCHES_TOTAL
            .with_label_values(&["applied"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("fetchmate_commands_total"));
        assert!(output.contains("fetchmate_searches_total"));
    }
}
