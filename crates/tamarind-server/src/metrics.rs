//! Metrics module
//!
//! Describes the counters emitted across the workspace and exposes them in
//! Prometheus text format.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize metric descriptions
pub fn init_metrics() {
    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");

    // Config metrics
    describe_counter!(
        "config_publish_total",
        "Total number of config publish operations"
    );
    describe_counter!(
        "config_query_total",
        "Total number of config query operations"
    );

    // Cache metrics
    describe_counter!("cache_hits_total", "Total number of config cache hits");
    describe_counter!("cache_misses_total", "Total number of config cache misses");

    // Audit metrics
    describe_counter!(
        "audit_events_dropped_total",
        "Audit events dropped because the queue was full or closed"
    );
    describe_counter!(
        "audit_events_failed_total",
        "Audit events the broker did not accept"
    );
    describe_counter!(
        "audit_events_delivered_total",
        "Audit events handed to the broker"
    );

    tracing::info!("Metrics initialized");
}

/// Install the global Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, route: &str, status: u16) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
