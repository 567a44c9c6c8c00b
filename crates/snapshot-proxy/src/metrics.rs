//! Prometheus metrics for snapshot-proxy.
//!
//! Tracks where each response came from, upstream failures by kind, and
//! cache activity.
use hyper::Method;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Total number of proxied requests by response source
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "snapshot_proxy_requests_total",
        "Total number of proxied requests",
        &["method", "source"]  // source: upstream|cache|upstream_unvalidated|error
    )
    .unwrap();

    /// Upstream failures by kind
    pub static ref UPSTREAM_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "snapshot_proxy_upstream_failures_total",
        "Total number of requests that failed before a response could be chosen",
        &["kind"]
    )
    .unwrap();

    /// Cache reads and writes
    pub static ref CACHE_OPERATIONS_TOTAL: CounterVec = register_counter_vec!(
        "snapshot_proxy_cache_operations_total",
        "Total number of snapshot cache operations",
        &["operation", "result"]  // operation: read|write, result: hit|miss|stored|error|corrupt
    )
    .unwrap();

    /// Upstream request duration
    pub static ref UPSTREAM_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "snapshot_proxy_upstream_duration_ms",
        "Duration of upstream requests including body drain",
        &["method", "status"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Label for a request method. Extension methods share `other` so clients
/// can't grow the label set.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::HEAD => "HEAD",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::OPTIONS => "OPTIONS",
        Method::PATCH => "PATCH",
        Method::TRACE => "TRACE",
        Method::CONNECT => "CONNECT",
        _ => "other",
    }
}

/// Helper to record which snapshot was sent for a request
pub fn record_request(method: &str, source: &str) {
    REQUESTS_TOTAL.with_label_values(&[method, source]).inc();
}

/// Helper to record an upstream failure
pub fn record_upstream_failure(kind: &str) {
    UPSTREAM_FAILURES_TOTAL.with_label_values(&[kind]).inc();
}

/// Helper to record a cache operation
pub fn record_cache_op(operation: &str, result: &str) {
    CACHE_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

/// Helper to record upstream request duration
pub fn record_upstream_duration(method: &str, status: u16, duration_ms: f64) {
    UPSTREAM_REQUEST_DURATION_MS
        .with_label_values(&[method, &status.to_string()])
        .observe(duration_ms);
}
