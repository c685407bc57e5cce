//! Metrics and observability utilities
//!
//! Metric descriptions and recording helpers on top of the `metrics`
//! facade. Nothing is exported unless the host process installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all Cimientos metrics
pub const METRICS_PREFIX: &str = "cimientos";

/// Register all metric descriptions
pub fn register_metrics() {
    // Chat metrics
    describe_counter!(
        format!("{}_chat_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total chat messages answered"
    );

    describe_counter!(
        format!("{}_context_topics_total", METRICS_PREFIX),
        Unit::Count,
        "Knowledge topics included in chat context"
    );

    // Compositor metrics
    describe_histogram!(
        format!("{}_composite_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Floor composite latency in seconds"
    );

    describe_counter!(
        format!("{}_floor_generations_total", METRICS_PREFIX),
        Unit::Count,
        "Total floor simulations requested"
    );

    // Upstream metrics
    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total requests to the completion and image APIs"
    );

    describe_histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Completion and image API latency in seconds"
    );

    tracing::info!("Metrics registered");
}

fn status_label(success: bool) -> String {
    if success { "success" } else { "error" }.to_string()
}

/// Helper to record a chat reply and the topics its context used
pub fn record_chat(topics: &[&'static str], success: bool) {
    counter!(
        format!("{}_chat_requests_total", METRICS_PREFIX),
        "status" => status_label(success)
    )
    .increment(1);

    for topic in topics {
        counter!(
            format!("{}_context_topics_total", METRICS_PREFIX),
            "topic" => *topic
        )
        .increment(1);
    }
}

/// Helper to record compositor metrics
pub fn record_composite(duration_secs: f64, success: bool) {
    histogram!(
        format!("{}_composite_duration_seconds", METRICS_PREFIX),
        "status" => status_label(success)
    )
    .record(duration_secs);
}

/// Helper to record a floor simulation
pub fn record_floor_generation(material: &str, composited: bool, success: bool) {
    counter!(
        format!("{}_floor_generations_total", METRICS_PREFIX),
        "material" => material.to_string(),
        "composited" => composited.to_string(),
        "status" => status_label(success)
    )
    .increment(1);
}

/// Helper to record upstream API metrics
pub fn record_upstream(duration_secs: f64, operation: &'static str, success: bool) {
    counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        "operation" => operation,
        "status" => status_label(success)
    )
    .increment(1);

    histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        "operation" => operation
    )
    .record(duration_secs);
}
