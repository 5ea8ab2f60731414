//! Prometheus metrics for release-management observability.

use metrics::counter;

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a publish admission decision (created / existing / conflict).
pub fn publish_admission(outcome: &str) {
    counter!("publish_admissions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an application creation.
pub fn app_created() {
    counter!("apps_created_total").increment(1);
}

/// Record an iteration binding.
pub fn iteration_created() {
    counter!("iterations_created_total").increment(1);
}

/// Record an outbound source-control API call.
pub fn scm_request(endpoint: &str) {
    counter!("scm_requests_total", "endpoint" => endpoint.to_string()).increment(1);
}
