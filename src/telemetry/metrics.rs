//! Prometheus metrics
//!
//! The recorder is installed once per process; recording before
//! [`init_metrics`] is a no-op.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tracing::warn;

use crate::adapter::Phase;

/// Global Prometheus handle, `None` if another recorder was already installed
static PROMETHEUS_HANDLE: Lazy<Option<PrometheusHandle>> = Lazy::new(|| {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    Lazy::force(&PROMETHEUS_HANDLE);
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "zbridge_requests_total",
        "Total number of chat completion requests processed"
    );
    metrics::describe_histogram!(
        "zbridge_request_duration_seconds",
        "Time until the upstream response started, in seconds"
    );
    metrics::describe_counter!(
        "zbridge_upstream_errors_total",
        "Upstream failures by phase and status"
    );
}

/// Render metrics in Prometheus text format
pub fn render() -> String {
    PROMETHEUS_HANDLE
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a downstream request outcome
pub fn record_request(status: &str, model: &str, duration_secs: f64) {
    metrics::counter!("zbridge_requests_total", "status" => status.to_string(), "model" => model.to_string())
        .increment(1);
    metrics::histogram!("zbridge_request_duration_seconds", "model" => model.to_string())
        .record(duration_secs);
}

/// Record a failed upstream call; `status` is `None` for transport/parse failures
pub fn record_upstream_error(phase: Phase, status: Option<u16>) {
    let status = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    metrics::counter!(
        "zbridge_upstream_errors_total",
        "phase" => phase.as_str(),
        "status" => status
    )
    .increment(1);
}
