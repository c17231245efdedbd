//! Prometheus metrics.
//!
//! Recording functions go through the `metrics` facade and are no-ops
//! until [`init_metrics`] installs a recorder.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "iris_requests_total";
/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "iris_request_duration_seconds";
/// Document counter name.
pub const DOCUMENTS_TOTAL: &str = "iris_documents_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder and returns its render handle.
///
/// Calling it again returns the handle installed first.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is already
/// installed.
pub fn init_metrics() -> TelemetryResult<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let handle = METRICS_HANDLE.get_or_init(|| handle).clone();

    register_metric_descriptions();
    Ok(handle)
}

/// Renders metrics in Prometheus text format, `None` before [`init_metrics`].
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_counter!(DOCUMENTS_TOTAL, "JSON:API documents emitted, by kind");
}

/// Records a completed request.
///
/// `mode` is `json_api` or `bypass`.
pub fn record_request(mode: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "mode" => mode.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "mode" => mode.to_string())
        .record(duration.as_secs_f64());
}

/// Records an emitted document (`single`, `collection`, `relationship`, `errors`).
pub fn record_document(kind: &str) {
    counter!(DOCUMENTS_TOTAL, "kind" => kind.to_string()).increment(1);
}
