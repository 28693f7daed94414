//! Prometheus metrics
//!
//! The chain records through the `metrics` facade; this module installs the
//! Prometheus recorder and renders it for scraping.

use axum::extract::State;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

/// Install the global Prometheus recorder
///
/// Returns `None` when a recorder is already installed or the exporter
/// cannot be built; the server then runs without `/metrics`.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!(
                "translate_requests_total",
                "Translation requests by final outcome"
            );
            metrics::describe_counter!(
                "translate_backend_attempts_total",
                "Backend attempts by backend and outcome"
            );
            metrics::describe_histogram!(
                "translate_backend_latency_seconds",
                metrics::Unit::Seconds,
                "Time spent in a single backend attempt"
            );
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, ServerError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or(ServerError::MetricsDisabled)
}
