//! Application State
//!
//! Shared state across all handlers. Everything here is read-only after
//! startup.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use translate_relay_backends::FallbackChain;
use translate_relay_config::Settings;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Fallback chain shared by every request
    pub chain: Arc<FallbackChain>,
    /// Loaded configuration
    pub config: Arc<Settings>,
    /// Prometheus handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, chain: FallbackChain) -> Self {
        Self {
            chain: Arc::new(chain),
            config: Arc::new(config),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
