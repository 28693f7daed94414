//! Translation Relay Server
//!
//! HTTP front end for the fallback chain: one translate endpoint, health,
//! supported languages, Prometheus metrics and a small static UI.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use translate_relay_backends::ChainError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] translate_relay_core::Error),

    #[error("Translation unavailable: {0}")]
    Unavailable(#[from] ChainError),

    #[error("Metrics are disabled")]
    MetricsDisabled,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServerError::InvalidRequest(e) => json!({ "error": e.code() }),
            ServerError::Unavailable(e) => json!({
                "error": "translation_unavailable",
                "detail": e.detail(),
            }),
            ServerError::MetricsDisabled => json!({ "error": "metrics_disabled" }),
        };
        (self.status(), Json(body)).into_response()
    }
}
