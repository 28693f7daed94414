//! HTTP Endpoints
//!
//! REST API for the translation relay.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use translate_relay_core::{supported_languages, BackendKind, TranslationRequest, TranslationResult};

use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );

    Router::new()
        .route("/", get(index))
        .route("/translate", post(translate))
        .route("/healthz", get(health_check))
        .route("/languages", get(list_languages))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - disabled: no cross-origin access (the bundled UI is same-origin)
/// - enabled without origins: any origin may call the API
/// - otherwise: only the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        tracing::info!("No CORS origins configured, allowing any origin");
        return base.allow_origin(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, disabling cross-origin access");
        return CorsLayer::new();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    base.allow_origin(parsed_origins)
}

/// Translate request body
///
/// Every field is optional at the wire level; a missing `text` is the same
/// as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct TranslateBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Successful translate response
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated: String,
    pub used: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_src: Option<String>,
}

impl From<TranslationResult> for TranslateResponse {
    fn from(result: TranslationResult) -> Self {
        Self {
            translated: result.translated_text,
            used: result.used_backend,
            model: result.model,
            detected_src: result.detected_source,
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `POST /translate`
async fn translate(
    State(state): State<AppState>,
    body: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ServerError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable translate body, treating as empty");
            TranslateBody::default()
        }
    };

    let request = TranslationRequest::new(
        body.text.unwrap_or_default(),
        body.source,
        body.target,
    )
    .map_err(|e| {
        metrics::counter!("translate_requests_total", "outcome" => "invalid").increment(1);
        e
    })?;

    tracing::info!(
        source = %request.source(),
        target = %request.target(),
        chars = request.text().chars().count(),
        "Translate request"
    );

    let result = state.chain.resolve(&request).await.map_err(|e| {
        if let translate_relay_backends::ChainError::Exhausted { failures, .. } = &e {
            for (kind, cause) in failures {
                tracing::debug!(backend = %kind, cause = %cause, "Backend failure detail");
            }
        }
        e
    })?;

    tracing::info!(used = %result.used_backend, "Translation served");
    Ok(Json(result.into()))
}

/// `GET /healthz`
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let now = chrono::Utc::now();
    let time = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0;

    Json(json!({
        "status": "ok",
        "time": time,
        "backends": state.chain.backend_status(),
    }))
}

/// `GET /languages`
async fn list_languages() -> Json<Value> {
    Json(json!({ "languages": supported_languages() }))
}
