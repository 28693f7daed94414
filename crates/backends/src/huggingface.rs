//! Hugging Face hosted inference backend
//!
//! Posts the text to `{endpoint}/{model}` with a bearer token. A 503 means
//! the model is still loading; it is reported as a failure and left to the
//! chain, never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use translate_relay_core::{BackendKind, ModelIdentifier, TranslationRequest, TranslationResult};

use crate::backend::TranslationBackend;
use crate::normalize::extract_inference_text;
use crate::BackendError;

/// Remote inference configuration
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// API key; without one the backend is unavailable
    pub api_key: Option<String>,
    /// Base URL; the model identifier is appended as a path
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: translate_relay_config::constants::endpoints::HF_INFERENCE_DEFAULT
                .to_string(),
            timeout: Duration::from_secs(
                translate_relay_config::constants::timeouts::INFERENCE_SECS,
            ),
        }
    }
}

impl From<&translate_relay_config::InferenceConfig> for HuggingFaceConfig {
    fn from(config: &translate_relay_config::InferenceConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Hugging Face Inference API backend
#[derive(Clone)]
pub struct HuggingFaceInferenceBackend {
    client: Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceInferenceBackend {
    /// Create a new backend; fails only if the HTTP client cannot be built
    pub fn new(config: HuggingFaceConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn model_url(&self, model: &ModelIdentifier) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), model)
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Call the inference endpoint and normalize whatever shape comes back
    pub async fn call(&self, model: &ModelIdentifier, text: &str) -> Result<String, BackendError> {
        let mut request = self
            .client
            .post(self.model_url(model))
            .json(&InferenceRequest { inputs: text });

        if let Some(key) = self.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(BackendError::ModelLoading);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        Ok(extract_inference_text(&data))
    }
}

#[async_trait]
impl TranslationBackend for HuggingFaceInferenceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HuggingfaceInference
    }

    fn is_available(&self) -> bool {
        self.api_key().is_some()
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
        model: Option<&ModelIdentifier>,
    ) -> Result<TranslationResult, BackendError> {
        let model = model.ok_or(BackendError::MissingModel)?;
        let translated = self.call(model, request.text()).await?;
        Ok(TranslationResult::from_model(translated, self.kind(), model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::json;
    use translate_relay_core::derive_model_identifier;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/models", addr)
    }

    fn backend(endpoint: String) -> HuggingFaceInferenceBackend {
        HuggingFaceInferenceBackend::new(HuggingFaceConfig {
            api_key: Some("hf_test".to_string()),
            endpoint,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_availability_requires_key() {
        let mut config = HuggingFaceConfig::default();
        let backend = HuggingFaceInferenceBackend::new(config.clone()).unwrap();
        assert!(!backend.is_available());

        config.api_key = Some(" ".to_string());
        let backend = HuggingFaceInferenceBackend::new(config.clone()).unwrap();
        assert!(!backend.is_available());

        config.api_key = Some("hf_abc".to_string());
        let backend = HuggingFaceInferenceBackend::new(config).unwrap();
        assert!(backend.is_available());
    }

    #[test]
    fn test_model_url() {
        let backend = backend("https://example.com/models/".to_string());
        let model = derive_model_identifier("es", "en").unwrap();
        assert_eq!(
            backend.model_url(&model),
            "https://example.com/models/Helsinki-NLP/opus-mt-es-en"
        );
    }

    #[tokio::test]
    async fn test_translation_success() {
        let router = Router::new().route(
            "/models/Helsinki-NLP/opus-mt-es-en",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["inputs"], "Hola");
                Json(json!([{ "translation_text": "Hello" }]))
            }),
        );
        let backend = backend(serve(router).await);
        let request = TranslationRequest::new("Hola", Some("es".into()), None).unwrap();
        let model = request.model_identifier();

        let result = backend.translate(&request, model.as_ref()).await.unwrap();
        assert_eq!(result.translated_text, "Hello");
        assert_eq!(result.used_backend, BackendKind::HuggingfaceInference);
        assert_eq!(result.model.as_deref(), Some("Helsinki-NLP/opus-mt-es-en"));
        assert!(result.detected_source.is_none());
    }

    #[tokio::test]
    async fn test_model_loading_is_distinct() {
        let router = Router::new().route(
            "/models/Helsinki-NLP/opus-mt-en-fr",
            post(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "loading") }),
        );
        let backend = backend(serve(router).await);
        let model = derive_model_identifier("en", "fr").unwrap();

        let err = backend.call(&model, "Hello").await.unwrap_err();
        assert!(matches!(err, BackendError::ModelLoading));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_non_success_carries_status_and_body() {
        let router = Router::new().route(
            "/models/Helsinki-NLP/opus-mt-en-fr",
            post(|| async { (AxumStatus::UNAUTHORIZED, "bad token") }),
        );
        let backend = backend(serve(router).await);
        let model = derive_model_identifier("en", "fr").unwrap();

        match backend.call(&model, "Hello").await.unwrap_err() {
            BackendError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let router = Router::new().route(
            "/models/Helsinki-NLP/opus-mt-en-fr",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!([{ "translation_text": "Bonjour" }]))
            }),
        );
        let backend = HuggingFaceInferenceBackend::new(HuggingFaceConfig {
            api_key: Some("hf_test".to_string()),
            endpoint: serve(router).await,
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let model = derive_model_identifier("en", "fr").unwrap();

        let err = backend.call(&model, "Hello").await.unwrap_err();
        assert!(matches!(err, BackendError::Timeout));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_model_fails() {
        let backend = backend("http://127.0.0.1:9/models".to_string());
        let request = TranslationRequest::new("Hola", Some("xx".into()), None).unwrap();
        let err = backend.translate(&request, None).await.unwrap_err();
        assert!(matches!(err, BackendError::MissingModel));
    }
}
