//! Fallback chain
//!
//! Tries each eligible backend in fixed priority order and returns the
//! first success. A failed step is logged and the next one runs; nothing is
//! retried.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use translate_relay_core::{BackendKind, TranslationRequest, TranslationResult};

use crate::backend::TranslationBackend;
use crate::ChainError;

/// Client-facing hint returned when no backend produced a translation
pub const UNAVAILABLE_DETAIL: &str = "No translation backend available. Set HUGGINGFACE_API_KEY, \
enable USE_LOCAL_TRANSFORMERS on a build with the local-inference feature, or build with the \
google-fallback feature.";

/// Availability of one registered backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub kind: BackendKind,
    pub available: bool,
}

/// Ordered set of backends shared by every request
pub struct FallbackChain {
    backends: Vec<Arc<dyn TranslationBackend>>,
}

impl FallbackChain {
    /// Build a chain; backends are ordered by kind priority, so
    /// registration order does not matter
    pub fn new(mut backends: Vec<Arc<dyn TranslationBackend>>) -> Self {
        backends.sort_by_key(|b| b.kind().priority());
        Self { backends }
    }

    /// Availability of every registered backend, in chain order
    pub fn backend_status(&self) -> Vec<BackendStatus> {
        self.backends
            .iter()
            .map(|b| BackendStatus {
                kind: b.kind(),
                available: b.is_available(),
            })
            .collect()
    }

    /// Backends that would be attempted for this request, in order
    pub fn eligible_backends(&self, request: &TranslationRequest) -> Vec<BackendKind> {
        let has_model = request.model_identifier().is_some();
        self.backends
            .iter()
            .filter(|b| Self::is_eligible(b.as_ref(), has_model))
            .map(|b| b.kind())
            .collect()
    }

    fn is_eligible(backend: &dyn TranslationBackend, has_model: bool) -> bool {
        backend.is_available() && (has_model || !backend.kind().requires_model())
    }

    /// Resolve a request to the first successful translation
    pub async fn resolve(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, ChainError> {
        let model = request.model_identifier();

        if request.is_auto_source() && model.is_some() {
            tracing::debug!(
                target_lang = %request.target(),
                "Auto source: model-based backends assume English input"
            );
        }

        let mut failures = Vec::new();

        for backend in &self.backends {
            let kind = backend.kind();

            if !Self::is_eligible(backend.as_ref(), model.is_some()) {
                tracing::debug!(
                    backend = %kind,
                    available = backend.is_available(),
                    has_model = model.is_some(),
                    "Skipping ineligible backend"
                );
                continue;
            }

            let start = Instant::now();
            let outcome = backend.translate(request, model.as_ref()).await;
            metrics::histogram!("translate_backend_latency_seconds", "backend" => kind.as_str())
                .record(start.elapsed().as_secs_f64());

            match outcome {
                Ok(result) => {
                    metrics::counter!(
                        "translate_backend_attempts_total",
                        "backend" => kind.as_str(),
                        "outcome" => "success"
                    )
                    .increment(1);
                    metrics::counter!("translate_requests_total", "outcome" => "success")
                        .increment(1);

                    tracing::debug!(
                        backend = %kind,
                        model = ?result.model,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Translation succeeded"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    metrics::counter!(
                        "translate_backend_attempts_total",
                        "backend" => kind.as_str(),
                        "outcome" => "failure"
                    )
                    .increment(1);

                    tracing::warn!(
                        backend = %kind,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Backend failed, trying next"
                    );
                    failures.push((kind, e.to_string()));
                }
            }
        }

        metrics::counter!("translate_requests_total", "outcome" => "unavailable").increment(1);

        if failures.is_empty() {
            tracing::error!("No eligible translation backend for request");
        } else {
            tracing::error!(attempted = failures.len(), "All translation backends failed");
        }

        Err(ChainError::Exhausted {
            detail: UNAVAILABLE_DETAIL.to_string(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use translate_relay_core::ModelIdentifier;

    use super::*;
    use crate::BackendError;

    /// Backend that replays a fixed outcome and counts attempts
    struct Scripted {
        kind: BackendKind,
        available: bool,
        outcome: fn(BackendKind, Option<&ModelIdentifier>) -> Result<TranslationResult, BackendError>,
        attempts: AtomicUsize,
    }

    impl Scripted {
        fn new(
            kind: BackendKind,
            available: bool,
            outcome: fn(
                BackendKind,
                Option<&ModelIdentifier>,
            ) -> Result<TranslationResult, BackendError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                kind,
                available,
                outcome,
                attempts: AtomicUsize::new(0),
            })
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationBackend for Scripted {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn translate(
            &self,
            _request: &TranslationRequest,
            model: Option<&ModelIdentifier>,
        ) -> Result<TranslationResult, BackendError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            (self.outcome)(self.kind, model)
        }
    }

    fn model_ok(
        kind: BackendKind,
        model: Option<&ModelIdentifier>,
    ) -> Result<TranslationResult, BackendError> {
        let model = model.ok_or(BackendError::MissingModel)?;
        Ok(TranslationResult::from_model("Hello", kind, model))
    }

    fn google_ok(
        kind: BackendKind,
        _model: Option<&ModelIdentifier>,
    ) -> Result<TranslationResult, BackendError> {
        Ok(TranslationResult::detected("Hello", kind, Some("es".to_string())))
    }

    fn loading(
        _kind: BackendKind,
        _model: Option<&ModelIdentifier>,
    ) -> Result<TranslationResult, BackendError> {
        Err(BackendError::ModelLoading)
    }

    fn chain_of(backends: &[&Arc<Scripted>]) -> FallbackChain {
        FallbackChain::new(
            backends
                .iter()
                .map(|b| Arc::clone(*b) as Arc<dyn TranslationBackend>)
                .collect(),
        )
    }

    fn request(source: Option<&str>) -> TranslationRequest {
        TranslationRequest::new("Hola", source.map(str::to_string), Some("en".into())).unwrap()
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, true, model_ok);
        let google = Scripted::new(BackendKind::GoogletransFallback, true, google_ok);
        let chain = chain_of(&[&remote, &google]);

        let result = chain.resolve(&request(Some("es"))).await.unwrap();
        assert_eq!(result.used_backend, BackendKind::HuggingfaceInference);
        assert_eq!(result.model.as_deref(), Some("Helsinki-NLP/opus-mt-es-en"));
        assert_eq!(remote.attempts(), 1);
        assert_eq!(google.attempts(), 0);
    }

    #[tokio::test]
    async fn test_model_loading_moves_on_without_retry() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, true, loading);
        let google = Scripted::new(BackendKind::GoogletransFallback, true, google_ok);
        let chain = chain_of(&[&remote, &google]);

        let result = chain.resolve(&request(Some("es"))).await.unwrap();
        assert_eq!(result.used_backend, BackendKind::GoogletransFallback);
        assert_eq!(result.detected_source.as_deref(), Some("es"));
        assert_eq!(remote.attempts(), 1);
        assert_eq!(google.attempts(), 1);
    }

    #[tokio::test]
    async fn test_only_google_eligible() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, false, model_ok);
        let local = Scripted::new(BackendKind::LocalTransformers, false, model_ok);
        let google = Scripted::new(BackendKind::GoogletransFallback, true, google_ok);
        let chain = chain_of(&[&google, &local, &remote]);

        let result = chain.resolve(&request(None)).await.unwrap();
        assert_eq!(result.used_backend, BackendKind::GoogletransFallback);
        assert_eq!(result.detected_source.as_deref(), Some("es"));
        assert!(result.model.is_none());
        assert_eq!(remote.attempts(), 0);
        assert_eq!(local.attempts(), 0);
    }

    #[tokio::test]
    async fn test_unknown_pair_skips_model_backends() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, true, model_ok);
        let local = Scripted::new(BackendKind::LocalTransformers, true, model_ok);
        let google = Scripted::new(BackendKind::GoogletransFallback, true, google_ok);
        let chain = chain_of(&[&remote, &local, &google]);

        let request = request(Some("xx"));
        assert_eq!(
            chain.eligible_backends(&request),
            vec![BackendKind::GoogletransFallback]
        );

        let result = chain.resolve(&request).await.unwrap();
        assert_eq!(result.used_backend, BackendKind::GoogletransFallback);
        assert_eq!(remote.attempts(), 0);
        assert_eq!(local.attempts(), 0);
    }

    #[tokio::test]
    async fn test_nothing_eligible_is_exhausted() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, false, model_ok);
        let google = Scripted::new(BackendKind::GoogletransFallback, false, google_ok);
        let chain = chain_of(&[&remote, &google]);

        let err = chain.resolve(&request(Some("es"))).await.unwrap_err();
        assert_eq!(err.detail(), UNAVAILABLE_DETAIL);
        assert!(!err.detail().is_empty());
        match err {
            ChainError::Exhausted { failures, .. } => assert!(failures.is_empty()),
        }
    }

    #[tokio::test]
    async fn test_all_failures_are_collected() {
        let remote = Scripted::new(BackendKind::HuggingfaceInference, true, loading);
        let local = Scripted::new(BackendKind::LocalTransformers, true, loading);
        let chain = chain_of(&[&local, &remote]);

        match chain.resolve(&request(Some("es"))).await.unwrap_err() {
            ChainError::Exhausted { failures, .. } => {
                let kinds: Vec<_> = failures.iter().map(|(kind, _)| *kind).collect();
                assert_eq!(
                    kinds,
                    vec![BackendKind::HuggingfaceInference, BackendKind::LocalTransformers]
                );
            }
        }
    }

    #[tokio::test]
    async fn test_selection_is_deterministic() {
        let build = || {
            chain_of(&[
                &Scripted::new(BackendKind::GoogletransFallback, true, google_ok),
                &Scripted::new(BackendKind::LocalTransformers, true, loading),
                &Scripted::new(BackendKind::HuggingfaceInference, true, loading),
            ])
        };

        for _ in 0..3 {
            let chain = build();
            let result = chain.resolve(&request(Some("es"))).await.unwrap();
            assert_eq!(result.used_backend, BackendKind::GoogletransFallback);
        }

        let status = build().backend_status();
        let kinds: Vec<_> = status.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BackendKind::HuggingfaceInference,
                BackendKind::LocalTransformers,
                BackendKind::GoogletransFallback,
            ]
        );
        assert!(status.iter().all(|s| s.available));
    }

    #[tokio::test]
    async fn test_remote_timeout_falls_through() {
        use std::time::Duration;

        use axum::{routing::post, Json, Router};

        use crate::huggingface::{HuggingFaceConfig, HuggingFaceInferenceBackend};

        let router = Router::new().route(
            "/models/Helsinki-NLP/opus-mt-es-en",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(serde_json::json!([{ "translation_text": "late" }]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let remote = HuggingFaceInferenceBackend::new(HuggingFaceConfig {
            api_key: Some("hf_test".to_string()),
            endpoint: format!("http://{}/models", addr),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let google = Scripted::new(BackendKind::GoogletransFallback, true, google_ok);
        let chain = FallbackChain::new(vec![
            Arc::new(remote) as Arc<dyn TranslationBackend>,
            Arc::clone(&google) as Arc<dyn TranslationBackend>,
        ]);

        let result = chain.resolve(&request(Some("es"))).await.unwrap();
        assert_eq!(result.used_backend, BackendKind::GoogletransFallback);
        assert_eq!(google.attempts(), 1);
    }
}
