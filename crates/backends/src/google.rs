//! Keyless Google Translate fallback
//!
//! Needs no API key and no model identifier. The caller's source code is
//! passed through unchanged, so "auto" asks Google to detect the language
//! and the detected code comes back with the result.

use std::time::Duration;

/// Google Translate client configuration
#[derive(Debug, Clone)]
pub struct GoogleTranslateConfig {
    /// Allow this backend to be attempted
    pub enabled: bool,
    /// Translate endpoint
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GoogleTranslateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: translate_relay_config::constants::endpoints::GOOGLE_TRANSLATE_DEFAULT
                .to_string(),
            timeout: Duration::from_secs(translate_relay_config::constants::timeouts::GOOGLE_SECS),
        }
    }
}

impl From<&translate_relay_config::GoogleConfig> for GoogleTranslateConfig {
    fn from(config: &translate_relay_config::GoogleConfig) -> Self {
        Self {
            enabled: config.enabled,
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[cfg(feature = "google-fallback")]
mod client_impl {
    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::Value;
    use translate_relay_core::{
        BackendKind, ModelIdentifier, TranslationRequest, TranslationResult,
    };

    use super::GoogleTranslateConfig;
    use crate::backend::TranslationBackend;
    use crate::normalize::parse_google_response;
    use crate::BackendError;

    const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

    /// Google Translate backend using the public web-client endpoint
    #[derive(Clone)]
    pub struct GoogleTranslateBackend {
        client: Client,
        config: GoogleTranslateConfig,
    }

    impl GoogleTranslateBackend {
        pub fn new(config: GoogleTranslateConfig) -> Result<Self, BackendError> {
            let client = Client::builder()
                .timeout(config.timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| {
                    BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
                })?;

            Ok(Self { client, config })
        }

        /// Translate text, returning the translation and detected source
        pub async fn call(
            &self,
            text: &str,
            source: &str,
            target: &str,
        ) -> Result<(String, Option<String>), BackendError> {
            let response = self
                .client
                .get(&self.config.endpoint)
                .query(&[
                    ("client", "gtx"),
                    ("sl", source),
                    ("tl", target),
                    ("dt", "t"),
                    ("q", text),
                ])
                .send()
                .await?;

            let status = response.status();
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

            parse_google_response(&data)
        }
    }

    #[async_trait]
    impl TranslationBackend for GoogleTranslateBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::GoogletransFallback
        }

        fn is_available(&self) -> bool {
            self.config.enabled
        }

        async fn translate(
            &self,
            request: &TranslationRequest,
            _model: Option<&ModelIdentifier>,
        ) -> Result<TranslationResult, BackendError> {
            let (translated, detected) = self
                .call(request.text(), request.source(), request.target())
                .await?;
            Ok(TranslationResult::detected(translated, self.kind(), detected))
        }
    }
}

#[cfg(feature = "google-fallback")]
pub use client_impl::GoogleTranslateBackend;

#[cfg(not(feature = "google-fallback"))]
pub mod stub {
    use async_trait::async_trait;
    use translate_relay_core::{
        BackendKind, ModelIdentifier, TranslationRequest, TranslationResult,
    };

    use super::GoogleTranslateConfig;
    use crate::backend::TranslationBackend;
    use crate::BackendError;

    /// Placeholder used when the Google client is not compiled in
    pub struct GoogleTranslateBackend;

    impl GoogleTranslateBackend {
        pub fn new(_config: GoogleTranslateConfig) -> Result<Self, BackendError> {
            tracing::debug!("google-fallback feature not enabled - Google backend unavailable");
            Ok(Self)
        }
    }

    #[async_trait]
    impl TranslationBackend for GoogleTranslateBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::GoogletransFallback
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn translate(
            &self,
            _request: &TranslationRequest,
            _model: Option<&ModelIdentifier>,
        ) -> Result<TranslationResult, BackendError> {
            Err(BackendError::Unavailable(
                "built without the google-fallback feature".to_string(),
            ))
        }
    }
}

#[cfg(not(feature = "google-fallback"))]
pub use stub::GoogleTranslateBackend;
