//! Translation backends and fallback resolution
//!
//! Features:
//! - Remote inference over the Hugging Face API (always compiled)
//! - Local Marian pipeline via Candle (`local-inference` feature)
//! - Keyless Google Translate fallback (`google-fallback` feature, default)
//! - Response normalization into one result shape
//! - A fixed-priority fallback chain that stops at the first success

pub mod backend;
pub mod chain;
pub mod factory;
pub mod google;
pub mod huggingface;
pub mod local;
pub mod normalize;

pub use backend::TranslationBackend;
pub use chain::{BackendStatus, FallbackChain, UNAVAILABLE_DETAIL};
pub use factory::create_chain;
pub use google::{GoogleTranslateBackend, GoogleTranslateConfig};
pub use huggingface::{HuggingFaceConfig, HuggingFaceInferenceBackend};
pub use local::{LocalPipelineConfig, LocalTransformersBackend, RUNTIME_AVAILABLE};

use thiserror::Error;
use translate_relay_core::BackendKind;

/// Errors from a single backend attempt
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("No model identifier for this language pair")]
    MissingModel,

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Model is loading or service unavailable (503)")]
    ModelLoading,

    #[error("HTTP error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Local inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Whether trying the same backend later could succeed.
    ///
    /// The chain never retries; this only feeds logs and metrics.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::ModelLoading | BackendError::Timeout | BackendError::Network(_)
        )
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

/// Terminal failure of the fallback chain
#[derive(Error, Debug)]
pub enum ChainError {
    /// Every eligible backend failed, or none was eligible
    #[error("{detail}")]
    Exhausted {
        detail: String,
        failures: Vec<(BackendKind, String)>,
    },
}

impl ChainError {
    /// Remediation hint safe to show to clients
    pub fn detail(&self) -> &str {
        match self {
            ChainError::Exhausted { detail, .. } => detail,
        }
    }
}
