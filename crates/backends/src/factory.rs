//! Chain factory
//!
//! Builds every backend from `Settings` and wires them into one
//! `FallbackChain`. Backends whose preconditions do not hold are still
//! registered; they report unavailable and the chain skips them.

use std::sync::Arc;

use translate_relay_config::Settings;

use crate::backend::TranslationBackend;
use crate::chain::FallbackChain;
use crate::google::{GoogleTranslateBackend, GoogleTranslateConfig};
use crate::huggingface::{HuggingFaceConfig, HuggingFaceInferenceBackend};
use crate::local::{LocalPipelineConfig, LocalTransformersBackend, RUNTIME_AVAILABLE};
use crate::BackendError;

/// Create the fallback chain described by `settings`
pub fn create_chain(settings: &Settings) -> Result<FallbackChain, BackendError> {
    let backends: Vec<Arc<dyn TranslationBackend>> = vec![
        Arc::new(HuggingFaceInferenceBackend::new(HuggingFaceConfig::from(
            &settings.inference,
        ))?),
        Arc::new(LocalTransformersBackend::new(LocalPipelineConfig::from(
            &settings.local,
        ))?),
        Arc::new(GoogleTranslateBackend::new(GoogleTranslateConfig::from(
            &settings.google,
        ))?),
    ];

    let chain = FallbackChain::new(backends);

    for status in chain.backend_status() {
        tracing::info!(
            backend = %status.kind,
            available = status.available,
            "Registered translation backend"
        );
    }

    if settings.local.enabled && !RUNTIME_AVAILABLE {
        tracing::warn!("USE_LOCAL_TRANSFORMERS is set but this build has no local runtime");
    }

    if chain.backend_status().iter().all(|s| !s.available) {
        tracing::warn!("No translation backend is available; every request will fail");
    }

    Ok(chain)
}
