//! Backend trait shared by every translation provider

use async_trait::async_trait;
use translate_relay_core::{BackendKind, ModelIdentifier, TranslationRequest, TranslationResult};

use crate::BackendError;

/// A translation provider the fallback chain can attempt
///
/// Availability is a configuration-time property: a backend whose key,
/// runtime or client is missing reports `false` from `is_available` and is
/// never attempted.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Which provider this is; also fixes its position in the chain
    fn kind(&self) -> BackendKind;

    /// Whether the backend's preconditions hold for this process
    fn is_available(&self) -> bool;

    /// Attempt one translation
    ///
    /// `model` is the synthesized identifier for the request's language
    /// pair. Backends whose kind requires a model are only attempted when
    /// it is present.
    async fn translate(
        &self,
        request: &TranslationRequest,
        model: Option<&ModelIdentifier>,
    ) -> Result<TranslationResult, BackendError>;
}
