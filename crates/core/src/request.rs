//! Translation request and result types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::language::{derive_model_identifier, ModelIdentifier, AUTO_SOURCE};

/// Target language used when the caller does not name one
pub const DEFAULT_TARGET: &str = "en";

/// A validated translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    source: String,
    target: String,
}

impl TranslationRequest {
    /// Build a request from raw client input
    ///
    /// The text is trimmed and must not be empty. A missing source means
    /// "auto", a missing target means English. The target is lowercased.
    pub fn new(
        text: impl AsRef<str>,
        source: Option<String>,
        target: Option<String>,
    ) -> Result<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(Error::EmptyText);
        }

        Ok(Self {
            text: text.to_string(),
            source: source.unwrap_or_else(|| AUTO_SOURCE.to_string()),
            target: target
                .unwrap_or_else(|| DEFAULT_TARGET.to_string())
                .to_lowercase(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the caller asked for source detection
    pub fn is_auto_source(&self) -> bool {
        self.source == AUTO_SOURCE
    }

    /// Model identifier for this request's language pair, if one exists
    pub fn model_identifier(&self) -> Option<ModelIdentifier> {
        derive_model_identifier(&self.source, &self.target)
    }
}

/// Which backend produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hosted inference API keyed by model identifier
    HuggingfaceInference,
    /// In-process Marian pipeline
    LocalTransformers,
    /// Keyless third-party translator
    GoogletransFallback,
}

impl BackendKind {
    /// Position in the fallback chain; lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            BackendKind::HuggingfaceInference => 0,
            BackendKind::LocalTransformers => 1,
            BackendKind::GoogletransFallback => 2,
        }
    }

    /// Wire name reported in the `used` field
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::HuggingfaceInference => "huggingface_inference",
            BackendKind::LocalTransformers => "local_transformers",
            BackendKind::GoogletransFallback => "googletrans_fallback",
        }
    }

    /// Whether this backend needs a synthesized model identifier
    pub fn requires_model(&self) -> bool {
        !matches!(self, BackendKind::GoogletransFallback)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized output of any backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub used_backend: BackendKind,
    pub model: Option<String>,
    pub detected_source: Option<String>,
}

impl TranslationResult {
    /// Result from a model-based backend
    pub fn from_model(
        translated_text: impl Into<String>,
        used_backend: BackendKind,
        model: &ModelIdentifier,
    ) -> Self {
        Self {
            translated_text: translated_text.into(),
            used_backend,
            model: Some(model.to_string()),
            detected_source: None,
        }
    }

    /// Result from a backend that detects the source language itself
    pub fn detected(
        translated_text: impl Into<String>,
        used_backend: BackendKind,
        detected_source: Option<String>,
    ) -> Self {
        Self {
            translated_text: translated_text.into(),
            used_backend,
            model: None,
            detected_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_rejected() {
        assert_eq!(
            TranslationRequest::new("", None, None).unwrap_err(),
            Error::EmptyText
        );
        assert_eq!(
            TranslationRequest::new("  \n\t ", None, None).unwrap_err(),
            Error::EmptyText
        );
    }

    #[test]
    fn test_defaults() {
        let request = TranslationRequest::new(" Hola ", None, None).unwrap();
        assert_eq!(request.text(), "Hola");
        assert_eq!(request.source(), "auto");
        assert_eq!(request.target(), "en");
        assert!(request.is_auto_source());
    }

    #[test]
    fn test_target_lowercased() {
        let request =
            TranslationRequest::new("Hello", Some("en".into()), Some("FR".into())).unwrap();
        assert_eq!(request.target(), "fr");
        assert_eq!(
            request.model_identifier().unwrap().as_str(),
            "Helsinki-NLP/opus-mt-en-fr"
        );
    }

    #[test]
    fn test_unknown_pair_still_accepted() {
        let request =
            TranslationRequest::new("Hello", Some("xx".into()), Some("en".into())).unwrap();
        assert!(request.model_identifier().is_none());
    }

    #[test]
    fn test_backend_kind_order_and_names() {
        let mut kinds = vec![
            BackendKind::GoogletransFallback,
            BackendKind::HuggingfaceInference,
            BackendKind::LocalTransformers,
        ];
        kinds.sort_by_key(|k| k.priority());
        assert_eq!(
            kinds,
            vec![
                BackendKind::HuggingfaceInference,
                BackendKind::LocalTransformers,
                BackendKind::GoogletransFallback,
            ]
        );
        assert_eq!(
            serde_json::to_string(&BackendKind::GoogletransFallback).unwrap(),
            "\"googletrans_fallback\""
        );
        assert!(!BackendKind::GoogletransFallback.requires_model());
        assert!(BackendKind::LocalTransformers.requires_model());
    }
}
