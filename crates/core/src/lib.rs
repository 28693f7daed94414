//! Core types for the translation relay
//!
//! This crate provides the types shared by every other crate:
//! - Supported language table and model identifier synthesis
//! - Translation request/result types
//! - Backend kinds (which provider produced a result)
//! - Validation errors

pub mod error;
pub mod language;
pub mod request;

pub use error::{Error, Result};
pub use language::{
    derive_model_identifier, is_supported, supported_languages, LanguageInfo, ModelIdentifier,
    AUTO_SOURCE, MODEL_PREFIX, SUPPORTED_LANGUAGES,
};
pub use request::{BackendKind, TranslationRequest, TranslationResult};
