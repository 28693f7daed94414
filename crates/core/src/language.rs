//! Supported languages and model identifier synthesis
//!
//! The relay knows a fixed set of 2-letter codes. Membership in this set does
//! not gate requests; it only decides whether a Helsinki-NLP opus-mt model
//! name can be synthesized for the model-based backends.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Sentinel source code asking the backend to detect the language
pub const AUTO_SOURCE: &str = "auto";

/// Prefix of the opus-mt model family, completed with `-{src}-{tgt}`
pub const MODEL_PREFIX: &str = "Helsinki-NLP/opus-mt";

/// Source language assumed by model-based backends when the caller sent "auto"
const ASSUMED_AUTO_SOURCE: &str = "en";

/// Supported language codes with display names
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("hi", "Hindi"),
    ("ta", "Tamil"),
    ("fr", "French"),
    ("de", "German"),
    ("pt", "Portuguese"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("bn", "Bengali"),
    ("ur", "Urdu"),
];

static SUPPORTED_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SUPPORTED_LANGUAGES.iter().map(|(code, _)| *code).collect());

/// Check whether a code belongs to the supported set
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_SET.contains(code)
}

/// A supported language as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
}

/// All supported languages, in table order
pub fn supported_languages() -> Vec<LanguageInfo> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|&(code, name)| LanguageInfo { code, name })
        .collect()
}

/// Name of a translation model for one language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelIdentifier(String);

impl ModelIdentifier {
    fn combine(source: &str, target: &str) -> Self {
        Self(format!("{}-{}-{}", MODEL_PREFIX, source, target))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the model identifier for a language pair
///
/// - concrete source, both codes supported: `{prefix}-{source}-{target}`
/// - "auto" source, target supported: `{prefix}-en-{target}` (English is
///   assumed, nothing is detected)
/// - otherwise: `None`, and model-based backends are skipped
///
/// The target is lowercased before lookup; the source is used as given.
pub fn derive_model_identifier(source: &str, target: &str) -> Option<ModelIdentifier> {
    let target = target.to_lowercase();

    if source != AUTO_SOURCE && is_supported(source) && is_supported(&target) {
        Some(ModelIdentifier::combine(source, &target))
    } else if source == AUTO_SOURCE && is_supported(&target) {
        Some(ModelIdentifier::combine(ASSUMED_AUTO_SOURCE, &target))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_pair() {
        let id = derive_model_identifier("es", "en").unwrap();
        assert_eq!(id.as_str(), "Helsinki-NLP/opus-mt-es-en");
    }

    #[test]
    fn test_auto_source_assumes_english() {
        let id = derive_model_identifier("auto", "ta").unwrap();
        assert_eq!(id.as_str(), "Helsinki-NLP/opus-mt-en-ta");
    }

    #[test]
    fn test_unsupported_source() {
        assert!(derive_model_identifier("xx", "en").is_none());
    }

    #[test]
    fn test_unsupported_target() {
        assert!(derive_model_identifier("en", "ja").is_none());
        assert!(derive_model_identifier("auto", "ja").is_none());
    }

    #[test]
    fn test_target_is_lowercased() {
        let id = derive_model_identifier("fr", "DE").unwrap();
        assert_eq!(id.as_str(), "Helsinki-NLP/opus-mt-fr-de");
    }

    #[test]
    fn test_source_is_not_lowercased() {
        assert!(derive_model_identifier("FR", "de").is_none());
    }

    #[test]
    fn test_supported_table() {
        let languages = supported_languages();
        assert_eq!(languages.len(), 13);
        assert!(is_supported("ur"));
        assert!(!is_supported("auto"));
        assert_eq!(languages[0].code, "en");
    }

    #[test]
    fn test_model_identifier_serializes_as_string() {
        let id = derive_model_identifier("hi", "en").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Helsinki-NLP/opus-mt-hi-en\"");
    }
}
