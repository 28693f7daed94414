//! Centralized constants for the translation relay
//!
//! Default values shared by the settings module and the backends. Override
//! them through configuration rather than editing call sites.

/// Upstream endpoints
pub mod endpoints {
    /// Hugging Face hosted inference, completed with `/{model}`
    pub const HF_INFERENCE_DEFAULT: &str = "https://api-inference.huggingface.co/models";

    /// Keyless Google Translate endpoint used by the web client
    pub const GOOGLE_TRANSLATE_DEFAULT: &str = "https://translate.googleapis.com/translate_a/single";
}

/// Timeouts (in seconds)
pub mod timeouts {
    /// Remote inference request timeout
    pub const INFERENCE_SECS: u64 = 30;

    /// Google Translate request timeout
    pub const GOOGLE_SECS: u64 = 30;
}

/// Local inference limits
pub mod local {
    /// Maximum decoder steps per translation
    pub const MAX_LENGTH: usize = 1024;
}

/// Environment variables read directly (outside the prefixed scheme)
pub mod env_vars {
    /// Optional API key for remote inference
    pub const HF_API_KEY: &str = "HUGGINGFACE_API_KEY";

    /// Opt-in flag for the local inference path
    pub const USE_LOCAL_TRANSFORMERS: &str = "USE_LOCAL_TRANSFORMERS";

    /// HTTP listen port
    pub const PORT: &str = "PORT";
}

/// Server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 5000;
}
