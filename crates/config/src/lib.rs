//! Configuration management for the translation relay
//!
//! Supports loading configuration from:
//! - TOML/YAML files under `config/`
//! - Environment variables (TRANSLATE_RELAY prefix, `__` separator)
//! - The plain variables the relay has always honored
//!   (`HUGGINGFACE_API_KEY`, `USE_LOCAL_TRANSFORMERS`, `PORT`)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, GoogleConfig, InferenceConfig, LocalInferenceConfig, ObservabilityConfig,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
