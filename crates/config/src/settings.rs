//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, env_vars, local, server, timeouts};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote inference backend
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Local inference backend
    #[serde(default)]
    pub local: LocalInferenceConfig,

    /// Keyless Google Translate fallback
    #[serde(default)]
    pub google: GoogleConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_backends()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    fn validate_backends(&self) -> Result<(), ConfigError> {
        validate_endpoint("inference.endpoint", &self.inference.endpoint)?;
        validate_endpoint("google.endpoint", &self.google.endpoint)?;

        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "inference.timeout_secs".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.google.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "google.timeout_secs".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.local.max_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "local.max_length".to_string(),
                message: "Maximum length must be positive".to_string(),
            });
        }

        Ok(())
    }
}

fn validate_endpoint(field: &str, endpoint: &str) -> Result<(), ConfigError> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("Expected an http(s) URL, got {:?}", endpoint),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    std::env::var(env_vars::PORT)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Remote inference (Hugging Face) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// API key; the backend is skipped when absent or blank
    #[serde(default = "default_hf_api_key")]
    pub api_key: Option<String>,

    /// Base URL, the model identifier is appended as a path segment
    #[serde(default = "default_hf_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

fn default_hf_api_key() -> Option<String> {
    std::env::var(env_vars::HF_API_KEY)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

fn default_hf_endpoint() -> String {
    endpoints::HF_INFERENCE_DEFAULT.to_string()
}

fn default_inference_timeout() -> u64 {
    timeouts::INFERENCE_SECS
}

impl InferenceConfig {
    /// Whether a usable API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: default_hf_api_key(),
            endpoint: default_hf_endpoint(),
            timeout_secs: default_inference_timeout(),
        }
    }
}

/// Local (in-process) inference configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalInferenceConfig {
    /// Opt-in flag; local inference is heavy and off by default
    #[serde(default = "default_local_enabled")]
    pub enabled: bool,

    /// Maximum number of generated tokens
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Keep loaded pipelines between requests instead of loading per call
    #[serde(default)]
    pub cache_pipelines: bool,
}

fn default_local_enabled() -> bool {
    std::env::var(env_vars::USE_LOCAL_TRANSFORMERS)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn default_max_length() -> usize {
    local::MAX_LENGTH
}

/// Interpret an opt-in flag the way the relay always has: "1", "true", "True"
pub fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

impl Default for LocalInferenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_local_enabled(),
            max_length: default_max_length(),
            cache_pipelines: false,
        }
    }
}

/// Keyless Google Translate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Allow the fallback when the client is compiled in
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Translate endpoint
    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,
}

fn default_google_endpoint() -> String {
    endpoints::GOOGLE_TRANSLATE_DEFAULT.to_string()
}

fn default_google_timeout() -> u64 {
    timeouts::GOOGLE_SECS
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_google_endpoint(),
            timeout_secs: default_google_timeout(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (TRANSLATE_RELAY__ prefix, e.g.
///    `TRANSLATE_RELAY__SERVER__PORT`)
/// 2. config/{env}.toml|yaml (if env specified)
/// 3. config/default.toml|yaml
/// 4. Defaults, which read `HUGGINGFACE_API_KEY`, `USE_LOCAL_TRANSFORMERS`
///    and `PORT`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("TRANSLATE_RELAY")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}
