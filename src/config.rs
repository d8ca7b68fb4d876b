use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Risk model artifact locations
    pub models: ModelsConfig,

    /// Assistant (LLM) configuration
    pub assistant: AssistantConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (e.g. HYGIE_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix("HYGIE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// One serialized artifact per risk category. Every path must resolve at
/// startup; the service never runs on a partial model set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Intra-abdominal bleeding classifier
    pub bleeding: PathBuf,

    /// Intra-abdominal infection classifier
    pub infection: PathBuf,

    /// Adverse-outcome blend bundle
    pub outcome: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Enable the LLM assistant (intent routing, Q&A, prediction summaries)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Chat-completions endpoint base URL
    pub base_url: String,

    /// Model name
    pub model: String,

    /// API key; usually supplied via HYGIE_ASSISTANT__API_KEY
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upstream request timeout (seconds)
    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,

    /// Completion token budget for free-text replies
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter, overridable with RUST_LOG
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_assistant_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    512
}

fn default_log_filter() -> String {
    "hygie_risk=info,tower_http=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_deserialize() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.assistant.enabled);
        assert!(config.assistant.api_key.is_none());
        assert!(config.models.outcome.to_string_lossy().ends_with(".json"));
    }
}
