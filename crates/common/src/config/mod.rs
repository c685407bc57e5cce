//! Configuration management for Cimientos services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::knowledge::MatchMode;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Chat completion and texture generation provider
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge context retrieval
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Floor simulator paths
    #[serde(default)]
    pub floor: FloorConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider: openai, mock
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API key for the provider
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Image generation model
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Generated texture size
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Maximum completion tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    /// Replacement fact sheet (JSON); the embedded fixture is used when unset
    pub fixture_path: Option<PathBuf>,

    /// Keyword matching mode
    #[serde(default)]
    pub match_mode: MatchMode,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FloorConfig {
    /// Base room photograph
    #[serde(default = "default_base_image_path")]
    pub base_image_path: PathBuf,

    /// Directory the composites are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// URL prefix under which `output_dir` is served
    #[serde(default = "default_web_prefix")]
    pub web_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_llm_provider() -> String { "openai".to_string() }
fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_chat_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_image_model() -> String { "dall-e-3".to_string() }
fn default_image_size() -> String { "1024x1024".to_string() }
fn default_max_tokens() -> u32 { 300 }
fn default_temperature() -> f32 { 0.7 }
fn default_llm_timeout() -> u64 { 60 }
fn default_llm_retries() -> u32 { 3 }
fn default_base_image_path() -> PathBuf { PathBuf::from("frontend/static/generated/base/base.png") }
fn default_output_dir() -> PathBuf { PathBuf::from("frontend/static/generated/piso") }
fn default_web_prefix() -> String { "/static/generated/piso".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "cimientos".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: None,
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
        }
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            fixture_path: None,
            match_mode: MatchMode::default(),
        }
    }
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            base_image_path: default_base_image_path(),
            output_dir: default_output_dir(),
            web_prefix: default_web_prefix(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__LLM__PROVIDER=mock
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_key_fallback(std::env::var("OPENAI_API_KEY").ok()))
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_key_fallback(std::env::var("OPENAI_API_KEY").ok()))
    }

    /// Use `key` as the provider API key when none was configured
    fn with_key_fallback(mut self, key: Option<String>) -> Self {
        let missing = self.llm.api_key.as_deref().map_or(true, str::is_empty);
        if missing {
            self.llm.api_key = key.filter(|k| !k.is_empty());
        }
        self
    }

    /// Get LLM request timeout as Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            knowledge: KnowledgeConfig::default(),
            floor: FloorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.llm.max_tokens, 300);
        assert_eq!(config.knowledge.match_mode, MatchMode::Substring);
        assert_eq!(config.llm_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(
            &path,
            "[llm]\nprovider = \"mock\"\nmax_tokens = 120\n\n\
             [knowledge]\nmatch_mode = \"word_boundary\"\n\n\
             [floor]\noutput_dir = \"/tmp/pisos\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.max_tokens, 120);
        assert_eq!(config.llm.image_model, "dall-e-3");
        assert_eq!(config.knowledge.match_mode, MatchMode::WordBoundary);
        assert_eq!(config.floor.output_dir, PathBuf::from("/tmp/pisos"));
        assert_eq!(config.floor.web_prefix, "/static/generated/piso");
    }

    #[test]
    fn test_api_key_fallback_only_when_missing() {
        let config = AppConfig::default().with_key_fallback(Some("sk-env".into()));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-env"));

        let mut configured = AppConfig::default();
        configured.llm.api_key = Some("sk-file".into());
        let configured = configured.with_key_fallback(Some("sk-env".into()));
        assert_eq!(configured.llm.api_key.as_deref(), Some("sk-file"));
    }
}
