//! LLM provider abstraction
//!
//! Two capabilities are consumed from the provider:
//! - Chat completion for the company assistant
//! - Texture image generation for the floor simulator
//!
//! Providers: OpenAI (`openai`) and an offline mock (`mock`).

mod mock;
mod openai;

pub use mock::MockClient;
pub use openai::OpenAiClient;

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Sampling options for a chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    /// Maximum output tokens
    pub max_tokens: u32,

    /// Temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

impl From<&LlmConfig> for ChatOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Trait for chat completion
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Complete a conversation made of one system and one user message
    async fn complete(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Trait for texture image generation
#[async_trait]
pub trait TextureGenerator: Send + Sync {
    /// Generate an image for `prompt`, returned as encoded file bytes
    async fn generate_texture(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// Both capabilities, backed by a single provider
#[derive(Clone)]
pub struct LlmClients {
    pub chat: Arc<dyn ChatCompleter>,
    pub textures: Arc<dyn TextureGenerator>,
}

impl LlmClients {
    fn from_provider<T>(client: T) -> Self
    where
        T: ChatCompleter + TextureGenerator + 'static,
    {
        let client = Arc::new(client);
        Self {
            chat: client.clone(),
            textures: client,
        }
    }
}

/// Create the clients based on configuration
pub fn create_clients(config: &LlmConfig) -> Result<LlmClients> {
    match config.provider.as_str() {
        "openai" => {
            let key = config
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::Configuration {
                    message: "OpenAI API key not configured (set APP__LLM__API_KEY or OPENAI_API_KEY)"
                        .to_string(),
                })?;
            Ok(LlmClients::from_provider(OpenAiClient::new(key, config)?))
        }
        "mock" => Ok(LlmClients::from_provider(MockClient::new())),
        other => Err(AppError::Configuration {
            message: format!("Unknown LLM provider: {}", other),
        }),
    }
}
