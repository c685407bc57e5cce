//! OpenAI chat completion and image generation client

use super::{ChatCompleter, ChatOptions, TextureGenerator};
use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

const SERVICE: &str = "openai";

/// Backoff stops doubling after this many attempts (about 100s)
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// OpenAI REST client
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    image_model: String,
    image_size: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            max_retries: config.max_retries.max(1),
        })
    }

    /// Run `request` until it succeeds, fails permanently or runs out of attempts
    async fn with_retry<T, F, Fut>(&self, operation: &'static str, request: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let start = Instant::now();
            let outcome = request().await;
            metrics::record_upstream(start.elapsed().as_secs_f64(), operation, outcome.is_ok());

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries => {
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Upstream request failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::upstream_status(
            SERVICE,
            status.as_u16(),
            format!("API error {}: {}", status, body),
        ))
    }

    async fn chat_once(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let parsed: ChatResponse = Self::check(response).await?.json().await.map_err(|e| {
            AppError::upstream(SERVICE, format!("Failed to parse chat response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::upstream(SERVICE, "Empty response from chat completion"))
    }

    async fn image_url_once(&self, prompt: &str) -> Result<String> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            size: &self.image_size,
            n: 1,
            response_format: "url",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let parsed: ImageResponse = Self::check(response).await?.json().await.map_err(|e| {
            AppError::upstream(SERVICE, format!("Failed to parse image response: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| AppError::upstream(SERVICE, "No image received from generation"))
    }

    async fn download_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Exponential backoff before retry number `attempt`
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2_u64.pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, system: &str, user: &str, options: &ChatOptions) -> Result<String> {
        self.with_retry("chat", || self.chat_once(system, user, options))
            .await
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl TextureGenerator for OpenAiClient {
    async fn generate_texture(&self, prompt: &str) -> Result<Vec<u8>> {
        let url = self
            .with_retry("image_generation", || self.image_url_once(prompt))
            .await?;
        tracing::debug!(model = %self.image_model, "Texture generated, downloading");

        self.with_retry("image_download", || self.download_once(&url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn client(max_retries: u32) -> OpenAiClient {
        let config = LlmConfig {
            max_retries,
            ..LlmConfig::default()
        };
        OpenAiClient::new("sk-test".to_string(), &config).unwrap()
    }

    /// Attempts made by `with_retry` when every call fails with `error`
    async fn attempts_until_give_up(max_retries: u32, error: fn() -> AppError) -> u32 {
        let calls = AtomicU32::new(0);
        let result: Result<()> = client(max_retries)
            .with_retry("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(error()) }
            })
            .await;
        assert!(result.is_err());
        calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_retry_on_server_error_until_limit() {
        let attempts = attempts_until_give_up(3, || {
            AppError::upstream_status(SERVICE, 503, "unavailable")
        })
        .await;
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit_and_missing_status() {
        let rate_limited =
            attempts_until_give_up(2, || AppError::upstream_status(SERVICE, 429, "slow down")).await;
        assert_eq!(rate_limited, 2);

        let no_status = attempts_until_give_up(2, || AppError::upstream(SERVICE, "empty body")).await;
        assert_eq!(no_status, 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let attempts = attempts_until_give_up(5, || {
            AppError::upstream_status(SERVICE, 401, "invalid api key")
        })
        .await;
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_stops_at_first_success() {
        let calls = AtomicU32::new(0);
        let value = client(4)
            .with_retry("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(AppError::upstream_status(SERVICE, 500, "boom"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        assert_eq!(backoff_delay(64), backoff_delay(MAX_BACKOFF_EXPONENT));
        assert_eq!(backoff_delay(u32::MAX), Duration::from_millis(102_400));
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "hola" },
            ],
            max_tokens: 300,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hola");
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn test_image_response_parsing() {
        let parsed: ImageResponse =
            serde_json::from_str(r#"{"created": 1, "data": [{"url": "https://example.com/t.png", "revised_prompt": "x"}]}"#)
                .unwrap();
        assert_eq!(parsed.data[0].url.as_deref(), Some("https://example.com/t.png"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = LlmConfig {
            api_base: "http://localhost:9999/v1/".to_string(),
            max_retries: 0,
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new("sk-test".to_string(), &config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/v1");
        assert_eq!(client.max_retries, 1);
        assert_eq!(client.model_name(), "gpt-3.5-turbo");
    }
}
