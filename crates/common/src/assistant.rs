//! Company chat assistant
//!
//! Builds the knowledge context for a message, wraps it in the system
//! prompt and asks the completion provider for a reply. Failures are
//! folded into an apology that points the customer at the phone line.

use crate::knowledge::ContextRetriever;
use crate::llm::{ChatCompleter, ChatOptions};
use crate::metrics;
use crate::prompt::system_prompt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Reply shown to the customer when the provider cannot answer
pub const FALLBACK_REPLY: &str = "Disculpa, tengo problemas técnicos momentáneos. Por favor contacta directamente al +57 320 273 8391 o cimientos2025@gmail.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Answer to one chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub status: ReplyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

pub struct Assistant {
    retriever: Arc<ContextRetriever>,
    completer: Arc<dyn ChatCompleter>,
    options: ChatOptions,
}

impl Assistant {
    pub fn new(
        retriever: Arc<ContextRetriever>,
        completer: Arc<dyn ChatCompleter>,
        options: ChatOptions,
    ) -> Self {
        Self {
            retriever,
            completer,
            options,
        }
    }

    /// Answer `message`; never fails
    #[instrument(skip_all, fields(model = %self.completer.model_name()))]
    pub async fn reply(&self, message: &str) -> ChatReply {
        let topics: Vec<&'static str> = self
            .retriever
            .matched_topics(message)
            .iter()
            .map(|t| t.as_str())
            .collect();
        let context = self.retriever.get_context(message);
        let system = system_prompt(&context);

        let outcome = self.completer.complete(&system, message, &self.options).await;
        metrics::record_chat(&topics, outcome.is_ok());

        match outcome {
            Ok(response) => {
                info!(topics = ?topics, "Chat reply generated");
                ChatReply {
                    response,
                    status: ReplyStatus::Success,
                    detail: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Chat completion failed");
                ChatReply {
                    response: FALLBACK_REPLY.to_string(),
                    status: ReplyStatus::Error,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, Result};
    use crate::llm::MockClient;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the prompts it receives
    #[derive(Default)]
    struct RecordingCompleter {
        systems: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatCompleter for RecordingCompleter {
        async fn complete(&self, system: &str, _user: &str, _options: &ChatOptions) -> Result<String> {
            self.systems.lock().unwrap().push(system.to_string());
            Ok("ok".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    struct FailingCompleter;

    #[async_trait]
    impl ChatCompleter for FailingCompleter {
        async fn complete(&self, _system: &str, _user: &str, _options: &ChatOptions) -> Result<String> {
            Err(AppError::upstream_status("openai", 401, "invalid api key"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_context_reaches_system_prompt() {
        let completer = Arc::new(RecordingCompleter::default());
        let assistant = Assistant::new(
            Arc::new(ContextRetriever::default()),
            completer.clone(),
            ChatOptions::default(),
        );

        let reply = assistant.reply("¿Cuál es el precio del mármol?").await;
        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.response, "ok");

        let systems = completer.systems.lock().unwrap();
        assert!(systems[0].contains("INFORMACIÓN DE LA EMPRESA:\nMATERIALES DE PISOS: {"));
        assert!(systems[0].contains("desde $150.000 COP/m²"));
    }

    #[tokio::test]
    async fn test_unmatched_message_gets_empty_context() {
        let completer = Arc::new(RecordingCompleter::default());
        let assistant = Assistant::new(
            Arc::new(ContextRetriever::default()),
            completer.clone(),
            ChatOptions::default(),
        );

        assistant.reply("hola").await;
        let systems = completer.systems.lock().unwrap();
        assert!(systems[0].contains("INFORMACIÓN DE LA EMPRESA:\n\n\nINSTRUCCIONES:"));
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback_reply() {
        let assistant = Assistant::new(
            Arc::new(ContextRetriever::default()),
            Arc::new(FailingCompleter),
            ChatOptions::default(),
        );

        let reply = assistant.reply("hola").await;
        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.response, FALLBACK_REPLY);
        assert!(reply.detail.unwrap().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_reply_serialization() {
        let assistant = Assistant::new(
            Arc::new(ContextRetriever::default()),
            Arc::new(MockClient::new()),
            ChatOptions::default(),
        );
        let reply = assistant.reply("¿Qué servicios ofrecen?").await;
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("detail").is_none());
    }
}
