//! Command definitions and dispatch

use cimientos_common::{
    compositor,
    config::AppConfig,
    errors::ErrorDetails,
    llm::{create_clients, ChatOptions},
    assistant::ReplyStatus,
    Assistant, ContextRetriever, FloorGenerator,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "cimientos", version, about = "Cimientos Construcciones assistant core")]
pub struct Cli {
    /// Configuration file (TOML); defaults to the config/ directory layering
    #[arg(long, global = true, env = "CIMIENTOS_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the knowledge context selected for a message
    Context {
        /// Chat message
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Answer a chat message through the configured provider
    Chat {
        /// Chat message
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Blend a texture into the floor region of a room photo
    Composite {
        #[arg(long)]
        base: PathBuf,

        #[arg(long)]
        texture: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },

    /// Generate a floor texture for a material and apply it to the base photo
    Floor {
        /// Material slug, e.g. wood, ceramic, marble
        material: String,

        /// User identifier used in the output file name
        #[arg(long)]
        user: String,
    },
}

/// JSON printed for a command, tagged with whether the command succeeded
#[derive(Debug)]
pub enum Outcome {
    Success(Value),
    Failure(Value),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn output(&self) -> &Value {
        match self {
            Outcome::Success(value) | Outcome::Failure(value) => value,
        }
    }
}

/// Run one command; domain failures come back as [`Outcome::Failure`] with error details
pub async fn run(command: Command, config: &AppConfig) -> anyhow::Result<Outcome> {
    let retriever = || ContextRetriever::from_config(&config.knowledge);

    let outcome = match command {
        Command::Context { message } => {
            let message = message.join(" ");
            let retriever = retriever()?;
            Outcome::Success(json!({
                "topics": retriever.matched_topics(&message),
                "context": retriever.get_context(&message),
            }))
        }
        Command::Chat { message } => {
            let clients = create_clients(&config.llm)?;
            let assistant = Assistant::new(
                Arc::new(retriever()?),
                clients.chat,
                ChatOptions::from(&config.llm),
            );
            let reply = assistant.reply(&message.join(" ")).await;
            let value = serde_json::to_value(&reply)?;
            match reply.status {
                ReplyStatus::Success => Outcome::Success(value),
                ReplyStatus::Error => Outcome::Failure(value),
            }
        }
        Command::Composite {
            base,
            texture,
            output,
        } => {
            let composited = tokio::task::spawn_blocking(move || {
                compositor::composite(&base, &texture, &output)
            })
            .await?;
            match composited {
                Ok(result) => Outcome::Success(serde_json::to_value(result)?),
                Err(e) => Outcome::Failure(json!({ "error": ErrorDetails::from(&e) })),
            }
        }
        Command::Floor { material, user } => {
            let clients = create_clients(&config.llm)?;
            let floor = FloorGenerator::new(clients.textures, config.floor.clone());
            match floor.generate(&material, &user).await {
                Ok(result) => Outcome::Success(json!({
                    "status": "success",
                    "file": result.web_path,
                    "path": result.file_path,
                    "composited": result.composited,
                })),
                Err(e) => Outcome::Failure(json!({
                    "status": "error",
                    "error": ErrorDetails::from(&e),
                })),
            }
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_command_output() {
        let command = Command::Context {
            message: vec!["precio".into(), "y".into(), "contacto".into()],
        };
        let outcome = run(command, &AppConfig::default()).await.unwrap();
        assert!(outcome.is_success());
        let output = outcome.output();
        assert_eq!(output["topics"], json!(["floor_materials", "contact"]));
        let context = output["context"].as_str().unwrap();
        assert!(context.starts_with("MATERIALES DE PISOS: "));
        assert!(context.contains("\nCONTACTO: "));
    }

    #[tokio::test]
    async fn test_chat_with_mock_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "mock".to_string();
        let command = Command::Chat {
            message: vec!["hola".into()],
        };
        let outcome = run(command, &config).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.output()["status"], "success");
    }

    #[tokio::test]
    async fn test_composite_decode_error_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"nope").unwrap();

        let command = Command::Composite {
            base: bogus.clone(),
            texture: bogus,
            output: dir.path().join("out.png"),
        };
        let outcome = run(command, &AppConfig::default()).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.output()["error"]["code"], "IMAGE_DECODE_ERROR");
        assert!(!dir.path().join("out.png").exists());
    }

    #[tokio::test]
    async fn test_floor_validation_error_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.llm.provider = "mock".to_string();
        config.floor.output_dir = dir.path().join("piso");
        config.floor.base_image_path = dir.path().join("missing.png");

        let command = Command::Floor {
            material: "../etc".to_string(),
            user: "1".to_string(),
        };
        let outcome = run(command, &config).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.output()["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_floor_success_without_base() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.llm.provider = "mock".to_string();
        config.floor.output_dir = dir.path().join("piso");
        config.floor.base_image_path = dir.path().join("missing.png");

        let command = Command::Floor {
            material: "wood".to_string(),
            user: "7".to_string(),
        };
        let outcome = run(command, &config).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.output()["composited"], false);
        assert!(dir.path().join("piso/wood_7.png").exists());
    }
}
