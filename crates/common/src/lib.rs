//! Cimientos Common Library
//!
//! Core of the Cimientos Construcciones website backend:
//! - Knowledge context retrieval for the chat assistant prompt
//! - Floor texture compositing for the floor simulator
//! - Chat and texture generation clients
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod assistant;
pub mod compositor;
pub mod config;
pub mod errors;
pub mod floor;
pub mod knowledge;
pub mod llm;
pub mod metrics;
pub mod prompt;

// Re-export commonly used types
pub use assistant::{Assistant, ChatReply};
pub use compositor::{composite, CompositeResult, FloorMask};
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use floor::{FloorGenerator, FloorResult};
pub use knowledge::{ContextRetriever, KnowledgeBase};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
