//! Knowledge Context Retrieval
//!
//! A static fact sheet about the company and a keyword rule table that
//! selects which sections of it are relevant to a chat message:
//! - Typed fact sheets, one per topic
//! - Declarative topic keyword rules
//! - Context assembly in a fixed topic order

mod facts;
mod retriever;
mod rules;

pub use facts::{
    CompanySheet, ContactSheet, FloorMaterialsSheet, KnowledgeBase, MaterialSheet, ServicesSheet,
    SimulatorSheet,
};
pub use retriever::ContextRetriever;
pub use rules::{default_rules, MatchMode, Topic, TopicKeywordRule};
