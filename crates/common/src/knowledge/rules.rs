//! Topic keyword rules

use serde::{Deserialize, Serialize};

/// A category of company facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Services,
    FloorMaterials,
    Simulator,
    Contact,
    Company,
}

impl Topic {
    /// Output order of context blocks
    pub const PRIORITY: [Topic; 5] = [
        Topic::Services,
        Topic::FloorMaterials,
        Topic::Simulator,
        Topic::Contact,
        Topic::Company,
    ];

    /// Label prefixed to the topic's block in the context string
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Services => "SERVICIOS",
            Topic::FloorMaterials => "MATERIALES DE PISOS",
            Topic::Simulator => "SIMULADOR",
            Topic::Contact => "CONTACTO",
            Topic::Company => "EMPRESA",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Services => "services",
            Topic::FloorMaterials => "floor_materials",
            Topic::Simulator => "simulator",
            Topic::Contact => "contact",
            Topic::Company => "company",
        }
    }
}

/// How a keyword is located inside the lower-cased query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring search. "precioso" matches "precio".
    #[default]
    Substring,
    /// The keyword must be delimited by non-alphanumeric characters or the
    /// ends of the query.
    WordBoundary,
}

/// Trigger keywords for one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicKeywordRule {
    pub topic: Topic,
    pub keywords: Vec<String>,
}

impl TopicKeywordRule {
    pub fn new(topic: Topic, keywords: &[&str]) -> Self {
        Self {
            topic,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// True if any keyword occurs in `query`, which must already be lower-cased
    pub fn matches(&self, query: &str, mode: MatchMode) -> bool {
        self.keywords.iter().any(|keyword| match mode {
            MatchMode::Substring => query.contains(keyword.as_str()),
            MatchMode::WordBoundary => contains_word(query, keyword),
        })
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    haystack.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// The keyword table for the company chat assistant
pub fn default_rules() -> Vec<TopicKeywordRule> {
    vec![
        TopicKeywordRule::new(
            Topic::Services,
            &["servicio", "qué hacen", "empresa", "ofrecen", "trabajo"],
        ),
        TopicKeywordRule::new(
            Topic::FloorMaterials,
            &["piso", "material", "madera", "cerámica", "mármol", "concreto", "precio"],
        ),
        TopicKeywordRule::new(
            Topic::Simulator,
            &["simulador", "funciona", "como usar", "inteligencia artificial", "ai"],
        ),
        TopicKeywordRule::new(
            Topic::Contact,
            &["contacto", "teléfono", "dirección", "ubicación", "horario"],
        ),
        TopicKeywordRule::new(
            Topic::Company,
            &["historia", "misión", "valores", "experiencia", "trayectoria"],
        ),
    ]
}
