//! Context Retriever - Selects the fact sheets relevant to a chat message

use super::facts::KnowledgeBase;
use super::rules::{default_rules, MatchMode, Topic, TopicKeywordRule};
use crate::config::KnowledgeConfig;
use crate::errors::Result;
use tracing::debug;

/// Pre-rendered topic block
#[derive(Debug, Clone)]
struct TopicBlock {
    topic: Topic,
    text: String,
    rule: TopicKeywordRule,
}

/// Keyword-driven context builder over a [`KnowledgeBase`]
#[derive(Debug, Clone)]
pub struct ContextRetriever {
    /// Ordered by [`Topic::PRIORITY`]
    blocks: Vec<TopicBlock>,
    mode: MatchMode,
}

impl ContextRetriever {
    /// Create a retriever; `rules` without an entry for a topic leave that topic unreachable
    pub fn new(kb: &KnowledgeBase, rules: Vec<TopicKeywordRule>, mode: MatchMode) -> Result<Self> {
        let mut blocks = Vec::with_capacity(Topic::PRIORITY.len());
        for topic in Topic::PRIORITY {
            let keywords: Vec<String> = rules
                .iter()
                .filter(|r| r.topic == topic)
                .flat_map(|r| r.keywords.iter().cloned())
                .collect();
            if keywords.is_empty() {
                continue;
            }
            let text = format!("{}: {}", topic.label(), kb.render(topic)?);
            blocks.push(TopicBlock {
                topic,
                text,
                rule: TopicKeywordRule { topic, keywords },
            });
        }
        Ok(Self { blocks, mode })
    }

    /// Build the retriever described by configuration
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self> {
        let kb = match &config.fixture_path {
            Some(path) => KnowledgeBase::from_json_file(path)?,
            None => KnowledgeBase::cimientos(),
        };
        Self::new(&kb, default_rules(), config.match_mode)
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Topics whose keywords occur in `query`, in output order
    pub fn matched_topics(&self, query: &str) -> Vec<Topic> {
        let query = query.to_lowercase();
        self.matching_blocks(&query).map(|b| b.topic).collect()
    }

    /// Labeled blocks for every matching topic joined by newlines; empty when nothing matches
    pub fn get_context(&self, query: &str) -> String {
        let query = query.to_lowercase();
        let parts: Vec<&str> = self
            .matching_blocks(&query)
            .map(|b| b.text.as_str())
            .collect();

        debug!(matched = parts.len(), "Knowledge context assembled");
        parts.join("\n")
    }

    fn matching_blocks<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a TopicBlock> + 'a {
        self.blocks
            .iter()
            .filter(move |b| b.rule.matches(query, self.mode))
    }
}

impl Default for ContextRetriever {
    fn default() -> Self {
        let kb = KnowledgeBase::cimientos();
        Self::new(&kb, default_rules(), MatchMode::default())
            .expect("embedded fact sheets are plain string records and always render")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retriever() -> ContextRetriever {
        ContextRetriever::new(&KnowledgeBase::cimientos(), default_rules(), MatchMode::Substring)
            .unwrap()
    }

    #[test]
    fn test_no_match_is_empty() {
        assert_eq!(retriever().get_context("hola"), "");
        assert_eq!(retriever().get_context(""), "");
    }

    #[test]
    fn test_material_keywords_include_materials_block() {
        let r = retriever();
        for query in ["Tienen pisos de MADERA?", "¿Qué precio tiene?", "cerámica"] {
            let context = r.get_context(query);
            assert!(
                context.contains("MATERIALES DE PISOS: "),
                "query {:?} gave {:?}",
                query,
                context
            );
        }
    }

    #[test]
    fn test_block_order_is_fixed() {
        let r = retriever();
        let context = r.get_context("Necesito el contacto de su servicio");
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("SERVICIOS: "));
        assert!(lines[1].starts_with("CONTACTO: "));
    }

    #[test]
    fn test_all_topics_in_priority_order() {
        let r = retriever();
        let query = "historia, horario, simulador, precio y servicio";
        assert_eq!(r.matched_topics(query), Topic::PRIORITY.to_vec());

        let context = r.get_context(query);
        let labels: Vec<&str> = context
            .lines()
            .map(|l| l.split(": ").next().unwrap())
            .collect();
        assert_eq!(
            labels,
            vec!["SERVICIOS", "MATERIALES DE PISOS", "SIMULADOR", "CONTACTO", "EMPRESA"]
        );
    }

    #[test]
    fn test_block_carries_sheet_content() {
        let context = retriever().get_context("¿Cuál es su teléfono?");
        assert!(context.starts_with("CONTACTO: {"));
        assert!(context.contains("+57 320 273 8391"));
        assert!(context.contains("cimientos2025@gmail.com"));
    }

    #[test]
    fn test_substring_false_positive_is_preserved() {
        // "apreciosidad" contains "precio"
        let topics = retriever().matched_topics("qué apreciosidad");
        assert_eq!(topics, vec![Topic::FloorMaterials]);
    }

    #[test]
    fn test_word_boundary_mode_tightens_matching() {
        let r = ContextRetriever::new(
            &KnowledgeBase::cimientos(),
            default_rules(),
            MatchMode::WordBoundary,
        )
        .unwrap();
        assert_eq!(r.get_context("qué apreciosidad"), "");
        assert_eq!(r.matched_topics("el precio"), vec![Topic::FloorMaterials]);
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let rules = vec![TopicKeywordRule::new(Topic::Contact, &["llamar"])];
        let r = ContextRetriever::new(&KnowledgeBase::cimientos(), rules, MatchMode::Substring)
            .unwrap();
        assert_eq!(r.matched_topics("quiero llamar por el precio"), vec![Topic::Contact]);
    }

    #[test]
    fn test_pure_function_of_input() {
        let r = ContextRetriever::default();
        let query = "Cómo funciona el simulador";
        assert_eq!(r.get_context(query), r.get_context(query));
        assert!(r.get_context(query).starts_with("SIMULADOR: "));
    }

    #[test]
    fn test_default_covers_every_topic() {
        let r = ContextRetriever::default();
        let query = "historia, horario, simulador, precio y servicio";
        assert_eq!(r.matched_topics(query), Topic::PRIORITY.to_vec());
        assert_eq!(r.get_context(query), retriever().get_context(query));
    }

    #[test]
    fn test_from_config_uses_embedded_fixture() {
        let r = ContextRetriever::from_config(&KnowledgeConfig::default()).unwrap();
        assert_eq!(r.match_mode(), MatchMode::Substring);
        assert!(r.get_context("misión").starts_with("EMPRESA: "));
    }
}
