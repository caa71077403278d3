// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based entity and relation extraction from conversation turns.
//!
//! Calls the generation service with a fixed extraction prompt, parses the
//! JSON reply (tolerating markdown fences and surrounding prose), and
//! applies the result to the graph store. Extraction failures yield zero
//! facts for the turn; they are logged and never surface to the user path.

use std::collections::BTreeMap;
use std::sync::Arc;

use mnemos_core::error::MnemosError;
use mnemos_core::traits::GenerationService;
use mnemos_core::types::GenerationTier;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::store::{GraphStore, NewEntity, RelationMeta};

/// Prompt for the extraction call. The reply must be a single JSON object.
const EXTRACTION_PROMPT: &str = r#"Extract the entities and relations stated in this message. Output a single JSON object.

Format:
{
  "entities": [{"name": "...", "type": "person|place|device|concept|other", "attributes": {"key": "value"}}],
  "relations": [{"source": "entity name", "relation": "verb phrase", "target": "entity name"}]
}

Rules:
1. Only include facts stated by the user, not guesses.
2. Use short verb phrases for relations ("habite_à", "travaille_pour").
3. Relation source and target must repeat entity names from the entities list.
4. If the message states no facts, return {"entities": [], "relations": []}.

Message:
{message}

Output JSON only, no explanation:"#;

/// An entity candidate parsed from the extraction reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    #[serde(rename = "type", default = "default_entity_type")]
    pub entity_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

fn default_entity_type() -> String {
    "concept".to_string()
}

/// A relation candidate parsed from the extraction reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedRelation {
    pub source: String,
    pub relation: String,
    pub target: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// The parsed result of one extraction call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedGraph {
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub relations: Vec<ExtractedRelation>,
}

impl ExtractedGraph {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// Derives entities and relations from free text via the generation
/// service and records them in the store.
pub struct GraphExtractor {
    generation: Arc<dyn GenerationService>,
}

impl GraphExtractor {
    pub fn new(generation: Arc<dyn GenerationService>) -> Self {
        Self { generation }
    }

    /// Runs one extraction call for `text`.
    ///
    /// A generation failure propagates as an error; an unparseable reply
    /// degrades to an empty result.
    pub async fn extract(&self, text: &str) -> Result<ExtractedGraph, MnemosError> {
        let prompt = EXTRACTION_PROMPT.replace("{message}", text);
        let response = self
            .generation
            .generate(&prompt, GenerationTier::Low, None)
            .await?;
        Ok(parse_extraction_response(&response))
    }

    /// Extracts from `text` and applies the result to `store` in one
    /// deferred batch, persisting once at the end.
    ///
    /// Returns the number of entities and relations recorded. Relations
    /// naming unknown entities are skipped, matching the store's
    /// referential-integrity rule.
    pub async fn extract_and_store(
        &self,
        store: &GraphStore,
        text: &str,
    ) -> Result<usize, MnemosError> {
        let extracted = self.extract(text).await?;
        if extracted.is_empty() {
            debug!("extraction produced no facts");
            return Ok(0);
        }

        store.set_batching(true);
        let mut recorded = 0usize;

        let mut ids: BTreeMap<String, String> = BTreeMap::new();
        for entity in &extracted.entities {
            let new = NewEntity {
                name: entity.name.clone(),
                entity_type: entity.entity_type.clone(),
                attributes: entity.attributes.clone(),
                confidence: None,
                valid_from: None,
                valid_to: None,
            };
            match store.add_entity(new).await {
                Ok(id) => {
                    ids.insert(entity.name.to_lowercase(), id);
                    recorded += 1;
                }
                Err(e) => {
                    warn!(name = entity.name.as_str(), error = %e, "failed to record extracted entity");
                }
            }
        }

        for relation in &extracted.relations {
            let source = match resolve_id(store, &ids, &relation.source).await {
                Some(id) => id,
                None => {
                    debug!(name = relation.source.as_str(), "relation source unknown, skipped");
                    continue;
                }
            };
            let target = match resolve_id(store, &ids, &relation.target).await {
                Some(id) => id,
                None => {
                    debug!(name = relation.target.as_str(), "relation target unknown, skipped");
                    continue;
                }
            };
            let meta = RelationMeta {
                confidence: relation.confidence,
                ..Default::default()
            };
            match store.add_relation(&source, &relation.relation, &target, meta).await {
                Ok(true) => recorded += 1,
                Ok(false) => {
                    debug!(
                        source = source.as_str(),
                        target = target.as_str(),
                        "relation endpoint missing, skipped"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "failed to record extracted relation");
                }
            }
        }

        store.flush().await?;
        debug!(recorded, "extraction applied to graph");
        Ok(recorded)
    }
}

/// Resolves an extracted entity name to a store id: first the ids minted
/// this turn, then an exact name lookup against the store.
async fn resolve_id(
    store: &GraphStore,
    minted: &BTreeMap<String, String>,
    name: &str,
) -> Option<String> {
    if let Some(id) = minted.get(&name.to_lowercase()) {
        return Some(id.clone());
    }
    store.find_entity_by_name(name).await
}

/// Parses the extraction reply into structured candidates.
///
/// Handles markdown code fences and surrounding prose. Returns an empty
/// result on parse failure rather than failing the whole turn.
pub fn parse_extraction_response(response: &str) -> ExtractedGraph {
    let trimmed = response.trim();
    let start = trimmed.find('{').unwrap_or(0);
    let end = trimmed.rfind('}').map(|i| i + 1).unwrap_or(trimmed.len());
    let json_str = &trimmed[start..end.max(start)];

    match serde_json::from_str::<ExtractedGraph>(json_str) {
        Ok(extracted) => extracted,
        Err(e) => {
            warn!("failed to parse extraction response: {e}");
            debug!("raw response: {response}");
            metrics::counter!("mnemos_graph_extraction_parse_failures").increment(1);
            ExtractedGraph::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_object() {
        let response = r#"{
            "entities": [
                {"name": "Marie", "type": "person", "attributes": {"age": "30"}},
                {"name": "Paris", "type": "place"}
            ],
            "relations": [
                {"source": "Marie", "relation": "habite_à", "target": "Paris"}
            ]
        }"#;
        let extracted = parse_extraction_response(response);
        assert_eq!(extracted.entities.len(), 2);
        assert_eq!(extracted.entities[0].name, "Marie");
        assert_eq!(extracted.entities[0].attributes.get("age").unwrap(), "30");
        assert_eq!(extracted.relations.len(), 1);
        assert_eq!(extracted.relations[0].relation, "habite_à");
    }

    #[test]
    fn parse_markdown_code_block() {
        let response = "```json\n{\"entities\": [{\"name\": \"Berlin\", \"type\": \"place\"}], \"relations\": []}\n```";
        let extracted = parse_extraction_response(response);
        assert_eq!(extracted.entities.len(), 1);
        assert_eq!(extracted.entities[0].name, "Berlin");
    }

    #[test]
    fn parse_with_surrounding_text() {
        let response = "Here you go:\n{\"entities\": [], \"relations\": []}\nDone.";
        let extracted = parse_extraction_response(response);
        assert!(extracted.is_empty());
    }

    #[test]
    fn parse_malformed_returns_empty() {
        let extracted = parse_extraction_response("not json at all");
        assert!(extracted.is_empty());
    }

    #[test]
    fn missing_type_defaults_to_concept() {
        let response = r#"{"entities": [{"name": "jazz"}], "relations": []}"#;
        let extracted = parse_extraction_response(response);
        assert_eq!(extracted.entities[0].entity_type, "concept");
    }

    #[test]
    fn extraction_prompt_mentions_the_contract() {
        assert!(EXTRACTION_PROMPT.contains("\"entities\""));
        assert!(EXTRACTION_PROMPT.contains("\"relations\""));
        assert!(EXTRACTION_PROMPT.contains("{message}"));
        assert!(EXTRACTION_PROMPT.contains("Output JSON only"));
    }
}
