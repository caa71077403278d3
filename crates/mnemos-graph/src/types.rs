// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-graph domain types.
//!
//! The serde layout of [`KnowledgeGraph`] is the persisted snapshot format:
//! `{ "entities": { <id>: {...} }, "relations": [ {...} ] }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named, typed node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier minted from the normalized name. Never regenerated.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Open-ended category tag (person, place, device, concept, ...).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Arbitrary key/value attributes; merged, not replaced, on update.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// ISO timestamp from which this fact applies.
    pub valid_from: String,
    /// ISO timestamp after which this fact no longer applies; absent means
    /// indefinitely valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    /// ISO timestamp of the most recent mutation.
    pub last_updated: String,
    /// ISO timestamp of creation. Insertion-order key for postprocessing.
    pub created_at: String,
    /// Prior states, appended (never rewritten) on every update.
    #[serde(default)]
    pub history: Vec<EntitySnapshot>,
    /// Soft-delete flag; entities are never physically removed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

/// The mutable portion of an entity, captured before each update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityVersion {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub confidence: f64,
    pub valid_from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
}

/// One archived pre-mutation state of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// When the superseding mutation happened.
    pub timestamp: String,
    /// The state that was replaced.
    pub old_value: EntityVersion,
}

impl Entity {
    /// Captures the current mutable state as a version record.
    pub fn version(&self) -> EntityVersion {
        EntityVersion {
            entity_type: self.entity_type.clone(),
            attributes: self.attributes.clone(),
            confidence: self.confidence,
            valid_from: self.valid_from.clone(),
            valid_to: self.valid_to.clone(),
        }
    }
}

/// A directed, labeled edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Source entity id; must exist in the entity map.
    pub source: String,
    /// Label (verb phrase).
    pub relation: String,
    /// Target entity id; must exist in the entity map.
    pub target: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// ISO timestamp of the last write.
    pub timestamp: String,
    /// ISO timestamp from which this fact applies.
    pub valid_from: String,
    /// ISO timestamp after which this fact no longer applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    /// Soft-delete flag.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl Relation {
    /// The identity triple used for dedup and in-place updates.
    pub fn triple(&self) -> (&str, &str, &str) {
        (&self.source, &self.relation, &self.target)
    }
}

/// The whole graph in its persisted shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl KnowledgeGraph {
    /// Entities ordered by creation time (id as tiebreak).
    ///
    /// This is the order the postprocessor walks: the first-created mention
    /// of a name is the canonical form later near-duplicates merge into.
    pub fn entities_in_creation_order(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.entities.values().collect();
        entities.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        entities
    }
}

/// Direction of a relation relative to the queried entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The queried entity is the source.
    Outbound,
    /// The queried entity is the target (a "reverse" row).
    Inbound,
}

/// One row returned by a relation query.
#[derive(Debug, Clone, Serialize)]
pub struct RelationView {
    /// Relation label.
    pub relation: String,
    /// The entity on the other end of the edge.
    pub other: String,
    /// Whether the queried entity was source or target.
    pub direction: Direction,
    /// Confidence of the underlying relation.
    pub confidence: f64,
}

/// Merge policy for entity attributes: union of keys, incoming value wins
/// per key (an update refreshes what it mentions and leaves the rest).
pub fn merge_attributes(
    existing: &mut BTreeMap<String, String>,
    incoming: &BTreeMap<String, String>,
) {
    for (key, value) in incoming {
        existing.insert(key.clone(), value.clone());
    }
}

/// Whether a validity window has lapsed at `now`.
///
/// Unparseable timestamps are treated as still valid rather than silently
/// expiring a fact.
pub fn is_expired(valid_to: Option<&str>, now: &chrono::DateTime<chrono::Utc>) -> bool {
    match valid_to {
        None => false,
        Some(ts) => match chrono::DateTime::parse_from_rfc3339(ts) {
            Ok(end) => end.with_timezone(&chrono::Utc) <= *now,
            Err(_) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity(id: &str, created_at: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: id.to_string(),
            entity_type: "person".to_string(),
            attributes: BTreeMap::new(),
            confidence: 0.9,
            valid_from: created_at.to_string(),
            valid_to: None,
            last_updated: created_at.to_string(),
            created_at: created_at.to_string(),
            history: vec![],
            deleted: false,
        }
    }

    #[test]
    fn graph_snapshot_layout() {
        let mut graph = KnowledgeGraph::default();
        graph
            .entities
            .insert("marie".into(), test_entity("marie", "2026-03-01T00:00:00Z"));
        graph.relations.push(Relation {
            source: "marie".into(),
            relation: "habite_à".into(),
            target: "paris".into(),
            confidence: 0.9,
            timestamp: "2026-03-01T00:00:00Z".into(),
            valid_from: "2026-03-01T00:00:00Z".into(),
            valid_to: None,
            deleted: false,
        });

        let json = serde_json::to_value(&graph).unwrap();
        assert!(json["entities"]["marie"]["name"].is_string());
        assert_eq!(json["entities"]["marie"]["type"], "person");
        assert_eq!(json["relations"][0]["relation"], "habite_à");
        // Soft-delete flag and empty valid_to are omitted from the document.
        assert!(json["entities"]["marie"].get("deleted").is_none());
        assert!(json["relations"][0].get("valid_to").is_none());
    }

    #[test]
    fn creation_order_sorts_by_timestamp_then_id() {
        let mut graph = KnowledgeGraph::default();
        graph
            .entities
            .insert("b".into(), test_entity("b", "2026-03-01T00:00:01Z"));
        graph
            .entities
            .insert("a".into(), test_entity("a", "2026-03-01T00:00:02Z"));
        graph
            .entities
            .insert("c".into(), test_entity("c", "2026-03-01T00:00:01Z"));

        let order: Vec<&str> = graph
            .entities_in_creation_order()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn merge_attributes_unions_and_overwrites() {
        let mut existing: BTreeMap<String, String> =
            [("age".to_string(), "29".to_string()), ("city".to_string(), "Lyon".to_string())]
                .into_iter()
                .collect();
        let incoming: BTreeMap<String, String> =
            [("age".to_string(), "30".to_string()), ("job".to_string(), "chef".to_string())]
                .into_iter()
                .collect();

        merge_attributes(&mut existing, &incoming);
        assert_eq!(existing.get("age").unwrap(), "30");
        assert_eq!(existing.get("city").unwrap(), "Lyon");
        assert_eq!(existing.get("job").unwrap(), "chef");
    }

    #[test]
    fn expiry_window() {
        let now = chrono::Utc::now();
        assert!(!is_expired(None, &now));
        assert!(is_expired(Some("2020-01-01T00:00:00Z"), &now));
        assert!(!is_expired(Some("2999-01-01T00:00:00Z"), &now));
        // Garbage timestamps never expire a fact.
        assert!(!is_expired(Some("not-a-date"), &now));
    }

    #[test]
    fn entity_version_captures_mutable_state() {
        let mut entity = test_entity("marie", "2026-03-01T00:00:00Z");
        entity.attributes.insert("age".into(), "30".into());
        let version = entity.version();
        assert_eq!(version.entity_type, "person");
        assert_eq!(version.attributes.get("age").unwrap(), "30");
    }
}
