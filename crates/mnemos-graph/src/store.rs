// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The knowledge-graph store.
//!
//! In-memory graph of entities and relations backed by durable snapshot
//! storage. Writes follow the save discipline: back up the previous
//! snapshot, postprocess the whole graph, swap the postprocessed graph in,
//! then serialize. Concurrent savers each produce a self-consistent
//! snapshot; the last writer wins.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mnemos_config::model::GraphConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SnapshotStorage;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ident;
use crate::postprocess::postprocess_graph;
use crate::types::{
    is_expired, merge_attributes, Direction, Entity, EntitySnapshot, KnowledgeGraph, Relation,
    RelationView,
};

/// Input for [`GraphStore::add_entity`].
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub name: String,
    pub entity_type: String,
    pub attributes: BTreeMap<String, String>,
    /// Defaults to the configured confidence when absent.
    pub confidence: Option<f64>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            attributes: BTreeMap::new(),
            confidence: None,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_validity(
        mut self,
        valid_from: Option<String>,
        valid_to: Option<String>,
    ) -> Self {
        self.valid_from = valid_from;
        self.valid_to = valid_to;
        self
    }
}

/// Optional metadata for [`GraphStore::add_relation`].
#[derive(Debug, Clone, Default)]
pub struct RelationMeta {
    pub confidence: Option<f64>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
}

/// Durable store of entities and relations.
pub struct GraphStore {
    graph: RwLock<KnowledgeGraph>,
    storage: Arc<dyn SnapshotStorage>,
    key: String,
    config: GraphConfig,
    /// When set, mutation persistence is deferred until [`flush`].
    batching: AtomicBool,
}

impl GraphStore {
    /// Loads the graph from storage, falling back to an empty graph when
    /// the snapshot is absent or malformed. Load problems are logged, never
    /// raised; a corrupt file must not take the process down.
    pub async fn load(
        storage: Arc<dyn SnapshotStorage>,
        key: impl Into<String>,
        config: GraphConfig,
    ) -> Self {
        let key = key.into();
        let graph = match storage.read(&key).await {
            Ok(Some(contents)) => match serde_json::from_str::<KnowledgeGraph>(&contents) {
                Ok(graph) => {
                    debug!(
                        entities = graph.entities.len(),
                        relations = graph.relations.len(),
                        "graph snapshot loaded"
                    );
                    graph
                }
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "malformed graph snapshot, starting empty");
                    KnowledgeGraph::default()
                }
            },
            Ok(None) => KnowledgeGraph::default(),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "failed to read graph snapshot, starting empty");
                KnowledgeGraph::default()
            }
        };

        Self {
            graph: RwLock::new(graph),
            storage,
            key,
            config,
            batching: AtomicBool::new(false),
        }
    }

    /// Adds an entity, or updates the existing entity carrying the same
    /// name (case-insensitive exact match).
    ///
    /// On update the pre-mutation state is archived into `history`, the
    /// type is overwritten, attributes are merged, and confidence/validity
    /// are refreshed; the existing id is returned. Otherwise a new id is
    /// minted from the normalized name, with a numeric suffix on collision.
    pub async fn add_entity(&self, new: NewEntity) -> Result<String, MnemosError> {
        let now = now_iso();
        let id = {
            let mut graph = self.graph.write().await;
            let name_lower = new.name.to_lowercase();
            let existing_id = graph
                .entities
                .values()
                .find(|e| e.name.to_lowercase() == name_lower)
                .map(|e| e.id.clone());

            match existing_id {
                Some(id) => {
                    let entity = graph
                        .entities
                        .get_mut(&id)
                        .expect("entity disappeared under write lock");
                    entity.history.push(EntitySnapshot {
                        timestamp: now.clone(),
                        old_value: entity.version(),
                    });
                    entity.entity_type = new.entity_type;
                    merge_attributes(&mut entity.attributes, &new.attributes);
                    entity.confidence =
                        new.confidence.unwrap_or(self.config.default_confidence);
                    if let Some(valid_from) = new.valid_from {
                        entity.valid_from = valid_from;
                    }
                    entity.valid_to = new.valid_to;
                    entity.deleted = false;
                    entity.last_updated = now;
                    id
                }
                None => {
                    let id =
                        ident::mint_id(&new.name, |candidate| graph.entities.contains_key(candidate));
                    let entity = Entity {
                        id: id.clone(),
                        name: new.name,
                        entity_type: new.entity_type,
                        attributes: new.attributes,
                        confidence: new.confidence.unwrap_or(self.config.default_confidence),
                        valid_from: new.valid_from.unwrap_or_else(|| now.clone()),
                        valid_to: new.valid_to,
                        last_updated: now.clone(),
                        created_at: now,
                        history: vec![],
                        deleted: false,
                    };
                    graph.entities.insert(id.clone(), entity);
                    id
                }
            }
        };

        self.maybe_persist().await?;
        Ok(id)
    }

    /// Finds a live entity by exact case-insensitive name. No fuzzy
    /// matching here; that is the postprocessor's job at save time.
    pub async fn find_entity_by_name(&self, name: &str) -> Option<String> {
        let name_lower = name.to_lowercase();
        let graph = self.graph.read().await;
        graph
            .entities
            .values()
            .find(|e| !e.deleted && e.name.to_lowercase() == name_lower)
            .map(|e| e.id.clone())
    }

    /// Adds a directed relation between two existing entities.
    ///
    /// Returns `false` (with the graph unchanged) when either endpoint id
    /// is absent. Re-adding an existing triple updates confidence,
    /// timestamp, and validity in place instead of duplicating.
    pub async fn add_relation(
        &self,
        source_id: &str,
        relation: &str,
        target_id: &str,
        meta: RelationMeta,
    ) -> Result<bool, MnemosError> {
        let now = now_iso();
        {
            let mut graph = self.graph.write().await;
            if !graph.entities.contains_key(source_id)
                || !graph.entities.contains_key(target_id)
            {
                warn!(
                    source = source_id,
                    target = target_id,
                    relation,
                    "relation references missing entity, rejected"
                );
                return Ok(false);
            }

            let confidence = meta.confidence.unwrap_or(self.config.default_confidence);
            let existing = graph.relations.iter_mut().find(|r| {
                r.triple() == (source_id, relation, target_id)
            });
            match existing {
                Some(r) => {
                    r.confidence = confidence;
                    r.timestamp = now.clone();
                    if let Some(valid_from) = meta.valid_from {
                        r.valid_from = valid_from;
                    }
                    r.valid_to = meta.valid_to;
                    r.deleted = false;
                }
                None => {
                    graph.relations.push(Relation {
                        source: source_id.to_string(),
                        relation: relation.to_string(),
                        target: target_id.to_string(),
                        confidence,
                        timestamp: now.clone(),
                        valid_from: meta.valid_from.unwrap_or_else(|| now.clone()),
                        valid_to: meta.valid_to,
                        deleted: false,
                    });
                }
            }
        }

        self.maybe_persist().await?;
        Ok(true)
    }

    /// Relations touching an entity, as source (outbound) or target
    /// (inbound), optionally filtered by label and expiry.
    pub async fn query_relations(
        &self,
        entity_id: &str,
        relation_type: Option<&str>,
        include_expired: bool,
    ) -> Vec<RelationView> {
        let now = chrono::Utc::now();
        let graph = self.graph.read().await;
        let mut views = Vec::new();
        for r in &graph.relations {
            if !include_expired && (r.deleted || is_expired(r.valid_to.as_deref(), &now)) {
                continue;
            }
            if let Some(label) = relation_type {
                if r.relation != label {
                    continue;
                }
            }
            if r.source == entity_id {
                views.push(RelationView {
                    relation: r.relation.clone(),
                    other: r.target.clone(),
                    direction: Direction::Outbound,
                    confidence: r.confidence,
                });
            } else if r.target == entity_id {
                views.push(RelationView {
                    relation: r.relation.clone(),
                    other: r.source.clone(),
                    direction: Direction::Inbound,
                    confidence: r.confidence,
                });
            }
        }
        views
    }

    /// All live entities, optionally including expired/soft-deleted ones.
    pub async fn get_all_entities(&self, include_expired: bool) -> Vec<Entity> {
        let now = chrono::Utc::now();
        let graph = self.graph.read().await;
        graph
            .entities
            .values()
            .filter(|e| {
                include_expired || (!e.deleted && !is_expired(e.valid_to.as_deref(), &now))
            })
            .cloned()
            .collect()
    }

    /// All live relations, optionally including expired/soft-deleted ones.
    pub async fn get_all_relations(&self, include_expired: bool) -> Vec<Relation> {
        let now = chrono::Utc::now();
        let graph = self.graph.read().await;
        graph
            .relations
            .iter()
            .filter(|r| {
                include_expired || (!r.deleted && !is_expired(r.valid_to.as_deref(), &now))
            })
            .cloned()
            .collect()
    }

    /// Current state plus archived snapshots, newest first. `None` when the
    /// entity does not exist.
    pub async fn get_entity_history(&self, entity_id: &str) -> Option<Vec<EntitySnapshot>> {
        let graph = self.graph.read().await;
        let entity = graph.entities.get(entity_id)?;
        let mut entries = Vec::with_capacity(entity.history.len() + 1);
        entries.push(EntitySnapshot {
            timestamp: entity.last_updated.clone(),
            old_value: entity.version(),
        });
        entries.extend(entity.history.iter().rev().cloned());
        Some(entries)
    }

    /// Cheap symbolic context for a query: entities whose names occur in
    /// the text, with their attributes and up to 5 relations each, as a
    /// plain-text block. Never touches the network or the generation
    /// service.
    pub async fn get_context_for_query(&self, text: &str, max_results: usize) -> String {
        let text_lower = text.to_lowercase();
        let now = chrono::Utc::now();
        let graph = self.graph.read().await;

        let mut lines: Vec<String> = Vec::new();
        let mut matched = 0usize;
        for entity in graph.entities_in_creation_order() {
            if matched >= max_results {
                break;
            }
            if entity.deleted || is_expired(entity.valid_to.as_deref(), &now) {
                continue;
            }
            let name_lower = entity.name.to_lowercase();
            if name_lower.is_empty() || !text_lower.contains(&name_lower) {
                continue;
            }
            matched += 1;

            let mut header = format!("{} ({})", entity.name, entity.entity_type);
            if !entity.attributes.is_empty() {
                let attrs: Vec<String> = entity
                    .attributes
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                header.push_str(": ");
                header.push_str(&attrs.join(", "));
            }
            lines.push(header);

            let mut shown = 0usize;
            for r in &graph.relations {
                if shown >= 5 {
                    break;
                }
                if r.deleted || is_expired(r.valid_to.as_deref(), &now) {
                    continue;
                }
                let line = if r.source == entity.id {
                    let other = display_name(&graph, &r.target);
                    format!("  - {} {} {}", entity.name, r.relation, other)
                } else if r.target == entity.id {
                    let other = display_name(&graph, &r.source);
                    format!("  - {} {} {}", other, r.relation, entity.name)
                } else {
                    continue;
                };
                lines.push(line);
                shown += 1;
            }
        }

        lines.join("\n")
    }

    /// Soft-deletes an entity. Returns `false` when the id is unknown.
    pub async fn remove_entity(&self, entity_id: &str) -> Result<bool, MnemosError> {
        let now = now_iso();
        {
            let mut graph = self.graph.write().await;
            let Some(entity) = graph.entities.get_mut(entity_id) else {
                return Ok(false);
            };
            entity.history.push(EntitySnapshot {
                timestamp: now.clone(),
                old_value: entity.version(),
            });
            entity.deleted = true;
            entity.last_updated = now;
        }
        self.maybe_persist().await?;
        Ok(true)
    }

    /// Soft-deletes a relation triple. Returns `false` when absent.
    pub async fn remove_relation(
        &self,
        source_id: &str,
        relation: &str,
        target_id: &str,
    ) -> Result<bool, MnemosError> {
        let found = {
            let mut graph = self.graph.write().await;
            match graph
                .relations
                .iter_mut()
                .find(|r| r.triple() == (source_id, relation, target_id))
            {
                Some(r) => {
                    r.deleted = true;
                    r.timestamp = now_iso();
                    true
                }
                None => false,
            }
        };
        if found {
            self.maybe_persist().await?;
        }
        Ok(found)
    }

    /// Defers (or resumes) persistence for bulk imports.
    pub fn set_batching(&self, on: bool) {
        self.batching.store(on, Ordering::SeqCst);
    }

    /// Ends a batch and persists once.
    pub async fn flush(&self) -> Result<(), MnemosError> {
        self.batching.store(false, Ordering::SeqCst);
        self.persist().await
    }

    /// Runs a full save: backup, postprocess, swap, serialize.
    ///
    /// Postprocessing runs over the entire graph on every save and is
    /// idempotent, so re-running it on an already-processed snapshot is
    /// safe.
    pub async fn persist(&self) -> Result<(), MnemosError> {
        if let Err(e) = self.storage.backup(&self.key).await {
            warn!(key = self.key.as_str(), error = %e, "snapshot backup failed, saving anyway");
        }

        let serialized = {
            let mut graph = self.graph.write().await;
            let processed = postprocess_graph(&graph, &self.config);
            let serialized = serde_json::to_string_pretty(&processed).map_err(|e| {
                MnemosError::Storage {
                    source: Box::new(e),
                }
            })?;
            *graph = processed;
            serialized
        };

        self.storage.write(&self.key, &serialized).await?;
        debug!(key = self.key.as_str(), "graph persisted");
        Ok(())
    }

    /// Number of live entities.
    pub async fn entity_count(&self) -> usize {
        self.graph.read().await.entities.values().filter(|e| !e.deleted).count()
    }

    /// Number of live relations.
    pub async fn relation_count(&self) -> usize {
        self.graph.read().await.relations.iter().filter(|r| !r.deleted).count()
    }

    async fn maybe_persist(&self) -> Result<(), MnemosError> {
        if self.batching.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.persist().await
    }
}

fn display_name(graph: &KnowledgeGraph, id: &str) -> String {
    graph
        .entities
        .get(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_test_utils::MemoryStorage;

    async fn empty_store() -> GraphStore {
        let storage = Arc::new(MemoryStorage::new());
        GraphStore::load(storage, "graph.json", GraphConfig::default()).await
    }

    #[tokio::test]
    async fn add_entity_then_update_returns_same_id() {
        let store = empty_store().await;

        let id = store
            .add_entity(NewEntity::new("Marie", "person"))
            .await
            .unwrap();
        assert_eq!(id, "marie");

        let id2 = store
            .add_entity(NewEntity::new("marie", "person").with_attribute("age", "30"))
            .await
            .unwrap();
        assert_eq!(id2, "marie");

        let entities = store.get_all_entities(false).await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].attributes.get("age").unwrap(), "30");
        assert_eq!(entities[0].history.len(), 1);
    }

    #[tokio::test]
    async fn update_archives_pre_mutation_state() {
        let store = empty_store().await;
        store
            .add_entity(NewEntity::new("Marie", "person").with_attribute("age", "29"))
            .await
            .unwrap();
        store
            .add_entity(NewEntity::new("Marie", "human").with_attribute("age", "30"))
            .await
            .unwrap();

        let history = store.get_entity_history("marie").await.unwrap();
        // Current state first, archived snapshot second.
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_value.entity_type, "human");
        assert_eq!(history[0].old_value.attributes.get("age").unwrap(), "30");
        assert_eq!(history[1].old_value.entity_type, "person");
        assert_eq!(history[1].old_value.attributes.get("age").unwrap(), "29");
    }

    #[tokio::test]
    async fn colliding_normalized_names_get_suffixed_ids() {
        let store = empty_store().await;
        store.set_batching(true);
        let id1 = store
            .add_entity(NewEntity::new("Jean-Luc", "person"))
            .await
            .unwrap();
        let id2 = store
            .add_entity(NewEntity::new("Jean Luc", "person"))
            .await
            .unwrap();
        assert_eq!(id1, "jean_luc");
        assert_eq!(id2, "jean_luc_2");
    }

    #[tokio::test]
    async fn relation_against_missing_entity_fails() {
        let store = empty_store().await;
        store
            .add_entity(NewEntity::new("Marie", "person"))
            .await
            .unwrap();

        let ok = store
            .add_relation("marie", "habite_à", "paris", RelationMeta::default())
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(store.relation_count().await, 0);
    }

    #[tokio::test]
    async fn readding_triple_updates_in_place() {
        let store = empty_store().await;
        store.add_entity(NewEntity::new("Marie", "person")).await.unwrap();
        store.add_entity(NewEntity::new("Paris", "place")).await.unwrap();

        assert!(store
            .add_relation("marie", "habite_à", "paris", RelationMeta::default())
            .await
            .unwrap());
        assert!(store
            .add_relation(
                "marie",
                "habite_à",
                "paris",
                RelationMeta {
                    confidence: Some(0.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap());

        let relations = store.get_all_relations(false).await;
        assert_eq!(relations.len(), 1);
        assert!((relations[0].confidence - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn query_relations_labels_directions() {
        let store = empty_store().await;
        store.add_entity(NewEntity::new("Marie", "person")).await.unwrap();
        store.add_entity(NewEntity::new("Paris", "place")).await.unwrap();
        store.add_entity(NewEntity::new("Luc", "person")).await.unwrap();
        store
            .add_relation("marie", "habite_à", "paris", RelationMeta::default())
            .await
            .unwrap();
        store
            .add_relation("luc", "connait", "marie", RelationMeta::default())
            .await
            .unwrap();

        let views = store.query_relations("marie", None, false).await;
        assert_eq!(views.len(), 2);
        let outbound = views.iter().find(|v| v.direction == Direction::Outbound).unwrap();
        assert_eq!(outbound.relation, "habite_à");
        assert_eq!(outbound.other, "paris");
        let inbound = views.iter().find(|v| v.direction == Direction::Inbound).unwrap();
        assert_eq!(inbound.relation, "connait");
        assert_eq!(inbound.other, "luc");

        let filtered = store
            .query_relations("marie", Some("habite_à"), false)
            .await;
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn expired_relations_are_filtered() {
        let store = empty_store().await;
        store.add_entity(NewEntity::new("Marie", "person")).await.unwrap();
        store.add_entity(NewEntity::new("Lyon", "place")).await.unwrap();
        store
            .add_relation(
                "marie",
                "habite_à",
                "lyon",
                RelationMeta {
                    valid_to: Some("2020-01-01T00:00:00Z".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(store.query_relations("marie", None, false).await.is_empty());
        assert_eq!(store.query_relations("marie", None, true).await.len(), 1);
    }

    #[tokio::test]
    async fn context_for_query_matches_substrings() {
        let store = empty_store().await;
        store
            .add_entity(NewEntity::new("Marie", "person").with_attribute("age", "30"))
            .await
            .unwrap();
        store.add_entity(NewEntity::new("Paris", "place")).await.unwrap();
        store
            .add_relation("marie", "habite_à", "paris", RelationMeta::default())
            .await
            .unwrap();

        let context = store
            .get_context_for_query("où habite Marie en ce moment ?", 3)
            .await;
        assert!(context.contains("Marie (person): age=30"));
        assert!(context.contains("Marie habite_à Paris"));

        let empty = store.get_context_for_query("quelle heure est-il ?", 3).await;
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn soft_delete_hides_but_keeps_entity() {
        let store = empty_store().await;
        store.add_entity(NewEntity::new("Marie", "person")).await.unwrap();

        assert!(store.remove_entity("marie").await.unwrap());
        assert!(store.get_all_entities(false).await.is_empty());
        assert_eq!(store.get_all_entities(true).await.len(), 1);
        assert!(store.find_entity_by_name("Marie").await.is_none());
        // History retained through the soft delete.
        assert!(store.get_entity_history("marie").await.is_some());
    }

    #[tokio::test]
    async fn persist_backs_up_and_postprocesses() {
        let storage = Arc::new(MemoryStorage::new());
        let store = GraphStore::load(
            storage.clone() as Arc<dyn SnapshotStorage>,
            "graph.json",
            GraphConfig::default(),
        )
        .await;

        store.set_batching(true);
        store
            .add_entity(NewEntity::new("Jean-Pierre Dupont", "person"))
            .await
            .unwrap();
        store
            .add_entity(NewEntity::new("Jean-Pierre Dupond", "person"))
            .await
            .unwrap();
        store.flush().await.unwrap();

        // Fuzzy merge folded the two near-duplicates on save.
        assert_eq!(store.entity_count().await, 1);

        // Second save produces a backup of the first snapshot.
        store.add_entity(NewEntity::new("Paris", "place")).await.unwrap();
        assert!(storage.keys().await.iter().any(|k| k.contains(".backup.")));
    }

    #[tokio::test]
    async fn batching_defers_persistence() {
        let storage = Arc::new(MemoryStorage::new());
        let store = GraphStore::load(
            storage.clone() as Arc<dyn SnapshotStorage>,
            "graph.json",
            GraphConfig::default(),
        )
        .await;

        store.set_batching(true);
        store.add_entity(NewEntity::new("Marie", "person")).await.unwrap();
        assert!(!storage.contains("graph.json").await);

        store.flush().await.unwrap();
        assert!(storage.contains("graph.json").await);
    }

    #[tokio::test]
    async fn malformed_snapshot_falls_back_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write("graph.json", "{ not json").await.unwrap();
        let store = GraphStore::load(
            storage as Arc<dyn SnapshotStorage>,
            "graph.json",
            GraphConfig::default(),
        )
        .await;
        assert_eq!(store.entity_count().await, 0);
    }

    #[tokio::test]
    async fn reload_round_trips_the_graph() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let store = GraphStore::load(
                storage.clone() as Arc<dyn SnapshotStorage>,
                "graph.json",
                GraphConfig::default(),
            )
            .await;
            store
                .add_entity(NewEntity::new("Marie", "person").with_attribute("age", "30"))
                .await
                .unwrap();
            store.add_entity(NewEntity::new("Paris", "place")).await.unwrap();
            store
                .add_relation("marie", "habite_à", "paris", RelationMeta::default())
                .await
                .unwrap();
        }

        let reloaded = GraphStore::load(
            storage as Arc<dyn SnapshotStorage>,
            "graph.json",
            GraphConfig::default(),
        )
        .await;
        assert_eq!(reloaded.entity_count().await, 2);
        assert_eq!(reloaded.relation_count().await, 1);
        assert_eq!(
            reloaded.find_entity_by_name("marie").await.unwrap(),
            "marie"
        );
    }
}
