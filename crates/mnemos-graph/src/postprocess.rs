// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-graph normalization applied at save time.
//!
//! Pure functions over a graph snapshot: alias-table name normalization,
//! name-to-type refinement, relation-label rewriting, fuzzy entity merge,
//! and relation dedup. The pipeline is idempotent and runs on every
//! persist, so it must never assume a pristine input.

use std::collections::{BTreeMap, HashMap, HashSet};

use mnemos_config::model::GraphConfig;
use tracing::debug;

use crate::types::{merge_attributes, Entity, KnowledgeGraph, Relation};

/// Maps a raw name through the alias table (exact, case-insensitive key
/// match). Unknown names pass through unchanged.
pub fn normalize_name(name: &str, aliases: &BTreeMap<String, String>) -> String {
    let lower = name.to_lowercase();
    aliases
        .iter()
        .find(|(key, _)| key.to_lowercase() == lower)
        .map(|(_, canonical)| canonical.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Maps a normalized name to a refined type, falling back to the entity's
/// existing type.
pub fn refine_type(
    name: &str,
    existing_type: &str,
    overrides: &BTreeMap<String, String>,
) -> String {
    let lower = name.to_lowercase();
    overrides
        .iter()
        .find(|(key, _)| key.to_lowercase() == lower)
        .map(|(_, refined)| refined.clone())
        .unwrap_or_else(|| existing_type.to_string())
}

/// Maps a relation label through the synonym table (case-insensitive).
pub fn rewrite_relation(label: &str, synonyms: &BTreeMap<String, String>) -> String {
    let lower = label.to_lowercase();
    synonyms
        .iter()
        .find(|(key, _)| key.to_lowercase() == lower)
        .map(|(_, canonical)| canonical.clone())
        .unwrap_or_else(|| label.to_string())
}

/// Runs the full postprocessing pipeline over a graph snapshot.
///
/// Entities are walked in creation order; when a candidate's normalized
/// name is similar to an already-accepted entity's name at or above
/// `merge_threshold`, the candidate is folded into the accepted entity
/// (attribute union, accepted id kept) and every relation reference to the
/// candidate's id is remapped. First-seen canonical form wins; the order
/// dependence is deliberate.
pub fn postprocess_graph(graph: &KnowledgeGraph, config: &GraphConfig) -> KnowledgeGraph {
    let mut accepted: Vec<Entity> = Vec::new();
    let mut id_remap: HashMap<String, String> = HashMap::new();
    let mut merged_count = 0usize;

    for entity in graph.entities_in_creation_order() {
        let normalized = normalize_name(&entity.name, &config.aliases);
        let refined_type = refine_type(&normalized, &entity.entity_type, &config.type_overrides);

        let candidate_key = normalized.to_lowercase();
        let mut best: Option<(usize, f64)> = None;
        for (idx, existing) in accepted.iter().enumerate() {
            let ratio =
                strsim::normalized_levenshtein(&existing.name.to_lowercase(), &candidate_key);
            if best.is_none_or(|(_, b)| ratio > b) {
                best = Some((idx, ratio));
            }
        }

        match best {
            Some((idx, ratio)) if ratio >= config.merge_threshold => {
                let existing = &mut accepted[idx];
                debug!(
                    candidate = entity.name.as_str(),
                    kept = existing.name.as_str(),
                    ratio,
                    "merging near-duplicate entity"
                );
                merge_attributes(&mut existing.attributes, &entity.attributes);
                id_remap.insert(entity.id.clone(), existing.id.clone());
                merged_count += 1;
            }
            _ => {
                let mut kept = entity.clone();
                kept.name = normalized;
                kept.entity_type = refined_type;
                accepted.push(kept);
            }
        }
    }

    if merged_count > 0 {
        metrics::counter!("mnemos_graph_entities_merged").increment(merged_count as u64);
    }

    // Rewrite labels, remap merged ids, then drop duplicate triples
    // (first occurrence wins).
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut relations: Vec<Relation> = Vec::new();
    for relation in &graph.relations {
        let mut rewritten = relation.clone();
        rewritten.relation = rewrite_relation(&relation.relation, &config.relation_synonyms);
        if let Some(mapped) = id_remap.get(&rewritten.source) {
            rewritten.source = mapped.clone();
        }
        if let Some(mapped) = id_remap.get(&rewritten.target) {
            rewritten.target = mapped.clone();
        }
        rewritten.confidence = (rewritten.confidence * 100.0).round() / 100.0;

        let key = (
            rewritten.source.clone(),
            rewritten.relation.clone(),
            rewritten.target.clone(),
        );
        if seen.insert(key) {
            relations.push(rewritten);
        }
    }

    let entities = accepted
        .into_iter()
        .map(|e| (e.id.clone(), e))
        .collect::<BTreeMap<_, _>>();

    KnowledgeGraph {
        entities,
        relations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str, created_at: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
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

    fn relation(source: &str, label: &str, target: &str) -> Relation {
        Relation {
            source: source.to_string(),
            relation: label.to_string(),
            target: target.to_string(),
            confidence: 0.9,
            timestamp: "2026-03-01T00:00:00Z".to_string(),
            valid_from: "2026-03-01T00:00:00Z".to_string(),
            valid_to: None,
            deleted: false,
        }
    }

    fn graph_of(entities: Vec<Entity>, relations: Vec<Relation>) -> KnowledgeGraph {
        KnowledgeGraph {
            entities: entities.into_iter().map(|e| (e.id.clone(), e)).collect(),
            relations,
        }
    }

    #[test]
    fn alias_table_is_case_insensitive() {
        let aliases: BTreeMap<String, String> =
            [("bob".to_string(), "Robert".to_string())].into_iter().collect();
        assert_eq!(normalize_name("BOB", &aliases), "Robert");
        assert_eq!(normalize_name("alice", &aliases), "alice");
    }

    #[test]
    fn type_override_falls_back_to_existing() {
        let overrides: BTreeMap<String, String> =
            [("paris".to_string(), "city".to_string())].into_iter().collect();
        assert_eq!(refine_type("Paris", "place", &overrides), "city");
        assert_eq!(refine_type("Marie", "person", &overrides), "person");
    }

    #[test]
    fn relation_synonyms_rewrite_labels() {
        let synonyms: BTreeMap<String, String> =
            [("lives in".to_string(), "habite_à".to_string())].into_iter().collect();
        assert_eq!(rewrite_relation("Lives In", &synonyms), "habite_à");
        assert_eq!(rewrite_relation("works at", &synonyms), "works at");
    }

    #[test]
    fn near_duplicates_merge_above_threshold() {
        // 1 edit over 18 chars: ratio ~0.944, above the 0.92 threshold.
        let mut first = entity("jean_pierre_dupont", "Jean-Pierre Dupont", "2026-03-01T00:00:00Z");
        first.attributes.insert("city".into(), "Lyon".into());
        let mut second = entity("jean_pierre_dupond", "Jean-Pierre Dupond", "2026-03-01T00:00:01Z");
        second.attributes.insert("age".into(), "30".into());

        let graph = graph_of(
            vec![first, second],
            vec![relation("jean_pierre_dupond", "connait", "jean_pierre_dupont")],
        );
        let result = postprocess_graph(&graph, &GraphConfig::default());

        assert_eq!(result.entities.len(), 1);
        let kept = result.entities.get("jean_pierre_dupont").unwrap();
        assert_eq!(kept.attributes.get("city").unwrap(), "Lyon");
        assert_eq!(kept.attributes.get("age").unwrap(), "30");
        // Relation endpoints were remapped onto the kept id.
        assert_eq!(result.relations[0].source, "jean_pierre_dupont");
    }

    #[test]
    fn distinct_names_below_threshold_stay_separate() {
        let graph = graph_of(
            vec![
                entity("marie", "Marie", "2026-03-01T00:00:00Z"),
                entity("marc", "Marc", "2026-03-01T00:00:01Z"),
            ],
            vec![],
        );
        let result = postprocess_graph(&graph, &GraphConfig::default());
        assert_eq!(result.entities.len(), 2);
    }

    #[test]
    fn first_seen_canonical_form_wins() {
        let graph = graph_of(
            vec![
                entity("marguerite_durand", "Marguerite Durand", "2026-03-01T00:00:00Z"),
                entity("marguerite_durant", "Marguerite Durant", "2026-03-01T00:00:05Z"),
            ],
            vec![],
        );
        let result = postprocess_graph(&graph, &GraphConfig::default());
        assert_eq!(result.entities.len(), 1);
        assert_eq!(
            result.entities.get("marguerite_durand").unwrap().name,
            "Marguerite Durand"
        );
    }

    #[test]
    fn duplicate_triples_are_dropped() {
        let graph = graph_of(
            vec![
                entity("marie", "Marie", "2026-03-01T00:00:00Z"),
                entity("paris", "Paris", "2026-03-01T00:00:01Z"),
            ],
            vec![
                relation("marie", "habite_à", "paris"),
                relation("marie", "habite_à", "paris"),
                relation("marie", "visite", "paris"),
            ],
        );
        let result = postprocess_graph(&graph, &GraphConfig::default());
        assert_eq!(result.relations.len(), 2);
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        let mut rel = relation("marie", "habite_à", "paris");
        rel.confidence = 0.8765;
        let graph = graph_of(
            vec![
                entity("marie", "Marie", "2026-03-01T00:00:00Z"),
                entity("paris", "Paris", "2026-03-01T00:00:01Z"),
            ],
            vec![rel],
        );
        let result = postprocess_graph(&graph, &GraphConfig::default());
        assert!((result.relations[0].confidence - 0.88).abs() < 1e-9);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let mut config = GraphConfig::default();
        config
            .aliases
            .insert("bob".to_string(), "Robert".to_string());
        config
            .relation_synonyms
            .insert("lives in".to_string(), "habite_à".to_string());

        let graph = graph_of(
            vec![
                entity("bob", "bob", "2026-03-01T00:00:00Z"),
                entity("paris", "Paris", "2026-03-01T00:00:01Z"),
            ],
            vec![relation("bob", "lives in", "paris")],
        );

        let once = postprocess_graph(&graph, &config);
        let twice = postprocess_graph(&once, &config);

        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&twice).unwrap()
        );
        assert_eq!(once.entities.get("bob").unwrap().name, "Robert");
        assert_eq!(once.relations[0].relation, "habite_à");
    }
}
