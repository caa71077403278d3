// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-graph store for the mnemos memory core.
//!
//! Records entities and relations with confidence and temporal-validity
//! metadata, normalizes and deduplicates them on every save, and derives
//! new facts from conversation turns via the generation service.
//!
//! ## Architecture
//!
//! - **Types**: tagged `Entity`/`Relation` records and the serialized
//!   `KnowledgeGraph` document
//! - **Ident**: deterministic entity-id minting from normalized names
//! - **GraphStore**: the public store operations plus the
//!   backup-postprocess-persist save discipline
//! - **Postprocess**: pure whole-graph normalization, fuzzy merge, and
//!   relation dedup applied at save time
//! - **GraphExtractor**: LLM-based entity/relation extraction from free text

pub mod extractor;
pub mod ident;
pub mod postprocess;
pub mod store;
pub mod types;

pub use extractor::{ExtractedGraph, GraphExtractor};
pub use store::{GraphStore, NewEntity, RelationMeta};
pub use types::{Direction, Entity, KnowledgeGraph, Relation, RelationView};
