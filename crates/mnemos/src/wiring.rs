// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency wiring.
//!
//! The store, providers, router, and agent are constructed exactly once at
//! process start and handed around by reference; no component reaches for
//! an ambient global.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_agent::Agent;
use mnemos_config::MnemosConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::{GenerationService, SemanticSearch, SnapshotStorage, SyntheticMemory};
use mnemos_core::types::SearchHit;
use mnemos_graph::{GraphExtractor, GraphStore};
use mnemos_memory::SyntheticMemoryStore;
use mnemos_ollama::OllamaClient;
use mnemos_router::ContextRouter;
use mnemos_storage::JsonFileStorage;

/// Semantic search stand-in wired when no vector service is configured.
struct NullSemanticSearch;

#[async_trait]
impl SemanticSearch for NullSemanticSearch {
    async fn search(
        &self,
        _query: &str,
        _k: usize,
        _min_score: f32,
    ) -> Result<Vec<SearchHit>, MnemosError> {
        Ok(vec![])
    }
}

/// The fully constructed application object graph.
pub struct App {
    pub agent: Agent,
    pub store: Arc<GraphStore>,
}

/// Builds the application from configuration.
pub async fn build(config: &MnemosConfig) -> Result<App, MnemosError> {
    let storage: Arc<dyn SnapshotStorage> =
        Arc::new(JsonFileStorage::new(config.storage.data_dir.clone()));

    let store = Arc::new(
        GraphStore::load(
            storage.clone(),
            config.storage.graph_file.clone(),
            config.graph.clone(),
        )
        .await,
    );

    let generation: Arc<dyn GenerationService> =
        Arc::new(OllamaClient::new(&config.generation)?);

    let memory: Arc<dyn SyntheticMemory> = Arc::new(
        SyntheticMemoryStore::open(
            generation.clone(),
            storage.clone(),
            config.storage.memory_file.clone(),
        )
        .await,
    );

    let search: Arc<dyn SemanticSearch> = Arc::new(NullSemanticSearch);

    let router = Arc::new(ContextRouter::new(
        store.clone(),
        memory.clone(),
        search,
        generation.clone(),
        config.router.clone(),
        config.generation.clone(),
    ));

    let extractor = Arc::new(GraphExtractor::new(generation));

    let agent = Agent::new(
        router,
        store.clone(),
        extractor,
        memory,
        config.conversation.clone(),
        config.generation.apology.clone(),
    );

    Ok(App { agent, store })
}
