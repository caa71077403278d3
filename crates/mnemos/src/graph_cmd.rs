// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-graph inspection subcommands.

use std::sync::Arc;

use clap::Subcommand;
use colored::Colorize;
use mnemos_config::MnemosConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SnapshotStorage;
use mnemos_graph::GraphStore;
use mnemos_storage::JsonFileStorage;

/// What to inspect.
#[derive(Subcommand, Debug)]
pub enum GraphAction {
    /// List all live entities.
    Entities {
        /// Include expired and soft-deleted entities.
        #[arg(long)]
        all: bool,
    },
    /// List all live relations.
    Relations {
        /// Include expired and soft-deleted relations.
        #[arg(long)]
        all: bool,
    },
    /// Show an entity's current state and archived history.
    History { entity_id: String },
    /// List relations touching an entity.
    Query {
        entity_id: String,
        /// Restrict to one relation label.
        #[arg(long)]
        relation: Option<String>,
    },
    /// Show the symbolic context block a query would receive.
    Context { text: String },
}

pub async fn run(config: &MnemosConfig, action: GraphAction) -> Result<(), MnemosError> {
    let storage: Arc<dyn SnapshotStorage> =
        Arc::new(JsonFileStorage::new(config.storage.data_dir.clone()));
    let store = GraphStore::load(
        storage,
        config.storage.graph_file.clone(),
        config.graph.clone(),
    )
    .await;

    match action {
        GraphAction::Entities { all } => {
            for entity in store.get_all_entities(all).await {
                let mut line = format!(
                    "{}  {} ({})  confidence={:.2}",
                    entity.id.bold(),
                    entity.name,
                    entity.entity_type,
                    entity.confidence
                );
                if entity.deleted {
                    line.push_str(&format!("  {}", "[deleted]".red()));
                }
                println!("{line}");
                for (key, value) in &entity.attributes {
                    println!("    {key} = {value}");
                }
            }
        }
        GraphAction::Relations { all } => {
            for relation in store.get_all_relations(all).await {
                println!(
                    "{} {} {}  confidence={:.2}",
                    relation.source.bold(),
                    relation.relation.cyan(),
                    relation.target.bold(),
                    relation.confidence
                );
            }
        }
        GraphAction::History { entity_id } => {
            match store.get_entity_history(&entity_id).await {
                Some(entries) => {
                    for (index, entry) in entries.iter().enumerate() {
                        let marker = if index == 0 { "current" } else { "archived" };
                        println!(
                            "{} [{}] type={} confidence={:.2} attributes={}",
                            entry.timestamp,
                            marker.yellow(),
                            entry.old_value.entity_type,
                            entry.old_value.confidence,
                            serde_json::to_string(&entry.old_value.attributes)
                                .unwrap_or_default()
                        );
                    }
                }
                None => println!("no entity with id {entity_id}"),
            }
        }
        GraphAction::Query { entity_id, relation } => {
            let views = store
                .query_relations(&entity_id, relation.as_deref(), false)
                .await;
            if views.is_empty() {
                println!("no relations for {entity_id}");
            }
            for view in views {
                println!(
                    "{:?} {} {}  confidence={:.2}",
                    view.direction,
                    view.relation.cyan(),
                    view.other.bold(),
                    view.confidence
                );
            }
        }
        GraphAction::Context { text } => {
            let context = store.get_context_for_query(&text, 3).await;
            if context.is_empty() {
                println!("(no matching entities)");
            } else {
                println!("{context}");
            }
        }
    }

    Ok(())
}
