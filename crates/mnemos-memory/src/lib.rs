// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic-memory provider for the mnemos memory core.
//!
//! Implements [`SyntheticMemory`] with two note kinds: condensed summaries
//! produced by a generation call over rotated-out conversation history, and
//! explicit notes the user asked to remember verbatim. Notes persist as a
//! JSON document through [`SnapshotStorage`]; recall ranks notes by keyword
//! overlap with the query.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::{GenerationService, SnapshotStorage, SyntheticMemory};
use mnemos_core::types::{ChatMessage, GenerationTier, MemoryFragment};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Prompt for the history-condensation generation call.
const SUMMARY_PROMPT: &str = r#"You are a conversation summarizer. Condense the conversation below into a short factual summary.

PRESERVE:
- Facts the user shared about themselves
- Preferences, names, and identifiers
- Decisions and commitments

OMIT:
- Greetings and small talk
- Redundant back-and-forth

Write 1-3 sentences of plain prose.

Conversation:
{conversation}

Summary:"#;

/// How a note entered the memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Condensed from rotated-out conversation history.
    Summary,
    /// Stored verbatim on an explicit user command.
    Explicit,
}

/// One durable memory note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub id: String,
    pub content: String,
    /// Grouping key: conversation id for summaries, user id for explicit notes.
    pub topic: String,
    pub kind: NoteKind,
    pub created_at: String,
}

/// File-backed synthetic-memory provider.
pub struct SyntheticMemoryStore {
    generation: Arc<dyn GenerationService>,
    storage: Arc<dyn SnapshotStorage>,
    key: String,
    notes: RwLock<Vec<MemoryNote>>,
}

impl SyntheticMemoryStore {
    /// Opens the note file under `key`, starting empty when it is absent
    /// or malformed.
    pub async fn open(
        generation: Arc<dyn GenerationService>,
        storage: Arc<dyn SnapshotStorage>,
        key: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let notes = match storage.read(&key).await {
            Ok(Some(contents)) => match serde_json::from_str::<Vec<MemoryNote>>(&contents) {
                Ok(notes) => notes,
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "malformed note file, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "failed to read note file, starting empty");
                Vec::new()
            }
        };
        debug!(count = notes.len(), "synthetic memory opened");

        Self {
            generation,
            storage,
            key,
            notes: RwLock::new(notes),
        }
    }

    /// Number of stored notes.
    pub async fn note_count(&self) -> usize {
        self.notes.read().await.len()
    }

    async fn append_note(&self, note: MemoryNote) -> Result<(), MnemosError> {
        let serialized = {
            let mut notes = self.notes.write().await;
            notes.push(note);
            serde_json::to_string_pretty(&*notes).map_err(|e| MnemosError::Storage {
                source: Box::new(e),
            })?
        };
        self.storage.write(&self.key, &serialized).await
    }
}

#[async_trait]
impl SyntheticMemory for SyntheticMemoryStore {
    /// Condenses `turns` via the generation service and stores the result
    /// as a summary note under `topic`.
    async fn summarize(
        &self,
        turns: &[ChatMessage],
        topic: &str,
    ) -> Result<String, MnemosError> {
        let conversation: Vec<String> = turns
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect();
        let prompt = SUMMARY_PROMPT.replace("{conversation}", &conversation.join("\n"));

        let summary = self
            .generation
            .generate(&prompt, GenerationTier::Low, None)
            .await?;

        self.append_note(MemoryNote {
            id: uuid::Uuid::new_v4().to_string(),
            content: summary.clone(),
            topic: topic.to_string(),
            kind: NoteKind::Summary,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
        .await?;

        debug!(topic, turns = turns.len(), "history condensed into summary note");
        Ok(summary)
    }

    /// Ranks notes by keyword overlap with `query`, newest first among
    /// ties, and returns up to `max` fragments.
    async fn relevant(
        &self,
        query: &str,
        topic: Option<&str>,
        max: usize,
    ) -> Result<Vec<MemoryFragment>, MnemosError> {
        let query_words = keywords(query);
        if query_words.is_empty() {
            return Ok(vec![]);
        }

        let notes = self.notes.read().await;
        let mut scored: Vec<(usize, &MemoryNote)> = notes
            .iter()
            .filter(|n| topic.is_none_or(|t| n.topic == t))
            .map(|n| (overlap(&query_words, &n.content), n))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });

        Ok(scored
            .into_iter()
            .take(max)
            .map(|(_, n)| MemoryFragment {
                content: n.content.clone(),
            })
            .collect())
    }

    /// Stores `text` verbatim as an explicit note under `topic`.
    async fn remember_explicit(&self, text: &str, topic: &str) -> Result<String, MnemosError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.append_note(MemoryNote {
            id: id.clone(),
            content: text.to_string(),
            topic: topic.to_string(),
            kind: NoteKind::Explicit,
            created_at: chrono::Utc::now().to_rfc3339(),
        })
        .await?;
        debug!(topic, "explicit note stored");
        Ok(id)
    }
}

/// Lowercased keywords of a text, dropping words of one or two characters.
fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_string())
        .collect()
}

/// Number of query keywords occurring in a note.
fn overlap(query_words: &[String], content: &str) -> usize {
    let content_words = keywords(content);
    query_words
        .iter()
        .filter(|w| content_words.iter().any(|c| c == *w))
        .count()
}
