// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording synthetic-memory provider for tests.

use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SyntheticMemory;
use mnemos_core::types::{ChatMessage, MemoryFragment};
use tokio::sync::Mutex;

/// A synthetic-memory stand-in that records every call and answers
/// `relevant` from a canned fragment list.
pub struct RecordingMemory {
    fragments: Vec<MemoryFragment>,
    failing: bool,
    remembered: Arc<Mutex<Vec<(String, String)>>>,
    summarized: Arc<Mutex<Vec<(usize, String)>>>,
    relevant_calls: Arc<Mutex<usize>>,
}

impl RecordingMemory {
    pub fn new() -> Self {
        Self {
            fragments: Vec::new(),
            failing: false,
            remembered: Arc::new(Mutex::new(Vec::new())),
            summarized: Arc::new(Mutex::new(Vec::new())),
            relevant_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Pre-loads canned fragments returned by `relevant`.
    pub fn with_fragments(fragments: Vec<&str>) -> Self {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| MemoryFragment {
                    content: f.to_string(),
                })
                .collect(),
            ..Self::new()
        }
    }

    /// Makes every operation fail, for failure-boundary tests.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Texts passed to `remember_explicit`, with their topics.
    pub async fn remembered(&self) -> Vec<(String, String)> {
        self.remembered.lock().await.clone()
    }

    /// Summarize calls received: (turn count, topic).
    pub async fn summarized(&self) -> Vec<(usize, String)> {
        self.summarized.lock().await.clone()
    }

    /// Number of `relevant` lookups received.
    pub async fn relevant_call_count(&self) -> usize {
        *self.relevant_calls.lock().await
    }

    fn fail(&self) -> MnemosError {
        MnemosError::Provider {
            message: "injected memory failure".to_string(),
            source: None,
        }
    }
}

impl Default for RecordingMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyntheticMemory for RecordingMemory {
    async fn summarize(
        &self,
        turns: &[ChatMessage],
        topic: &str,
    ) -> Result<String, MnemosError> {
        if self.failing {
            return Err(self.fail());
        }
        self.summarized
            .lock()
            .await
            .push((turns.len(), topic.to_string()));
        Ok(format!("summary of {} messages", turns.len()))
    }

    async fn relevant(
        &self,
        _query: &str,
        _topic: Option<&str>,
        max: usize,
    ) -> Result<Vec<MemoryFragment>, MnemosError> {
        *self.relevant_calls.lock().await += 1;
        if self.failing {
            return Err(self.fail());
        }
        Ok(self.fragments.iter().take(max).cloned().collect())
    }

    async fn remember_explicit(
        &self,
        text: &str,
        topic: &str,
    ) -> Result<String, MnemosError> {
        if self.failing {
            return Err(self.fail());
        }
        self.remembered
            .lock()
            .await
            .push((text.to_string(), topic.to_string()));
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_explicit_memories() {
        let memory = RecordingMemory::new();
        memory.remember_explicit("que j'aime le café", "conv-1").await.unwrap();
        let remembered = memory.remembered().await;
        assert_eq!(remembered.len(), 1);
        assert_eq!(remembered[0].0, "que j'aime le café");
    }

    #[tokio::test]
    async fn relevant_respects_max() {
        let memory = RecordingMemory::with_fragments(vec!["a", "b", "c"]);
        let fragments = memory.relevant("anything", None, 2).await.unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[tokio::test]
    async fn failing_mock_errors_everywhere() {
        let memory = RecordingMemory::failing();
        assert!(memory.relevant("q", None, 2).await.is_err());
        assert!(memory.remember_explicit("x", "t").await.is_err());
        assert!(memory.summarize(&[], "t").await.is_err());
    }
}
