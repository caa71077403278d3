// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic-memory provider seam.

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::types::{ChatMessage, MemoryFragment};

/// An external provider of condensed conversational memory.
///
/// Three operations back the core: condensing rotated-out history into a
/// durable summary, recalling fragments relevant to a query, and storing a
/// verbatim note the user explicitly asked to remember.
#[async_trait]
pub trait SyntheticMemory: Send + Sync {
    /// Condenses `turns` into a durable summary filed under `topic`.
    /// Returns the summary text.
    async fn summarize(
        &self,
        turns: &[ChatMessage],
        topic: &str,
    ) -> Result<String, MnemosError>;

    /// Returns up to `max` fragments relevant to `query`, optionally
    /// restricted to one topic.
    async fn relevant(
        &self,
        query: &str,
        topic: Option<&str>,
        max: usize,
    ) -> Result<Vec<MemoryFragment>, MnemosError>;

    /// Stores `text` verbatim under `topic`. Returns the note id.
    async fn remember_explicit(
        &self,
        text: &str,
        topic: &str,
    ) -> Result<String, MnemosError>;
}
