// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation retained message lists with rotation.
//!
//! When a conversation exceeds its maximum length, the oldest excess is
//! split off for the caller to summarize; truncation of the in-memory
//! list never waits on that summarization.

use std::collections::HashMap;
use std::sync::Mutex;

use mnemos_core::error::MnemosError;
use mnemos_core::types::ChatMessage;

/// In-memory message history per conversation.
pub struct ConversationHistories {
    max_history: usize,
    conversations: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl ConversationHistories {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            conversations: Mutex::new(HashMap::new()),
        }
    }

    /// Appends a message. When the list overflows, returns the oldest
    /// excess messages, already removed from the retained list.
    pub fn append(
        &self,
        conversation_id: &str,
        message: ChatMessage,
    ) -> Result<Option<Vec<ChatMessage>>, MnemosError> {
        let mut conversations = self.lock()?;
        let history = conversations
            .entry(conversation_id.to_string())
            .or_default();
        history.push(message);

        if history.len() > self.max_history {
            let excess: Vec<ChatMessage> =
                history.drain(..history.len() - self.max_history).collect();
            return Ok(Some(excess));
        }
        Ok(None)
    }

    /// The most recent `n` messages of a conversation, oldest first.
    pub fn recent(
        &self,
        conversation_id: &str,
        n: usize,
    ) -> Result<Vec<ChatMessage>, MnemosError> {
        let conversations = self.lock()?;
        Ok(conversations
            .get(conversation_id)
            .map(|history| {
                history[history.len().saturating_sub(n)..].to_vec()
            })
            .unwrap_or_default())
    }

    /// Retained message count for a conversation.
    pub fn len(&self, conversation_id: &str) -> Result<usize, MnemosError> {
        Ok(self
            .lock()?
            .get(conversation_id)
            .map(Vec::len)
            .unwrap_or(0))
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<ChatMessage>>>, MnemosError> {
        self.conversations
            .lock()
            .map_err(|_| MnemosError::Internal("conversation history lock poisoned".into()))
    }
}
