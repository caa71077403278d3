// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across collaborator traits and the mnemos core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Interaction mode for a conversation turn.
///
/// Voice mode constrains replies to one or two sentences and routes to the
/// low generation tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Chat,
    Voice,
}

/// Complexity tier requested from the generation service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenerationTier {
    Low,
    Medium,
    High,
}

/// Live sink for incremental generation output.
///
/// When a turn carries a channel, the generation service forwards text
/// chunks through it as they arrive; the final complete text is always
/// returned from `generate` regardless.
pub type OutputChannel = tokio::sync::mpsc::UnboundedSender<String>;

/// An inbound conversation turn from the caller.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Raw user utterance.
    pub text: String,
    /// Conversation this turn belongs to.
    pub conversation_id: String,
    /// Identity of the speaking user.
    pub user_id: String,
    /// Chat or voice interaction mode.
    pub mode: ChatMode,
    /// Caller-supplied message identifier, used for extraction locking.
    /// When absent, a hash of `text` is used instead.
    pub message_id: Option<String>,
}

/// The result of routing one conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    /// Generated (or canned) reply text.
    pub response: String,
    /// Conversation the turn belonged to.
    pub conversation_id: String,
    /// ISO 8601 completion timestamp.
    pub timestamp: String,
    /// Mode the turn was processed in.
    pub mode: ChatMode,
    /// Set only for truly unexpected conditions; `response` still carries
    /// a user-safe apology in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single retained conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
    /// ISO 8601 creation timestamp.
    pub timestamp: String,
}

impl ChatMessage {
    /// Convenience constructor stamping the current time.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A semantic-search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched content.
    pub content: String,
    /// Similarity score reported by the search provider.
    pub score: f32,
    /// Provider-specific metadata, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// A fragment of condensed memory returned by the synthetic-memory provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryFragment {
    /// The condensed or explicitly remembered content.
    pub content: String,
}
