// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The top-level conversation-turn entry point.
//!
//! Each inbound turn fires a guarded, asynchronous graph-extraction task
//! and a synchronous router invocation. The extraction task never blocks
//! the reply; its result lands in the graph one turn later at the latest.

use std::sync::Arc;
use std::time::Duration;

use mnemos_config::model::ConversationConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SyntheticMemory;
use mnemos_core::types::{ChatMessage, OutputChannel, TurnRequest, TurnResponse};
use mnemos_graph::{GraphExtractor, GraphStore};
use mnemos_router::ContextRouter;
use tracing::{debug, error, warn};

use crate::guard::ExtractionGuard;
use crate::history::ConversationHistories;
use crate::tasks::BackgroundTasks;

/// Conversation layer wiring the guard, the histories, and the router.
///
/// Constructed once at process start with every dependency passed in
/// explicitly; nothing here is a process-wide singleton.
pub struct Agent {
    router: Arc<ContextRouter>,
    store: Arc<GraphStore>,
    extractor: Arc<GraphExtractor>,
    memory: Arc<dyn SyntheticMemory>,
    guard: ExtractionGuard,
    histories: ConversationHistories,
    tasks: BackgroundTasks,
    fallback_reply: String,
}

impl Agent {
    pub fn new(
        router: Arc<ContextRouter>,
        store: Arc<GraphStore>,
        extractor: Arc<GraphExtractor>,
        memory: Arc<dyn SyntheticMemory>,
        conversation: ConversationConfig,
        fallback_reply: String,
    ) -> Self {
        Self {
            router,
            store,
            extractor,
            memory,
            guard: ExtractionGuard::new(),
            histories: ConversationHistories::new(conversation.max_history),
            tasks: BackgroundTasks::new(),
            fallback_reply,
        }
    }

    /// Routes one conversation turn.
    ///
    /// Never returns an error: unexpected conditions degrade to the
    /// fallback reply with the `error` field set.
    pub async fn route(
        &self,
        request: TurnRequest,
        output: Option<&OutputChannel>,
    ) -> TurnResponse {
        match self.try_route(&request, output).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "unexpected failure while routing turn");
                TurnResponse {
                    response: self.fallback_reply.clone(),
                    conversation_id: request.conversation_id.clone(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    mode: request.mode,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_route(
        &self,
        request: &TurnRequest,
        output: Option<&OutputChannel>,
    ) -> Result<TurnResponse, MnemosError> {
        self.spawn_guarded_extraction(request);

        self.record_message(
            &request.conversation_id,
            ChatMessage::new("user", &request.text),
        )?;

        let response = self.router.route(request, output).await;

        self.record_message(
            &request.conversation_id,
            ChatMessage::new("assistant", &response.response),
        )?;

        Ok(response)
    }

    /// Fires the asynchronous, locked graph-update task for a message.
    /// A message already in flight is skipped entirely.
    fn spawn_guarded_extraction(&self, request: &TurnRequest) {
        let token = ExtractionGuard::token_for(request.message_id.as_deref(), &request.text);
        let Some(permit) = self.guard.acquire(&token) else {
            debug!(token = token.as_str(), "extraction already in flight, skipping");
            metrics::counter!("mnemos_agent_extractions_skipped").increment(1);
            return;
        };

        let extractor = self.extractor.clone();
        let store = self.store.clone();
        let text = request.text.clone();
        self.tasks.spawn(async move {
            // Held until the task ends; dropped even when extraction fails.
            let _permit = permit;
            match extractor.extract_and_store(&store, &text).await {
                Ok(count) => debug!(count, "graph extraction finished"),
                Err(e) => warn!(error = %e, "graph extraction failed (non-fatal)"),
            }
        });
    }

    /// Appends a message to the conversation history, handing any rotated
    /// excess to the synthetic-memory provider without blocking.
    fn record_message(
        &self,
        conversation_id: &str,
        message: ChatMessage,
    ) -> Result<(), MnemosError> {
        let Some(excess) = self.histories.append(conversation_id, message)? else {
            return Ok(());
        };

        debug!(
            conversation_id,
            dropped = excess.len(),
            "history rotated, condensing oldest messages"
        );
        let memory = self.memory.clone();
        let topic = conversation_id.to_string();
        self.tasks.spawn(async move {
            match memory.summarize(&excess, &topic).await {
                Ok(_) => debug!(topic = topic.as_str(), "rotated history condensed"),
                Err(e) => warn!(error = %e, "history condensation failed (non-fatal)"),
            }
        });
        Ok(())
    }

    /// The most recent messages of a conversation, for inspection.
    pub fn recent_history(
        &self,
        conversation_id: &str,
        n: usize,
    ) -> Result<Vec<ChatMessage>, MnemosError> {
        self.histories.recent(conversation_id, n)
    }

    /// Drains background work and persists the graph.
    pub async fn shutdown(&self, grace: Duration) {
        self.tasks.shutdown(grace).await;
        if let Err(e) = self.store.persist().await {
            warn!(error = %e, "final graph persist failed during shutdown");
        }
    }
}
