// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The context router.
//!
//! One turn, one prompt, exactly one generation call. Memory commands
//! short-circuit to the synthetic-memory provider and never reach the
//! generation service. Every enrichment source sits behind its own failure
//! boundary: a failing source contributes nothing and never blocks the
//! response.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnemos_config::model::{GenerationConfig, RouterConfig};
use mnemos_core::traits::{GenerationService, SemanticSearch, SyntheticMemory};
use mnemos_core::types::{ChatMode, GenerationTier, OutputChannel, TurnRequest, TurnResponse};
use mnemos_graph::GraphStore;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::ContextCache;
use crate::classifier::{RequestClassifier, RequestSignals};

/// Fixed instruction preamble for every generated reply.
const PREAMBLE: &str = "You are a helpful personal assistant with access to remembered facts about the user.";

/// Chat-mode instruction suffix.
const CHAT_SUFFIX: &str = "Answer conversationally, using the known context when it is relevant. If the context does not contain the answer, say you do not know instead of inventing one.";

/// Voice-mode instruction suffix.
const VOICE_SUFFIX: &str = "Answer in one or two short sentences suitable for being read aloud. If the context does not contain the answer, say you do not know instead of inventing one.";

/// Canned acknowledgement for explicit memory commands.
const MEMORY_ACK: &str = "Noted, I'll remember that.";

/// Non-blocking extension point fired after each routed turn.
///
/// Hooks run on their own task; the reply never waits on them.
#[async_trait]
pub trait RouteHook: Send + Sync {
    async fn after_route(&self, response: &TurnResponse);
}

/// Routes one conversation turn through classification, selective
/// enrichment, and a single generation call.
pub struct ContextRouter {
    store: Arc<GraphStore>,
    memory: Arc<dyn SyntheticMemory>,
    search: Arc<dyn SemanticSearch>,
    generation: Arc<dyn GenerationService>,
    classifier: RequestClassifier,
    cache: Mutex<ContextCache>,
    config: RouterConfig,
    generation_config: GenerationConfig,
    hooks: Vec<Arc<dyn RouteHook>>,
}

impl ContextRouter {
    pub fn new(
        store: Arc<GraphStore>,
        memory: Arc<dyn SyntheticMemory>,
        search: Arc<dyn SemanticSearch>,
        generation: Arc<dyn GenerationService>,
        config: RouterConfig,
        generation_config: GenerationConfig,
    ) -> Self {
        let classifier = RequestClassifier::new(&config);
        let cache = Mutex::new(ContextCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        ));
        Self {
            store,
            memory,
            search,
            generation,
            classifier,
            cache,
            config,
            generation_config,
            hooks: Vec::new(),
        }
    }

    /// Registers a post-route hook. Hooks fire after every turn, in
    /// registration order, without blocking the reply.
    pub fn with_hook(mut self, hook: Arc<dyn RouteHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Routes one request and returns the reply with its metadata.
    pub async fn route(
        &self,
        request: &TurnRequest,
        output: Option<&OutputChannel>,
    ) -> TurnResponse {
        let signals = self.classifier.classify(&request.text);

        // Explicit memory command: store the payload verbatim, acknowledge,
        // and skip enrichment and generation entirely.
        if let Some(payload) = &signals.memory_payload {
            match self.memory.remember_explicit(payload, &request.user_id).await {
                Ok(id) => debug!(id = id.as_str(), "explicit memory stored"),
                Err(e) => warn!(error = %e, "explicit memory store failed"),
            }
            return self.finish(request, MEMORY_ACK.to_string());
        }

        let key = ContextCache::normalize_key(&request.text);
        let cached = self.cache.lock().await.get(&key);
        let context = match cached {
            Some(context) => {
                metrics::counter!("mnemos_router_cache_hits").increment(1);
                debug!("context cache hit");
                context
            }
            None => {
                metrics::counter!("mnemos_router_cache_misses").increment(1);
                let context = self.build_context(request, &signals).await;
                self.cache.lock().await.insert(key, context.clone());
                context
            }
        };

        let prompt = assemble_prompt(&request.text, &context, request.mode);
        let tier = if request.mode == ChatMode::Voice || signals.is_short {
            GenerationTier::Low
        } else {
            GenerationTier::Medium
        };
        debug!(
            tier = %tier,
            question = signals.is_question,
            short = signals.is_short,
            context_len = context.len(),
            "routing request to generation"
        );

        let response = self.generate_with_retry(&prompt, tier, output).await;
        self.finish(request, response)
    }

    /// Builds the enrichment context for one request, pulling only the
    /// sources the classifier enabled. Each source failure is logged and
    /// contributes nothing.
    async fn build_context(&self, request: &TurnRequest, signals: &RequestSignals) -> String {
        let mut parts: Vec<String> = Vec::new();

        if signals.is_question {
            let symbolic = self
                .store
                .get_context_for_query(&request.text, self.config.max_symbolic_results)
                .await;
            if !symbolic.is_empty() {
                parts.push(symbolic);
            }
        }

        if !signals.is_short {
            match self
                .memory
                .relevant(&request.text, None, self.config.max_summaries)
                .await
            {
                Ok(fragments) if !fragments.is_empty() => {
                    let block: Vec<String> =
                        fragments.iter().map(|f| format!("- {}", f.content)).collect();
                    parts.push(format!("Remembered notes:\n{}", block.join("\n")));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "synthetic-memory lookup failed, skipping"),
            }
        }

        if signals.is_question && self.classifier.has_preference_keyword(&request.text) {
            match self
                .search
                .search(
                    &request.text,
                    self.config.max_search_results,
                    self.config.min_search_score,
                )
                .await
            {
                Ok(hits) if !hits.is_empty() => {
                    let block: Vec<String> =
                        hits.iter().map(|h| format!("- {}", h.content)).collect();
                    parts.push(format!("Related memories:\n{}", block.join("\n")));
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "semantic search failed, skipping"),
            }
        }

        parts.join("\n\n")
    }

    /// The single generation call for a turn, retried a fixed number of
    /// times with a short delay. Exhausting retries degrades to the
    /// configured apology string; this path never returns an error.
    async fn generate_with_retry(
        &self,
        prompt: &str,
        tier: GenerationTier,
        output: Option<&OutputChannel>,
    ) -> String {
        let attempts = self.generation_config.max_retries + 1;
        for attempt in 0..attempts {
            if attempt > 0 {
                warn!(attempt, "retrying generation after failure");
                tokio::time::sleep(Duration::from_millis(
                    self.generation_config.retry_delay_ms,
                ))
                .await;
            }
            match self.generation.generate(prompt, tier, output).await {
                Ok(text) => return text,
                Err(e) => warn!(error = %e, attempt, "generation call failed"),
            }
        }

        warn!("generation retries exhausted, returning fallback reply");
        metrics::counter!("mnemos_router_generation_fallbacks").increment(1);
        self.generation_config.apology.clone()
    }

    /// Stamps the response and fires post-route hooks without waiting.
    fn finish(&self, request: &TurnRequest, response: String) -> TurnResponse {
        let turn = TurnResponse {
            response,
            conversation_id: request.conversation_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mode: request.mode,
            error: None,
        };
        for hook in &self.hooks {
            let hook = hook.clone();
            let snapshot = turn.clone();
            tokio::spawn(async move {
                hook.after_route(&snapshot).await;
            });
        }
        turn
    }
}

/// Assembles the final prompt: preamble, request, context block (when
/// non-empty), and the mode-specific instruction suffix.
fn assemble_prompt(text: &str, context: &str, mode: ChatMode) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\nUser request:\n");
    prompt.push_str(text);
    if !context.is_empty() {
        prompt.push_str("\n\nKnown context:\n");
        prompt.push_str(context);
    }
    prompt.push_str("\n\n");
    prompt.push_str(match mode {
        ChatMode::Voice => VOICE_SUFFIX,
        ChatMode::Chat => CHAT_SUFFIX,
    });
    prompt
}
