// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation service for deterministic testing.
//!
//! `MockGeneration` implements `GenerationService` with pre-configured
//! responses popped from a FIFO queue, optional failure injection, and a
//! record of every prompt it received.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::GenerationService;
use mnemos_core::types::{GenerationTier, OutputChannel};
use tokio::sync::Mutex;

/// A scripted generation service.
///
/// Responses are popped from a FIFO queue; an empty queue yields a default
/// "mock response" text. When failures are armed, the next N calls return
/// a provider error before any response is consumed.
pub struct MockGeneration {
    responses: Arc<Mutex<VecDeque<String>>>,
    failures_remaining: Arc<Mutex<u32>>,
    prompts: Arc<Mutex<Vec<(String, GenerationTier)>>>,
}

impl MockGeneration {
    /// Creates a mock with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            failures_remaining: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            failures_remaining: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Arms the mock to fail the next `count` calls.
    pub async fn fail_next(&self, count: u32) {
        *self.failures_remaining.lock().await = count;
    }

    /// Adds a response to the end of the queue.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// All prompts received so far, with their tiers.
    pub async fn prompts(&self) -> Vec<(String, GenerationTier)> {
        self.prompts.lock().await.clone()
    }

    /// Number of calls received so far (including failed ones).
    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGeneration {
    async fn generate(
        &self,
        prompt: &str,
        tier: GenerationTier,
        output: Option<&OutputChannel>,
    ) -> Result<String, MnemosError> {
        self.prompts
            .lock()
            .await
            .push((prompt.to_string(), tier));

        {
            let mut failures = self.failures_remaining.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(MnemosError::Provider {
                    message: "injected failure".to_string(),
                    source: None,
                });
            }
        }

        let text = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string());

        if let Some(channel) = output {
            let _ = channel.send(text.clone());
        }

        Ok(text)
    }
}
