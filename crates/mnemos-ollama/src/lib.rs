// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama generation-service adapter.
//!
//! Implements [`GenerationService`] against a local Ollama-style HTTP
//! endpoint (`POST /api/generate`). Tier selection maps to configured model
//! names. Retry is deliberately absent here: the context router owns the
//! retry-and-apologize policy.

use async_trait::async_trait;
use mnemos_config::model::GenerationConfig;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::GenerationService;
use mnemos_core::types::{GenerationTier, OutputChannel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request body for `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body of a non-streaming generate call.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for an Ollama-style generation endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    low_model: String,
    medium_model: String,
    high_model: String,
}

impl OllamaClient {
    /// Creates a client from generation configuration.
    pub fn new(config: &GenerationConfig) -> Result<Self, MnemosError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| MnemosError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            low_model: config.low_model.clone(),
            medium_model: config.medium_model.clone(),
            high_model: config.high_model.clone(),
        })
    }

    /// Model name for a complexity tier.
    fn model_for(&self, tier: GenerationTier) -> &str {
        match tier {
            GenerationTier::Low => &self.low_model,
            GenerationTier::Medium => &self.medium_model,
            GenerationTier::High => &self.high_model,
        }
    }
}

#[async_trait]
impl GenerationService for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        tier: GenerationTier,
        output: Option<&OutputChannel>,
    ) -> Result<String, MnemosError> {
        let model = self.model_for(tier);
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MnemosError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model, tier = %tier, "generation response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MnemosError::Provider {
                message: format!("generation endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| MnemosError::Provider {
                message: format!("failed to parse generation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if let Some(channel) = output {
            // Best effort: a closed channel must not fail the turn.
            let _ = channel.send(parsed.response.clone());
        }

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaClient {
        let mut config = GenerationConfig::default();
        config.base_url = server.uri();
        OllamaClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn generate_returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "bonjour"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let text = client
            .generate("salut", GenerationTier::Low, None)
            .await
            .unwrap();
        assert_eq!(text, "bonjour");
    }

    #[tokio::test]
    async fn tier_selects_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(
                serde_json::json!({"model": GenerationConfig::default().medium_model}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .generate("question", GenerationTier::Medium, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_error_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.generate("salut", GenerationTier::Low, None).await;
        assert!(matches!(result, Err(MnemosError::Provider { .. })));
    }

    #[tokio::test]
    async fn malformed_body_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.generate("salut", GenerationTier::Low, None).await;
        assert!(matches!(result, Err(MnemosError::Provider { .. })));
    }

    #[tokio::test]
    async fn forwards_final_text_to_output_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "streamed"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        client
            .generate("salut", GenerationTier::Low, Some(&tx))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), "streamed");
    }
}
