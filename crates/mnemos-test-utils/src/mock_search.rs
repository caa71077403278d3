// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned semantic-search provider for tests.

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SemanticSearch;
use mnemos_core::types::SearchHit;

/// A semantic-search stand-in answering from a fixed hit list.
pub struct CannedSearch {
    hits: Vec<SearchHit>,
    failing: bool,
}

impl CannedSearch {
    /// A search with no results.
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            failing: false,
        }
    }

    /// Pre-loads `(content, score)` hits.
    pub fn with_hits(hits: Vec<(&str, f32)>) -> Self {
        Self {
            hits: hits
                .into_iter()
                .map(|(content, score)| SearchHit {
                    content: content.to_string(),
                    score,
                    metadata: None,
                })
                .collect(),
            failing: false,
        }
    }

    /// Makes every search fail, for failure-boundary tests.
    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl SemanticSearch for CannedSearch {
    async fn search(
        &self,
        _query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>, MnemosError> {
        if self.failing {
            return Err(MnemosError::Provider {
                message: "injected search failure".to_string(),
                source: None,
            });
        }
        Ok(self
            .hits
            .iter()
            .filter(|h| h.score >= min_score)
            .take(k)
            .cloned()
            .collect())
    }
}
