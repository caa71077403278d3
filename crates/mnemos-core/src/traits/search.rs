// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic-search provider seam.

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::types::SearchHit;

/// An external vector-similarity search service.
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    /// Returns up to `k` hits for `query` scoring at least `min_score`.
    async fn search(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>, MnemosError>;
}
