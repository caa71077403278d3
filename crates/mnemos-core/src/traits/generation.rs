// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation service seam.

use async_trait::async_trait;

use crate::error::MnemosError;
use crate::types::{GenerationTier, OutputChannel};

/// An external text-generation service.
///
/// Implementations perform one completion per call. Retry and fallback are
/// the caller's responsibility: the context router wraps `generate` in a
/// bounded retry loop and degrades to a user-safe apology on exhaustion.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generates a completion for `prompt` at the requested complexity tier.
    ///
    /// When `output` is attached, implementations may forward incremental
    /// text through it; the complete final text is always returned.
    async fn generate(
        &self,
        prompt: &str,
        tier: GenerationTier,
        output: Option<&OutputChannel>,
    ) -> Result<String, MnemosError>;
}
