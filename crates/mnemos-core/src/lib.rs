// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the mnemos memory-and-routing core.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the mnemos workspace. The knowledge-graph
//! store, context router, and conversation layer all consume their external
//! collaborators (generation, semantic search, synthetic memory, storage)
//! through the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemosError;
pub use types::{ChatMessage, ChatMode, GenerationTier, TurnRequest, TurnResponse};

// Re-export all collaborator traits at crate root.
pub use traits::{GenerationService, SemanticSearch, SnapshotStorage, SyntheticMemory};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemos_error_has_all_variants() {
        // Verify all 6 error variants exist and can be constructed.
        let _config = MnemosError::Config("test".into());
        let _storage = MnemosError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = MnemosError::Provider {
            message: "test".into(),
            source: None,
        };
        let _graph = MnemosError::Graph {
            message: "test".into(),
        };
        let _timeout = MnemosError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = MnemosError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // This test verifies that all collaborator traits compile and are
        // accessible through the public API. If any module is missing or
        // has a compile error, this test won't compile.
        fn _assert_generation<T: GenerationService>() {}
        fn _assert_search<T: SemanticSearch>() {}
        fn _assert_memory<T: SyntheticMemory>() {}
        fn _assert_storage<T: SnapshotStorage>() {}
    }
}
