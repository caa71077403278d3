// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The memory core never talks to the outside world directly; every
//! external system (generation, semantic search, synthetic memory, durable
//! storage) sits behind one of these narrow seams so it can be swapped or
//! mocked.

pub mod generation;
pub mod memory;
pub mod search;
pub mod storage;

pub use generation::GenerationService;
pub use memory::SyntheticMemory;
pub use search::SemanticSearch;
pub use storage::SnapshotStorage;
