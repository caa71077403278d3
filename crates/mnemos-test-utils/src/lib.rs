// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock collaborators for mnemos tests.
//!
//! Every external seam of the core has a scripted stand-in here so tests
//! run fast, offline, and repeatably: a FIFO generation mock with failure
//! injection, a recording synthetic-memory provider, a canned semantic
//! search, and an in-memory snapshot store.

pub mod memory_storage;
pub mod mock_generation;
pub mod mock_memory;
pub mod mock_search;

pub use memory_storage::MemoryStorage;
pub use mock_generation::MockGeneration;
pub use mock_memory::RecordingMemory;
pub use mock_search::CannedSearch;
