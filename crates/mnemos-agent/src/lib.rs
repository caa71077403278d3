// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation layer for the mnemos memory core.
//!
//! Wires the guarded extraction path, conversation history with rotation,
//! and the context router behind a single `route` entry point. Background
//! work (graph extraction, history condensation) runs on tracked tasks
//! that never delay a turn's reply and are cancelled on shutdown.

pub mod agent;
pub mod guard;
pub mod history;
pub mod tasks;

pub use agent::Agent;
pub use guard::{ExtractionGuard, ExtractionPermit};
pub use history::ConversationHistories;
pub use tasks::BackgroundTasks;
