// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable snapshot storage seam.

use async_trait::async_trait;

use crate::error::MnemosError;

/// Durable key-addressed document persistence for graph and memory
/// snapshots.
///
/// Keys are opaque relative names ("graph.json"). No transactions; the
/// store guarantees only simple read/write/exists semantics plus a
/// timestamped backup copy.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Reads the document under `key`, or `None` when absent.
    async fn read(&self, key: &str) -> Result<Option<String>, MnemosError>;

    /// Writes `contents` under `key`, replacing any previous document.
    async fn write(&self, key: &str, contents: &str) -> Result<(), MnemosError>;

    /// Returns whether a document exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, MnemosError>;

    /// Copies the current document under `key` to a timestamped backup.
    /// Returns the backup key, or `None` when there was nothing to back up.
    async fn backup(&self, key: &str) -> Result<Option<String>, MnemosError>;
}
