// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory snapshot storage for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SnapshotStorage;
use tokio::sync::Mutex;

/// Map-backed [`SnapshotStorage`] with numbered backup keys.
pub struct MemoryStorage {
    documents: Arc<Mutex<BTreeMap<String, String>>>,
    backup_seq: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(BTreeMap::new())),
            backup_seq: AtomicU64::new(0),
        }
    }

    /// All stored keys, for assertions.
    pub async fn keys(&self) -> Vec<String> {
        self.documents.lock().await.keys().cloned().collect()
    }

    /// Whether a key is present, for assertions.
    pub async fn contains(&self, key: &str) -> bool {
        self.documents.lock().await.contains_key(key)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, MnemosError> {
        Ok(self.documents.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), MnemosError> {
        self.documents
            .lock()
            .await
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, MnemosError> {
        Ok(self.documents.lock().await.contains_key(key))
    }

    async fn backup(&self, key: &str) -> Result<Option<String>, MnemosError> {
        let mut documents = self.documents.lock().await;
        let Some(contents) = documents.get(key).cloned() else {
            return Ok(None);
        };
        let seq = self.backup_seq.fetch_add(1, Ordering::SeqCst);
        let backup_key = format!("{key}.backup.{seq}");
        documents.insert(backup_key.clone(), contents);
        Ok(Some(backup_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_round_trip() {
        let storage = MemoryStorage::new();
        storage.write("graph.json", "{}").await.unwrap();
        assert_eq!(storage.read("graph.json").await.unwrap().unwrap(), "{}");
        assert!(storage.exists("graph.json").await.unwrap());
    }

    #[tokio::test]
    async fn backup_creates_numbered_copies() {
        let storage = MemoryStorage::new();
        storage.write("graph.json", "v1").await.unwrap();

        let first = storage.backup("graph.json").await.unwrap().unwrap();
        storage.write("graph.json", "v2").await.unwrap();
        let second = storage.backup("graph.json").await.unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(storage.read(&first).await.unwrap().unwrap(), "v1");
        assert_eq!(storage.read(&second).await.unwrap().unwrap(), "v2");
    }

    #[tokio::test]
    async fn backup_of_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.backup("missing").await.unwrap().is_none());
    }
}
