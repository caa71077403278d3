// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file snapshot persistence for the mnemos memory core.
//!
//! Implements [`SnapshotStorage`] over a flat data directory: each key is a
//! file name, `backup` copies the current document to a UTC-timestamped
//! sibling before it is overwritten by the next save.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mnemos_core::error::MnemosError;
use mnemos_core::traits::SnapshotStorage;
use tracing::debug;

/// Helper to convert io errors into MnemosError::Storage.
fn storage_err(e: std::io::Error) -> MnemosError {
    MnemosError::Storage {
        source: Box::new(e),
    }
}

/// File-backed snapshot storage rooted at a data directory.
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    /// Creates storage rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path for a storage key.
    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Backup file name for `key`: `<stem>.backup.<timestamp>[.<ext>]`.
    fn backup_key(key: &str) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3f");
        let path = Path::new(key);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(key);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}.backup.{timestamp}.{ext}"),
            None => format!("{stem}.backup.{timestamp}"),
        }
    }
}

#[async_trait]
impl SnapshotStorage for JsonFileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, MnemosError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), MnemosError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }
        tokio::fs::write(&path, contents).await.map_err(storage_err)?;
        debug!(key, bytes = contents.len(), "snapshot written");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, MnemosError> {
        Ok(tokio::fs::try_exists(self.path_for(key))
            .await
            .map_err(storage_err)?)
    }

    async fn backup(&self, key: &str) -> Result<Option<String>, MnemosError> {
        let path = self.path_for(key);
        if !tokio::fs::try_exists(&path).await.map_err(storage_err)? {
            return Ok(None);
        }
        let backup_key = Self::backup_key(key);
        tokio::fs::copy(&path, self.path_for(&backup_key))
            .await
            .map_err(storage_err)?;
        debug!(key, backup = backup_key.as_str(), "snapshot backed up");
        Ok(Some(backup_key))
    }
}
