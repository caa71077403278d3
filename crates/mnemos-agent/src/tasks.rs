// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task lifecycle.
//!
//! Fire-and-forget work (graph extraction, history condensation) is
//! spawned through a tracked set with an explicit lifecycle: tasks are
//! cancelled on shutdown after a grace period instead of being abandoned
//! on an anonymous executor.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

/// Tracked spawner for non-critical-path background work.
pub struct BackgroundTasks {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawns a tracked task that aborts when shutdown is requested.
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("background task cancelled by shutdown");
                }
                _ = fut => {}
            }
        });
    }

    /// Number of tasks still running.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Waits up to `grace` for in-flight tasks, then cancels stragglers.
    pub async fn shutdown(&self, grace: Duration) {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            warn!(
                remaining = self.tracker.len(),
                "grace period elapsed, cancelling background tasks"
            );
            self.cancel.cancel();
            self.tracker.wait().await;
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
