// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message extraction locking.
//!
//! Prevents two concurrent extraction tasks from processing the same
//! inbound message. The lock token is the caller-supplied message id,
//! falling back to a hash of the message text. Tokens are released by the
//! permit's `Drop`, so a panicking or erroring extraction still unlocks.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::debug;

/// In-flight token set guarding extraction triggering.
///
/// This guard only serializes *extraction triggering* per message; it
/// gives the graph store no general mutual-exclusion contract.
#[derive(Clone, Default)]
pub struct ExtractionGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ExtractionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock token for a message: its id when supplied, otherwise a
    /// hash of its text.
    pub fn token_for(message_id: Option<&str>, text: &str) -> String {
        match message_id {
            Some(id) => id.to_string(),
            None => {
                let digest = Sha256::digest(text.as_bytes());
                format!("{digest:x}")[..16].to_string()
            }
        }
    }

    /// Attempts to acquire the token. `None` means an extraction for this
    /// message is already in flight and the caller must skip.
    pub fn acquire(&self, token: &str) -> Option<ExtractionPermit> {
        let mut in_flight = lock_set(&self.in_flight);
        if !in_flight.insert(token.to_string()) {
            debug!(token, "extraction token already held");
            return None;
        }
        Some(ExtractionPermit {
            token: token.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    /// Number of tokens currently held.
    pub fn in_flight_count(&self) -> usize {
        lock_set(&self.in_flight).len()
    }
}

/// RAII lock on one message token; releases on drop.
pub struct ExtractionPermit {
    token: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ExtractionPermit {
    fn drop(&mut self) {
        lock_set(&self.in_flight).remove(&self.token);
    }
}

/// Locks the set, recovering from poisoning: a panicked holder must not
/// leave tokens stuck forever.
fn lock_set(set: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_of_same_token_fails() {
        let guard = ExtractionGuard::new();
        let permit = guard.acquire("msg-1");
        assert!(permit.is_some());
        assert!(guard.acquire("msg-1").is_none());
        assert_eq!(guard.in_flight_count(), 1);
    }

    #[test]
    fn different_tokens_are_independent() {
        let guard = ExtractionGuard::new();
        let _a = guard.acquire("msg-1").unwrap();
        let _b = guard.acquire("msg-2").unwrap();
        assert_eq!(guard.in_flight_count(), 2);
    }

    #[test]
    fn drop_releases_the_token() {
        let guard = ExtractionGuard::new();
        {
            let _permit = guard.acquire("msg-1").unwrap();
            assert_eq!(guard.in_flight_count(), 1);
        }
        assert_eq!(guard.in_flight_count(), 0);
        assert!(guard.acquire("msg-1").is_some());
    }

    #[test]
    fn token_release_survives_a_panic() {
        let guard = ExtractionGuard::new();
        let inner = guard.clone();
        let result = std::panic::catch_unwind(move || {
            let _permit = inner.acquire("msg-1").unwrap();
            panic!("extraction blew up");
        });
        assert!(result.is_err());
        assert_eq!(guard.in_flight_count(), 0);
    }

    #[test]
    fn token_falls_back_to_text_hash() {
        let from_id = ExtractionGuard::token_for(Some("msg-1"), "hello");
        assert_eq!(from_id, "msg-1");

        let hashed = ExtractionGuard::token_for(None, "hello");
        assert_eq!(hashed.len(), 16);
        // Deterministic for identical text, distinct for different text.
        assert_eq!(hashed, ExtractionGuard::token_for(None, "hello"));
        assert_ne!(hashed, ExtractionGuard::token_for(None, "goodbye"));
    }
}
