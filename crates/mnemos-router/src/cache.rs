// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, time-expiring context cache.
//!
//! Maps a normalized request text to its previously assembled enrichment
//! string. Ephemeral by design: rebuilt at process start, expired by TTL,
//! bounded by oldest-first eviction. A pure key/value store, not a queue;
//! no ordering guarantee across keys.

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct CacheEntry {
    context: String,
    stored_at: Instant,
}

/// TTL- and size-bounded cache of assembled context strings.
pub struct ContextCache {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CacheEntry>,
}

impl ContextCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
        }
    }

    /// Normalizes request text into a cache key: lower-cased, whitespace
    /// collapsed.
    pub fn normalize_key(text: &str) -> String {
        text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Returns the cached context for `key` if it is still fresh. A stale
    /// entry is dropped and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                Some(entry.context.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `context` under `key`, evicting oldest entries while over
    /// the size bound.
    pub fn insert(&mut self, key: String, context: String) {
        self.entries.insert(
            key,
            CacheEntry {
                context,
                stored_at: Instant::now(),
            },
        );
        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_lowercases_and_collapses() {
        assert_eq!(
            ContextCache::normalize_key("  Où  habite\tMarie ?  "),
            "où habite marie ?"
        );
    }

    #[test]
    fn fresh_entry_hits() {
        let mut cache = ContextCache::new(Duration::from_secs(60), 10);
        cache.insert("key".into(), "context".into());
        assert_eq!(cache.get("key").as_deref(), Some("context"));
    }

    #[test]
    fn stale_entry_misses_and_is_dropped() {
        let mut cache = ContextCache::new(Duration::from_millis(10), 10);
        cache.insert("key".into(), "context".into());
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_removes_oldest_first() {
        let mut cache = ContextCache::new(Duration::from_secs(60), 2);
        cache.insert("first".into(), "1".into());
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("second".into(), "2".into());
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("third".into(), "3".into());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn unknown_key_misses() {
        let mut cache = ContextCache::new(Duration::from_secs(60), 10);
        assert!(cache.get("nothing").is_none());
    }

    #[test]
    fn reinsert_refreshes_value() {
        let mut cache = ContextCache::new(Duration::from_secs(60), 10);
        cache.insert("key".into(), "old".into());
        cache.insert("key".into(), "new".into());
        assert_eq!(cache.get("key").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }
}
