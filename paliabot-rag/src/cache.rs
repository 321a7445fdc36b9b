//! Response cache
//!
//! A bounded concurrent map from question fingerprint to finished answer.
//! Expiry is checked on read; when the cache is full, the least recently
//! used entry is evicted. Mutations go through an internal `RwLock`, so
//! concurrent queries can share one cache. A race on the same fingerprint
//! at worst duplicates one generation call; the last writer wins and both
//! results are equivalent.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now + ttl,
            last_accessed: now,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory answer cache with TTL and LRU eviction.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            ttl,
        }
    }

    /// Look up a cached answer. Expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        match entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                debug!("Cache entry expired: {}", key);
                None
            }
            Some(entry) => {
                entry.last_accessed = Instant::now();
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Store an answer, evicting expired entries first and then the least
    /// recently used entry if the cache is still full.
    pub fn insert(&self, key: String, value: String) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        entries.retain(|_, entry| !entry.is_expired());

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru_key {
                entries.remove(&lru_key);
                debug!("Evicted LRU cache entry: {}", lru_key);
            }
        }

        entries.insert(key, CacheEntry::new(value, self.ttl));
    }

    /// Number of entries currently held (including any not yet swept).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
