//! Memory Store Module
//!
//! In-process fallback tier: a HashMap of entries with lazy and swept TTL expiration.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::CacheEntry;

// == Memory Store ==
/// Fallback storage used when the primary backend is absent or failing.
///
/// Every operation is infallible. Expired entries are dropped on the read that
/// finds them or by `cleanup_expired`, whichever comes first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a value, overwriting any previous entry and restarting its clock.
    pub fn set(&mut self, key: String, value: Value, ttl: u64) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Returns the value if present and live.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_live() => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    // == Remove ==
    /// Removes an entry. Missing keys are ignored.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live());
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
