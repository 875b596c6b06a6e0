//! Cache Entry Module
//!
//! Defines the structure for individual fallback-tier entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// Insertion timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in seconds, fixed at write time
    pub ttl: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - TTL in seconds
    pub fn new(value: Value, ttl: u64) -> Self {
        Self {
            value,
            stored_at: current_timestamp_ms(),
            ttl,
        }
    }

    // == Is Live ==
    /// An entry is live while `now - stored_at < ttl`.
    ///
    /// Once the full TTL has elapsed the entry is no longer live, so a
    /// one-second entry read exactly one second later is a miss.
    pub fn is_live(&self) -> bool {
        self.age_ms() < self.ttl.saturating_mul(1000)
    }

    // == Is Expired ==
    pub fn is_expired(&self) -> bool {
        !self.is_live()
    }

    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.stored_at)
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, 0 once expired.
    ///
    /// This is a diagnostic value; liveness decisions use `is_live`.
    pub fn ttl_remaining(&self) -> u64 {
        self.ttl.saturating_mul(1000).saturating_sub(self.age_ms()) / 1000
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
