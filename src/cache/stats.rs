//! Cache Statistics Module
//!
//! Tracks lookup hits and misses across both cache tiers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Hit Counter ==
/// Process-local hit/miss counters, shared by every caller of one cache.
#[derive(Debug, Default)]
pub struct HitCounter {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Reset ==
    /// Zeroes both counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns `(hits, misses)`.
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Lookups answered from either tier
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// hits / (hits + misses), 0.0 before any lookup
    pub hit_rate: f64,
    /// Entry count of the authoritative tier
    pub size: usize,
    /// Name of the backend serving requests
    pub backend_name: String,
    /// TTL applied when writers omit one
    pub default_ttl: u64,
}

impl CacheStats {
    // == Constructor ==
    pub fn new(
        hits: u64,
        misses: u64,
        size: usize,
        backend_name: impl Into<String>,
        default_ttl: u64,
    ) -> Self {
        Self {
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            size,
            backend_name: backend_name.into(),
            default_ttl,
        }
    }
}

// == Hit Rate ==
/// Calculates hits / (hits + misses), or 0.0 if no lookups have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
