//! TTL Policy Module
//!
//! Maps content categories to TTLs according to how fast the underlying data goes stale.

use std::collections::HashMap;

use crate::error::{CacheError, Result};

/// TTL for categories the policy does not list.
pub const FALLBACK_TTL: u64 = 14_400;

/// Category to TTL (seconds) mapping, consulted by writers at `set` time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    categories: HashMap<String, u64>,
    fallback: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::empty(FALLBACK_TTL)
            .with_category("fundamentals", 86_400)
            .with_category("overview", 14_400)
            .with_category("technical", 14_400)
            .with_category("news", 3_600)
            .with_category("chat", 300)
            .with_category("price", 60)
    }
}

impl TtlPolicy {
    /// A policy with no categories; every lookup yields `fallback`.
    pub fn empty(fallback: u64) -> Self {
        Self {
            categories: HashMap::new(),
            fallback,
        }
    }

    /// Adds or replaces a category.
    pub fn with_category(mut self, category: impl Into<String>, ttl: u64) -> Self {
        self.categories.insert(category.into(), ttl);
        self
    }

    pub fn with_fallback(mut self, fallback: u64) -> Self {
        self.fallback = fallback;
        self
    }

    /// TTL for a category, or the fallback when unlisted.
    pub fn ttl_for(&self, category: &str) -> u64 {
        self.categories
            .get(category)
            .copied()
            .unwrap_or(self.fallback)
    }

    /// TTL for a category only if it is listed.
    pub fn get(&self, category: &str) -> Option<u64> {
        self.categories.get(category).copied()
    }

    pub fn fallback(&self) -> u64 {
        self.fallback
    }

    /// Parses `category=seconds` pairs separated by commas and merges them onto the defaults.
    ///
    /// The reserved category `default` sets the fallback TTL.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut policy = Self::default();

        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (category, ttl) = pair.split_once('=').ok_or_else(|| {
                CacheError::InvalidRequest(format!("expected category=seconds, got '{}'", pair))
            })?;

            let category = category.trim();
            let ttl: u64 = ttl.trim().parse().map_err(|_| {
                CacheError::InvalidRequest(format!("invalid TTL for '{}': '{}'", category, ttl))
            })?;

            if category.is_empty() {
                return Err(CacheError::InvalidRequest(format!(
                    "empty category in '{}'",
                    pair
                )));
            }
            if ttl == 0 {
                return Err(CacheError::InvalidTtl(ttl));
            }

            policy = if category == "default" {
                policy.with_fallback(ttl)
            } else {
                policy.with_category(category, ttl)
            };
        }

        Ok(policy)
    }
}
