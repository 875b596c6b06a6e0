//! Response Cache Module
//!
//! Two-tier cache used by request handlers: an optional primary backend with
//! native expiry, backed by an in-process store with lazy expiry. Backend
//! selection happens once at construction; afterwards every call tries the
//! primary and silently degrades to the memory tier on connectivity failures.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::{derive_key, CacheStats, HitCounter, MemoryStore, PrimaryStore, RedisStore};
use crate::config::CacheConfig;
use crate::error::{BackendError, CacheError, Result};

/// Backend label reported when only the in-process tier is in use.
pub const MEMORY_BACKEND: &str = "memory";

// == Cached ==
/// A value returned by `get_or_compute`, flagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cached<T> {
    pub value: T,
    /// True when served from cache, false when freshly produced
    pub cached: bool,
}

// == Response Cache ==
/// Two-tier key/value cache with per-entry TTL and hit/miss accounting.
///
/// Construct one per process at the composition root and share it behind an `Arc`.
pub struct ResponseCache {
    primary: Option<Arc<dyn PrimaryStore>>,
    memory: RwLock<MemoryStore>,
    counter: HitCounter,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    default_ttl: u64,
    primary_timeout: Duration,
}

impl ResponseCache {
    // == Constructors ==
    /// Builds a cache, probing the configured primary backend once.
    ///
    /// An absent, malformed or unreachable primary yields a memory-only cache.
    pub async fn connect(config: &CacheConfig) -> Self {
        let primary = match config.redis_url.as_deref() {
            Some(url) => match RedisStore::connect(url, config.connect_timeout).await {
                Ok(store) => {
                    info!("Redis cache connected");
                    Some(Arc::new(store) as Arc<dyn PrimaryStore>)
                }
                Err(e) => {
                    warn!("Redis unavailable, using memory cache: {}", e);
                    None
                }
            },
            None => {
                info!("No REDIS_URL configured, using memory cache");
                None
            }
        };

        Self::build(primary, config)
    }

    /// Builds a memory-only cache.
    pub fn in_memory(default_ttl: u64) -> Self {
        let config = CacheConfig {
            default_ttl,
            ..CacheConfig::default()
        };
        Self::build(None, &config)
    }

    /// Builds a cache around an already-connected primary backend.
    pub fn with_primary(primary: Arc<dyn PrimaryStore>, config: &CacheConfig) -> Self {
        Self::build(Some(primary), config)
    }

    fn build(primary: Option<Arc<dyn PrimaryStore>>, config: &CacheConfig) -> Self {
        Self {
            primary,
            memory: RwLock::new(MemoryStore::new()),
            counter: HitCounter::new(),
            in_flight: DashMap::new(),
            default_ttl: config.default_ttl,
            primary_timeout: config.primary_timeout,
        }
    }

    // == Accessors ==
    /// Name of the backend selected at construction.
    pub fn backend_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map(|p| p.name())
            .unwrap_or(MEMORY_BACKEND)
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// See [`derive_key`].
    pub fn derive_key<P>(&self, namespace: &str, params: &P) -> Result<String>
    where
        P: Serialize + ?Sized,
    {
        derive_key(namespace, params)
    }

    // == Get ==
    /// Returns the live value for `key`, counting a hit or a miss.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        let found = self.lookup(key).await?;
        match found {
            Some(_) => self.counter.record_hit(),
            None => self.counter.record_miss(),
        }
        Ok(found)
    }

    /// Like `get`, deserializing the cached value into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Primary first, then the memory tier. No accounting.
    async fn lookup(&self, key: &str) -> Result<Option<Value>> {
        if let Some(primary) = &self.primary {
            if let Some(Some(payload)) = self.on_primary("get", primary.get(key)).await? {
                return Ok(Some(serde_json::from_str(&payload)?));
            }
        }

        Ok(self.memory.write().await.get(key))
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` seconds (default TTL when None).
    ///
    /// # Errors
    /// `InvalidTtl` for a zero TTL, `Serialization` if `value` has no JSON form.
    pub async fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl: Option<u64>,
    ) -> Result<()> {
        let ttl = self.effective_ttl(ttl)?;
        let value = serde_json::to_value(value)?;
        self.store(key, value, ttl).await
    }

    async fn store(&self, key: &str, value: Value, ttl: u64) -> Result<()> {
        if let Some(primary) = &self.primary {
            let payload = serde_json::to_string(&value)?;
            if self
                .on_primary("set", primary.set(key, &payload, ttl))
                .await?
                .is_some()
            {
                // An outage copy must not outlive a fresher primary write
                self.memory.write().await.remove(key);
                return Ok(());
            }
        }

        self.memory.write().await.set(key.to_string(), value, ttl);
        Ok(())
    }

    fn effective_ttl(&self, ttl: Option<u64>) -> Result<u64> {
        match ttl.unwrap_or(self.default_ttl) {
            0 => Err(CacheError::InvalidTtl(0)),
            ttl => Ok(ttl),
        }
    }

    // == Delete ==
    /// Removes `key` from both tiers. A missing key is not an error.
    ///
    /// The memory copy is dropped even when the primary reports an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.memory.write().await.remove(key);
        if let Some(primary) = &self.primary {
            self.on_primary("delete", primary.delete(key)).await?;
        }
        Ok(())
    }

    // == Clear ==
    /// Empties both tiers and resets the hit/miss counters.
    ///
    /// On Redis this flushes the whole database, including keys this cache
    /// did not write. The memory tier and counters are reset even when the
    /// primary reports an error.
    pub async fn clear(&self) -> Result<()> {
        self.memory.write().await.clear();
        self.counter.reset();
        if let Some(primary) = &self.primary {
            self.on_primary("clear", primary.clear()).await?;
        }
        Ok(())
    }

    // == Size ==
    /// Entry count of the authoritative tier. Advisory only.
    pub async fn size(&self) -> Result<usize> {
        if let Some(primary) = &self.primary {
            if let Some(size) = self.on_primary("size", primary.size()).await? {
                return Ok(size);
            }
        }
        Ok(self.memory.read().await.len())
    }

    // == Cleanup Expired ==
    /// Sweeps expired entries from the memory tier and returns how many were removed.
    ///
    /// The primary expires natively, so only outage writes can be swept.
    pub async fn cleanup_expired(&self) -> usize {
        self.memory.write().await.cleanup_expired()
    }

    // == Stats ==
    pub async fn stats(&self) -> Result<CacheStats> {
        let (hits, misses) = self.counter.snapshot();
        let size = self.size().await?;
        Ok(CacheStats::new(
            hits,
            misses,
            size,
            self.backend_name(),
            self.default_ttl,
        ))
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, or runs `produce`, stores its result
    /// and returns it.
    ///
    /// Concurrent misses on the same key within this process are serialized so
    /// `produce` runs once; later callers receive the stored value. Producer
    /// errors are returned as-is and nothing is cached.
    ///
    /// Accounting follows what was served: one hit per cached answer, one
    /// miss per producer run.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<u64>,
        produce: F,
    ) -> std::result::Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let ttl = self.effective_ttl(ttl)?;

        if let Some(value) = self.lookup(key).await? {
            self.counter.record_hit();
            return Ok(Cached {
                value: serde_json::from_value(value).map_err(CacheError::from)?,
                cached: true,
            });
        }

        let lock = self.in_flight.entry(key.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.fill(key, ttl, produce).await
        };

        // Table entry plus this caller's clone: nobody else is waiting
        self.in_flight
            .remove_if(key, |_, l| Arc::strong_count(l) <= 2);

        result
    }

    /// Miss path of `get_or_compute`, run while holding the key's in-flight lock.
    async fn fill<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: u64,
        produce: F,
    ) -> std::result::Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        // Another caller may have filled the key while this one waited
        if let Some(value) = self.lookup(key).await? {
            self.counter.record_hit();
            return Ok(Cached {
                value: serde_json::from_value(value).map_err(CacheError::from)?,
                cached: true,
            });
        }

        self.counter.record_miss();
        let value = produce().await?;
        let json = serde_json::to_value(&value).map_err(CacheError::from)?;
        self.store(key, json, ttl).await?;

        Ok(Cached {
            value,
            cached: false,
        })
    }

    /// Runs a primary operation under the timeout.
    ///
    /// `Ok(None)` means the call failed recoverably and the caller should use
    /// the memory tier.
    async fn on_primary<T, F>(&self, op: &'static str, call: F) -> Result<Option<T>>
    where
        F: Future<Output = std::result::Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.primary_timeout, call).await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(e)) if e.is_recoverable() => {
                debug!("Primary {} failed, falling back to memory: {}", op, e);
                Ok(None)
            }
            Ok(Err(e)) => Err(CacheError::Backend(format!("{} failed: {}", op, e))),
            Err(_) => {
                debug!(
                    "Primary {} timed out after {:?}, falling back to memory",
                    op, self.primary_timeout
                );
                Ok(None)
            }
        }
    }
}
