//! Primary Backend Module
//!
//! Shared, durable cache tier with native per-key expiry. Redis is the
//! production implementation; tests substitute their own `PrimaryStore`.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::debug;

use crate::error::BackendError;

/// Operations the two-tier cache needs from its primary backend.
///
/// Payloads are compact JSON text. Implementations report failures as
/// `BackendError`; the cache decides which ones it absorbs.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Short backend label reported in stats.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Writes with native expiry; overwrites reset the expiry.
    async fn set(&self, key: &str, payload: &str, ttl_secs: u64) -> Result<(), BackendError>;

    async fn delete(&self, key: &str) -> Result<(), BackendError>;

    /// Drops every key in the backend's database, not only this cache's keys.
    async fn clear(&self) -> Result<(), BackendError>;

    async fn size(&self) -> Result<usize, BackendError>;
}

// == Redis Store ==
/// Redis-backed primary tier over an auto-reconnecting connection manager.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a connection and verifies it with `PING`.
    ///
    /// The whole probe is bounded by `connect_timeout`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::open(url).map_err(|e| BackendError::Other(e.to_string()))?;

        let probe = async {
            let mut conn = ConnectionManager::new(client).await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            debug!("Redis probe replied {}", pong);
            Ok::<_, redis::RedisError>(conn)
        };

        match tokio::time::timeout(connect_timeout, probe).await {
            Ok(Ok(conn)) => Ok(Self { conn }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(BackendError::Timeout(format!(
                "no reply within {:?}",
                connect_timeout
            ))),
        }
    }
}

#[async_trait]
impl PrimaryStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key).await?;
        Ok(payload)
    }

    async fn set(&self, key: &str, payload: &str, ttl_secs: u64) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, payload, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn size(&self) -> Result<usize, BackendError> {
        let mut conn = self.conn.clone();
        let size: usize = redis::cmd("DBSIZE").query_async(&mut conn).await?;
        Ok(size)
    }
}
