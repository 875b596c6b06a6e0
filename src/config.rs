//! Configuration Module
//!
//! Handles loading and managing server and cache configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::cache::TtlPolicy;

/// Cache construction parameters.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Connection string of the primary backend, None = in-process only
    pub redis_url: Option<String>,
    /// Default TTL in seconds for writes that omit one
    pub default_ttl: u64,
    /// Upper bound on every primary backend operation
    pub primary_timeout: Duration,
    /// Upper bound on the startup connectivity probe
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            default_ttl: 3600,
            primary_timeout: Duration::from_millis(250),
            connect_timeout: Duration::from_millis(2000),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache backend settings
    pub cache: CacheConfig,
    /// Category to TTL mapping consulted by writers
    pub ttl_policy: TtlPolicy,
    /// HTTP server port
    pub server_port: u16,
    /// Fallback-tier sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Primary backend address (default: unset, memory only)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `REDIS_TIMEOUT_MS` - Per-operation bound on the primary (default: 250)
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Startup probe bound (default: 2000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `CACHE_TTL_POLICY` - Category overrides, e.g. `news=1800,price=30`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let redis_url = env::var("REDIS_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ttl_policy = match env::var("CACHE_TTL_POLICY") {
            Ok(raw) => TtlPolicy::parse(&raw).unwrap_or_else(|e| {
                warn!("Ignoring CACHE_TTL_POLICY: {}", e);
                TtlPolicy::default()
            }),
            Err(_) => defaults.ttl_policy,
        };

        Self {
            cache: CacheConfig {
                redis_url,
                default_ttl: parse_var("DEFAULT_TTL")
                    .filter(|ttl| *ttl > 0)
                    .unwrap_or(defaults.cache.default_ttl),
                primary_timeout: parse_var("REDIS_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.cache.primary_timeout),
                connect_timeout: parse_var("REDIS_CONNECT_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.cache.connect_timeout),
            },
            ttl_policy,
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            ttl_policy: TtlPolicy::default(),
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
