//! Research Cache - Two-tier response cache for a stock research backend
//!
//! Caches upstream LLM and market-data responses under deterministic keys,
//! in Redis when reachable and in process memory otherwise.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{derive_key, Cached, ResponseCache, TtlPolicy};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
