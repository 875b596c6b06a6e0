//! Background Tasks Module
//!
//! Maintenance work that runs outside request handling.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired fallback-tier entries at configured intervals
//! - Cache Warmer: Pre-populates guided research entries for popular tickers

mod cleanup;
mod producer;
pub mod warmer;

pub use cleanup::spawn_cleanup_task;
pub use producer::HttpProducer;
pub use warmer::{CacheWarmer, ResearchProducer, WarmOutcome, WarmReport, WarmerConfig};
