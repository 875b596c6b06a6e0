//! Cache Warmer - pre-populates guided research entries
//!
//! Exit status: 0 when every pair was cached or stored, 1 on a setup error,
//! 2 when any pair failed.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use research_cache::tasks::{CacheWarmer, HttpProducer, WarmerConfig};
use research_cache::{Config, ResponseCache};

/// Upper bound on one research backend call
const PRODUCER_TIMEOUT: Duration = Duration::from_secs(120);

/// # Environment Variables
/// - `RESEARCH_API_URL` - Guided research endpoint (required)
/// - `CACHE_WARMER_SECRET` - Bearer secret sent to the endpoint (required)
/// - `WARM_TICKERS`, `WARM_STEPS`, `WARM_MAX_PER_MINUTE`, `WARM_PAUSE_MS` - Run overrides
/// - Cache settings as for the server (`REDIS_URL`, `CACHE_TTL_POLICY`, ...)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_cache=info,warm_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let endpoint = env::var("RESEARCH_API_URL").context("RESEARCH_API_URL not set")?;
    let secret = env::var("CACHE_WARMER_SECRET").context("CACHE_WARMER_SECRET not set")?;

    let config = Config::from_env();
    let cache = Arc::new(ResponseCache::connect(&config.cache).await);
    info!("Warming {} cache", cache.backend_name());

    let producer = HttpProducer::new(endpoint, secret, PRODUCER_TIMEOUT)?;
    let warmer = CacheWarmer::new(cache, config.ttl_policy, producer, WarmerConfig::from_env());

    let report = warmer.run().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.errors > 0 {
        warn!("Completed with {} errors", report.errors);
    } else {
        info!("Cache warming completed successfully");
    }

    std::process::exit(report.exit_code());
}
