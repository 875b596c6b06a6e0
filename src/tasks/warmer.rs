//! Cache Warmer
//!
//! Pre-populates guided-research entries for popular tickers so the first
//! user request for them is served from cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::cache::{derive_key, ResponseCache, TtlPolicy};
use crate::error::Result;

/// Namespace of guided research keys.
pub const GUIDED_NAMESPACE: &str = "guided";

/// Tickers warmed by default, most requested first.
pub const POPULAR_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "JPM", "BAC", "V", "MA", "JNJ",
    "UNH", "WMT", "HD", "DIS", "BA", "XOM", "SPY", "QQQ",
];

/// Research steps warmed by default, most requested first.
pub const PRIORITY_STEPS: &[&str] = &[
    "overview",
    "financials",
    "valuation",
    "moat",
    "risks",
    "investment_advice",
    "memo",
];

/// Upstream that produces a research answer for one ticker and step.
#[async_trait]
pub trait ResearchProducer: Send + Sync {
    async fn produce(
        &self,
        ticker: &str,
        step: &str,
        horizon: &str,
        risk: &str,
    ) -> anyhow::Result<Value>;
}

/// Warm-up run parameters.
#[derive(Debug, Clone)]
pub struct WarmerConfig {
    pub tickers: Vec<String>,
    pub steps: Vec<String>,
    pub horizon: String,
    pub risk: String,
    /// Pause after each producer call
    pub pause: Duration,
    /// Producer calls allowed per rate window, None = uncapped
    pub max_per_minute: Option<u32>,
    /// Length of the rate window; one minute outside tests
    pub rate_window: Duration,
}

impl Default for WarmerConfig {
    fn default() -> Self {
        Self {
            tickers: POPULAR_TICKERS.iter().map(|t| t.to_string()).collect(),
            steps: PRIORITY_STEPS.iter().map(|s| s.to_string()).collect(),
            horizon: "1-3 years".to_string(),
            risk: "moderate".to_string(),
            pause: Duration::from_secs(2),
            max_per_minute: Some(10),
            rate_window: Duration::from_secs(60),
        }
    }
}

impl WarmerConfig {
    /// Applies `WARM_TICKERS`, `WARM_STEPS` (comma separated),
    /// `WARM_MAX_PER_MINUTE` (0 = uncapped) and `WARM_PAUSE_MS` over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(tickers) = list_var("WARM_TICKERS") {
            config.tickers = tickers;
        }
        if let Some(steps) = list_var("WARM_STEPS") {
            config.steps = steps;
        }
        if let Some(max) = parse_var::<u32>("WARM_MAX_PER_MINUTE") {
            config.max_per_minute = (max > 0).then_some(max);
        }
        if let Some(ms) = parse_var::<u64>("WARM_PAUSE_MS") {
            config.pause = Duration::from_millis(ms);
        }
        config
    }
}

fn list_var(name: &str) -> Option<Vec<String>> {
    let items: Vec<String> = std::env::var(name)
        .ok()?
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Producer-call budget for the current rate window.
struct RateWindow {
    started: Instant,
    used: u32,
}

impl RateWindow {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            used: 0,
        }
    }

    /// Takes one call from the budget, starting a new window when the old one ran out.
    fn try_acquire(&mut self, max: Option<u32>, window: Duration) -> bool {
        if self.started.elapsed() >= window {
            self.started = Instant::now();
            self.used = 0;
        }
        match max {
            Some(max) if self.used >= max => false,
            _ => {
                self.used += 1;
                true
            }
        }
    }

    fn remaining(&self, window: Duration) -> Duration {
        window.saturating_sub(self.started.elapsed())
    }
}

/// Outcome of warming one ticker/step pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WarmOutcome {
    /// Already live in the cache
    Cached { ticker: String, step: String },
    /// Produced and stored
    Stored { ticker: String, step: String, ttl: u64 },
    /// Ticker rejected before any lookup
    InvalidTicker { ticker: String },
    /// Skipped because the producer-call budget was spent
    RateLimited { ticker: String, step: String },
    /// Cache or producer failure
    Error { ticker: String, step: String, error: String },
}

/// Totals and per-pair outcomes of a warm-up run.
#[derive(Debug, Clone, Serialize)]
pub struct WarmReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub total_tasks: usize,
    pub processed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub producer_calls: usize,
    pub rate_limited: usize,
    pub errors: usize,
    pub results: Vec<WarmOutcome>,
}

impl WarmReport {
    /// Process exit status for a warm-up run: 0 when clean, 2 when any pair failed.
    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 {
            2
        } else {
            0
        }
    }
}

// == Cache Warmer ==
pub struct CacheWarmer<P> {
    cache: Arc<ResponseCache>,
    policy: TtlPolicy,
    producer: P,
    config: WarmerConfig,
}

impl<P: ResearchProducer> CacheWarmer<P> {
    pub fn new(
        cache: Arc<ResponseCache>,
        policy: TtlPolicy,
        producer: P,
        config: WarmerConfig,
    ) -> Self {
        Self {
            cache,
            policy,
            producer,
            config,
        }
    }

    /// Warms every ticker × step pair. Failures are recorded, never fatal.
    pub async fn run(&self) -> WarmReport {
        let started_at = Utc::now();
        let total_tasks = self.config.tickers.len() * self.config.steps.len();
        let mut report = WarmReport {
            started_at,
            completed_at: started_at,
            total_tasks,
            processed: 0,
            cache_hits: 0,
            cache_misses: 0,
            producer_calls: 0,
            rate_limited: 0,
            errors: 0,
            results: Vec::with_capacity(total_tasks),
        };

        info!(
            "Cache warming: {} tickers x {} steps = {} tasks",
            self.config.tickers.len(),
            self.config.steps.len(),
            total_tasks
        );

        let mut window = RateWindow::new();

        for ticker in &self.config.tickers {
            for step in &self.config.steps {
                let outcome = self.warm_one(ticker, step, &mut window, &mut report).await;
                report.results.push(outcome);

                if report.results.len() % 10 == 0 {
                    info!("Progress: {}/{}", report.results.len(), total_tasks);
                }
            }
        }

        report.completed_at = Utc::now();
        info!(
            "Cache warming complete: processed={} hits={} misses={} calls={} rate_limited={} errors={}",
            report.processed,
            report.cache_hits,
            report.cache_misses,
            report.producer_calls,
            report.rate_limited,
            report.errors
        );
        report
    }

    async fn warm_one(
        &self,
        ticker: &str,
        step: &str,
        window: &mut RateWindow,
        report: &mut WarmReport,
    ) -> WarmOutcome {
        if !is_valid_ticker(ticker) {
            warn!("Invalid ticker format: {}", ticker);
            report.errors += 1;
            return WarmOutcome::InvalidTicker {
                ticker: ticker.to_string(),
            };
        }

        let failed = |error: String| WarmOutcome::Error {
            ticker: ticker.to_string(),
            step: step.to_string(),
            error,
        };

        let key = match guided_key(ticker, step, &self.config.horizon, &self.config.risk) {
            Ok(key) => key,
            Err(e) => {
                report.errors += 1;
                return failed(e.to_string());
            }
        };

        match self.cache.get(&key).await {
            Ok(Some(_)) => {
                report.cache_hits += 1;
                return WarmOutcome::Cached {
                    ticker: ticker.to_string(),
                    step: step.to_string(),
                };
            }
            Ok(None) => {}
            Err(e) => {
                report.errors += 1;
                return failed(e.to_string());
            }
        }

        if !window.try_acquire(self.config.max_per_minute, self.config.rate_window) {
            warn!("Rate limit reached, skipping: {} - {}", ticker, step);
            report.rate_limited += 1;
            tokio::time::sleep(window.remaining(self.config.rate_window)).await;
            return WarmOutcome::RateLimited {
                ticker: ticker.to_string(),
                step: step.to_string(),
            };
        }

        report.producer_calls += 1;
        let produced = self
            .producer
            .produce(ticker, step, &self.config.horizon, &self.config.risk)
            .await;

        let outcome = match produced {
            Ok(response) => {
                let ttl = self.policy.ttl_for(step);
                let entry = json!({
                    "step": step,
                    "ticker": ticker,
                    "response": response,
                    "cached": false,
                    "warmed_at": Utc::now().to_rfc3339(),
                });

                match self.cache.set(&key, &entry, Some(ttl)).await {
                    Ok(()) => {
                        report.cache_misses += 1;
                        report.processed += 1;
                        info!("Cached: {} - {} (ttl {}s)", ticker, step, ttl);
                        WarmOutcome::Stored {
                            ticker: ticker.to_string(),
                            step: step.to_string(),
                            ttl,
                        }
                    }
                    Err(e) => {
                        report.errors += 1;
                        failed(e.to_string())
                    }
                }
            }
            Err(e) => {
                error!("Error warming {} - {}: {}", ticker, step, e);
                report.errors += 1;
                failed(e.to_string())
            }
        };

        if !self.config.pause.is_zero() {
            tokio::time::sleep(self.config.pause).await;
        }

        outcome
    }
}

/// Key used by guided research handlers and the warmer alike.
pub fn guided_key(ticker: &str, step: &str, horizon: &str, risk: &str) -> Result<String> {
    derive_key(
        GUIDED_NAMESPACE,
        &json!({"ticker": ticker, "step": step, "horizon": horizon, "risk": risk}),
    )
}

/// Alphanumeric, 1 to 5 characters.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty() && ticker.len() <= 5 && ticker.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProducer {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl StubProducer {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ResearchProducer for StubProducer {
        async fn produce(
            &self,
            ticker: &str,
            step: &str,
            _horizon: &str,
            _risk: &str,
        ) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(ticker) {
                anyhow::bail!("upstream rejected {}", ticker);
            }
            Ok(json!(format!("{} analysis for {}", step, ticker)))
        }
    }

    fn config(tickers: &[&str], steps: &[&str]) -> WarmerConfig {
        WarmerConfig {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
            pause: Duration::ZERO,
            max_per_minute: None,
            ..WarmerConfig::default()
        }
    }

    #[test]
    fn test_ticker_validation() {
        assert!(is_valid_ticker("AAPL"));
        assert!(is_valid_ticker("BRK1"));
        assert!(!is_valid_ticker(""));
        assert!(!is_valid_ticker("TOOLONG"));
        assert!(!is_valid_ticker("BRK.B"));
        assert!(!is_valid_ticker("A;DROP"));
    }

    #[test]
    fn test_guided_key_is_stable() {
        let a = guided_key("AAPL", "news", "1-3 years", "moderate").unwrap();
        let b = guided_key("AAPL", "news", "1-3 years", "moderate").unwrap();
        let c = guided_key("AAPL", "moat", "1-3 years", "moderate").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("guided:"));
    }

    #[tokio::test]
    async fn test_warm_stores_with_category_ttl() {
        let cache = Arc::new(ResponseCache::in_memory(3600));
        let warmer = CacheWarmer::new(
            cache.clone(),
            TtlPolicy::default(),
            StubProducer::new(None),
            config(&["AAPL"], &["news", "fundamentals"]),
        );

        let report = warmer.run().await;

        assert_eq!(report.total_tasks, 2);
        assert_eq!(report.processed, 2);
        assert_eq!(report.producer_calls, 2);
        assert_eq!(report.errors, 0);
        assert!(report.results.contains(&WarmOutcome::Stored {
            ticker: "AAPL".to_string(),
            step: "news".to_string(),
            ttl: 3_600,
        }));
        assert!(report.results.contains(&WarmOutcome::Stored {
            ticker: "AAPL".to_string(),
            step: "fundamentals".to_string(),
            ttl: 86_400,
        }));

        let key = guided_key("AAPL", "news", "1-3 years", "moderate").unwrap();
        let entry = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(entry["response"], "news analysis for AAPL");
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let cache = Arc::new(ResponseCache::in_memory(3600));
        let warmer = CacheWarmer::new(
            cache,
            TtlPolicy::default(),
            StubProducer::new(None),
            config(&["MSFT", "NVDA"], &["overview"]),
        );

        warmer.run().await;
        let second = warmer.run().await;

        assert_eq!(second.cache_hits, 2);
        assert_eq!(second.producer_calls, 0);
        assert_eq!(warmer.producer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_run() {
        let cache = Arc::new(ResponseCache::in_memory(3600));
        let warmer = CacheWarmer::new(
            cache.clone(),
            TtlPolicy::default(),
            StubProducer::new(Some("TSLA")),
            config(&["TSLA", "BAD.X", "SPY"], &["risks"]),
        );

        let report = warmer.run().await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.errors, 2);
        assert_eq!(report.processed, 1);
        assert_eq!(report.producer_calls, 2);
        assert!(matches!(report.results[0], WarmOutcome::Error { .. }));
        assert!(matches!(report.results[1], WarmOutcome::InvalidTicker { .. }));
        assert_eq!(cache.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rate_cap_skips_pairs_until_window_resets() {
        let cache = Arc::new(ResponseCache::in_memory(3600));
        let mut capped = config(&["AAPL", "MSFT", "NVDA", "AMZN"], &["overview"]);
        capped.max_per_minute = Some(2);
        capped.rate_window = Duration::from_millis(300);
        let warmer = CacheWarmer::new(cache, TtlPolicy::default(), StubProducer::new(None), capped);

        let started = Instant::now();
        let report = warmer.run().await;

        assert_eq!(report.producer_calls, 3);
        assert_eq!(report.rate_limited, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(
            report.results[2],
            WarmOutcome::RateLimited {
                ticker: "NVDA".to_string(),
                step: "overview".to_string(),
            }
        );
        assert!(matches!(report.results[3], WarmOutcome::Stored { .. }));
        // The skipped pair waited out the rest of the window
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn test_rate_window_budget() {
        let mut window = RateWindow::new();
        let minute = Duration::from_secs(60);

        assert!(window.try_acquire(Some(2), minute));
        assert!(window.try_acquire(Some(2), minute));
        assert!(!window.try_acquire(Some(2), minute));
        assert!(window.try_acquire(None, minute));
        assert!(window.remaining(minute) > Duration::from_secs(59));
    }

    #[test]
    fn test_exit_code_reflects_errors() {
        let now = Utc::now();
        let mut report = WarmReport {
            started_at: now,
            completed_at: now,
            total_tasks: 1,
            processed: 1,
            cache_hits: 0,
            cache_misses: 1,
            producer_calls: 1,
            rate_limited: 0,
            errors: 0,
            results: Vec::new(),
        };
        assert_eq!(report.exit_code(), 0);

        report.errors = 1;
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_config_from_env() {
        std::env::set_var("WARM_TICKERS", "aapl, MSFT,,");
        std::env::set_var("WARM_MAX_PER_MINUTE", "0");
        std::env::set_var("WARM_PAUSE_MS", "250");

        let config = WarmerConfig::from_env();
        assert_eq!(config.tickers, vec!["aapl".to_string(), "MSFT".to_string()]);
        assert_eq!(config.steps.len(), PRIORITY_STEPS.len());
        assert_eq!(config.max_per_minute, None);
        assert_eq!(config.pause, Duration::from_millis(250));

        std::env::remove_var("WARM_TICKERS");
        std::env::remove_var("WARM_MAX_PER_MINUTE");
        std::env::remove_var("WARM_PAUSE_MS");

        assert_eq!(WarmerConfig::from_env().max_per_minute, Some(10));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = WarmOutcome::Cached {
            ticker: "SPY".to_string(),
            step: "memo".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "cached");
        assert_eq!(json["ticker"], "SPY");
    }
}
