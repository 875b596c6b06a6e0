//! Integration Tests for the Response Cache
//!
//! Exercises the public cache API the way request handlers use it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use research_cache::{derive_key, CacheConfig, CacheError, ResponseCache, TtlPolicy};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn unreachable_config() -> CacheConfig {
    CacheConfig {
        redis_url: Some("redis://127.0.0.1:1/0".to_string()),
        default_ttl: 3600,
        primary_timeout: Duration::from_millis(100),
        connect_timeout: Duration::from_millis(500),
    }
}

#[test]
fn test_keys_are_pairwise_distinct() {
    let mut keys = std::collections::HashSet::new();
    let namespaces = ["guided", "chat", "compare", "price"];
    let tickers = ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "SPY", "QQQ"];
    let steps = ["overview", "news", "fundamentals", "moat", "risks"];

    for namespace in namespaces {
        for ticker in tickers {
            for step in steps {
                let key = derive_key(namespace, &json!({"ticker": ticker, "step": step})).unwrap();
                assert!(keys.insert(key), "collision for {}/{}/{}", namespace, ticker, step);
            }
        }
    }

    assert_eq!(keys.len(), namespaces.len() * tickers.len() * steps.len());
}

#[tokio::test]
async fn test_expiry() {
    let cache = ResponseCache::in_memory(3600);

    cache.set("price:aapl", &json!(189.5), Some(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.get("price:aapl").await.unwrap(), None);
}

#[tokio::test]
async fn test_overwrite_resets_expiry() {
    let cache = ResponseCache::in_memory(3600);

    cache.set("k", &json!("v1"), Some(2)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    cache.set("k", &json!("v2"), Some(2)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    // 3s after the first write, 1.5s after the second
    assert_eq!(cache.get("k").await.unwrap(), Some(json!("v2")));
}

#[tokio::test]
async fn test_fallback_transparency_with_unreachable_primary() {
    let cache = ResponseCache::connect(&unreachable_config()).await;

    cache
        .set("chat:q1", &json!({"answer": "diversify"}), Some(60))
        .await
        .unwrap();

    assert_eq!(
        cache.get("chat:q1").await.unwrap(),
        Some(json!({"answer": "diversify"}))
    );
    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.backend_name, "memory");
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn test_no_primary_configured() {
    let cache = ResponseCache::connect(&CacheConfig::default()).await;
    assert_eq!(cache.backend_name(), "memory");
}

#[tokio::test]
async fn test_hit_miss_accounting() {
    let cache = ResponseCache::in_memory(3600);
    cache.clear().await.unwrap();

    assert!(cache.get("k").await.unwrap().is_none());
    cache.set("k", &json!({"v": 1}), None).await.unwrap();
    assert!(cache.get("k").await.unwrap().is_some());

    let stats = cache.stats().await.unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate, 0.5);
}

#[tokio::test]
async fn test_idempotent_cleanup() {
    let cache = ResponseCache::in_memory(3600);
    cache.set("a", &json!(1), Some(1)).await.unwrap();
    cache.set("b", &json!(2), Some(1)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(cache.cleanup_expired().await, 2);
    assert_eq!(cache.cleanup_expired().await, 0);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GuidedResult {
    ticker: String,
    step: String,
    response: String,
    citations: Vec<String>,
}

#[tokio::test]
async fn test_guided_request_end_to_end() {
    let policy = TtlPolicy::empty(14_400)
        .with_category("news", 3_600)
        .with_category("fundamentals", 86_400);
    let cache = ResponseCache::in_memory(3600);
    let upstream_calls = AtomicUsize::new(0);

    let params = json!({"ticker": "AAPL", "step": "news"});
    let key = derive_key("guided", &params).unwrap();

    // First request: miss, compute, store
    assert!(cache.get_as::<GuidedResult>(&key).await.unwrap().is_none());
    upstream_calls.fetch_add(1, Ordering::SeqCst);
    let computed = GuidedResult {
        ticker: "AAPL".to_string(),
        step: "news".to_string(),
        response: "Services revenue beat estimates".to_string(),
        citations: vec!["https://example.com/q3".to_string()],
    };
    cache
        .set(&key, &computed, Some(policy.ttl_for("news")))
        .await
        .unwrap();

    // Second identical request, parameters in a different order
    let same_key = derive_key("guided", &json!({"step": "news", "ticker": "AAPL"})).unwrap();
    let cached = cache.get_as::<GuidedResult>(&same_key).await.unwrap();

    assert_eq!(cached, Some(computed));
    assert_eq!(upstream_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_compute_flags_cached_results() {
    let cache = Arc::new(ResponseCache::in_memory(3600));
    let key = derive_key("compare", &json!({"tickers": ["AAPL", "MSFT"]})).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    for expected_cached in [false, true, true] {
        let calls = calls.clone();
        let result = cache
            .get_or_compute(&key, Some(3600), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(json!({"winner": "MSFT"}))
            })
            .await
            .unwrap();

        assert_eq!(result.cached, expected_cached);
        assert_eq!(result.value["winner"], "MSFT");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_compute_with_caller_error_type() {
    #[derive(Debug)]
    enum HandlerError {
        Cache(CacheError),
        Upstream(String),
    }

    impl From<CacheError> for HandlerError {
        fn from(e: CacheError) -> Self {
            HandlerError::Cache(e)
        }
    }

    let cache = ResponseCache::in_memory(3600);

    let result = cache
        .get_or_compute("chat:x", Some(300), || async {
            Err::<String, _>(HandlerError::Upstream("rate limited".to_string()))
        })
        .await;
    assert!(matches!(result, Err(HandlerError::Upstream(_))));

    let result = cache
        .get_or_compute("chat:x", Some(0), || async { Ok::<_, HandlerError>(1) })
        .await;
    assert!(matches!(
        result,
        Err(HandlerError::Cache(CacheError::InvalidTtl(0)))
    ));
}
