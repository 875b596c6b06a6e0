//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{ResponseCache, TtlPolicy};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CleanupResponse, ClearResponse, DeleteResponse, DeriveKeyRequest, GetResponse,
    HealthResponse, KeyResponse, SetEntryRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the process-wide cache handle and the TTL policy writers consult.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ResponseCache>,
    pub ttl_policy: Arc<TtlPolicy>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<ResponseCache>, ttl_policy: TtlPolicy) -> Self {
        Self {
            cache,
            ttl_policy: Arc::new(ttl_policy),
        }
    }

    /// Creates a new AppState from configuration, probing the primary backend.
    pub async fn from_config(config: &Config) -> Self {
        let cache = ResponseCache::connect(&config.cache).await;
        Self::new(Arc::new(cache), config.ttl_policy.clone())
    }

    /// Explicit TTL, else the category's TTL, else the cache default.
    fn resolve_ttl(&self, ttl: Option<u64>, category: Option<&str>) -> u64 {
        ttl.or_else(|| category.map(|c| self.ttl_policy.ttl_for(c)))
            .unwrap_or_else(|| self.cache.default_ttl())
    }
}

/// Handler for PUT /api/cache/entries
///
/// Stores a JSON value under a key.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetEntryRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = state.resolve_ttl(req.ttl, req.category.as_deref());
    state.cache.set(&req.key, &req.value, Some(ttl)).await?;

    Ok(Json(SetResponse::new(req.key, ttl)))
}

/// Handler for GET /api/cache/entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /api/cache/entries/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.delete(&key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /api/cache/key
pub async fn derive_key_handler(
    State(state): State<AppState>,
    Json(req): Json<DeriveKeyRequest>,
) -> Result<Json<KeyResponse>> {
    let key = state.cache.derive_key(&req.namespace, &req.params)?;
    Ok(Json(KeyResponse { key }))
}

/// Handler for GET /api/cache/stats
///
/// Sweeps expired fallback entries before reporting.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let expired_cleaned = state.cache.cleanup_expired().await;
    let stats = state.cache.stats().await?;

    Ok(Json(StatsResponse {
        stats,
        expired_cleaned,
    }))
}

/// Handler for POST /api/cache/cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.cache.cleanup_expired().await;
    Json(CleanupResponse { removed })
}

/// Handler for POST /api/cache/clear
///
/// Clears both tiers and the hit/miss counters.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.cache.clear().await?;
    Ok(Json(ClearResponse::cleared()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.backend_name()))
}
