//! API Routes
//!
//! Configures the Axum router with all cache admin endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, delete_handler, derive_key_handler, get_handler,
    health_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /api/cache/stats` - Sweep expired entries, then report statistics
/// - `POST /api/cache/clear` - Clear both tiers and counters
/// - `POST /api/cache/cleanup` - Sweep expired fallback entries
/// - `POST /api/cache/key` - Derive a key from a namespace and parameters
/// - `PUT /api/cache/entries` - Store an entry
/// - `GET /api/cache/entries/:key` - Read an entry
/// - `DELETE /api/cache/entries/:key` - Delete an entry
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/cache/stats", get(stats_handler))
        .route("/api/cache/clear", post(clear_handler))
        .route("/api/cache/cleanup", post(cleanup_handler))
        .route("/api/cache/key", post(derive_key_handler))
        .route("/api/cache/entries", put(set_handler))
        .route(
            "/api/cache/entries/:key",
            get(get_handler).delete(delete_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
