//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /api/cache/stats` - Cache statistics
//! - `POST /api/cache/clear` - Clear the cache
//! - `POST /api/cache/cleanup` - Sweep expired entries
//! - `POST /api/cache/key` - Derive a cache key
//! - `PUT /api/cache/entries` - Store an entry
//! - `GET /api/cache/entries/:key` - Read an entry
//! - `DELETE /api/cache/entries/:key` - Delete an entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
