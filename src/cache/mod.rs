//! Cache Module
//!
//! Two-tier response caching: deterministic key derivation, a Redis primary
//! tier, an in-process fallback tier with TTL expiration, hit/miss accounting
//! and a category-based TTL policy.

mod entry;
mod key;
mod memory;
mod policy;
mod primary;
mod service;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{derive_key, KEY_HASH_BYTES};
pub use memory::MemoryStore;
pub use policy::{TtlPolicy, FALLBACK_TTL};
pub use primary::{PrimaryStore, RedisStore};
pub use service::{Cached, ResponseCache, MEMORY_BACKEND};
pub use stats::{hit_rate, CacheStats, HitCounter};

// == Public Constants ==
/// Maximum allowed key length in bytes for externally supplied keys
pub const MAX_KEY_LENGTH: usize = 256;
