//! Exchanged-token cache configuration

use confique::Config;
use serde::Deserialize;

/// Which cache store backs the exchanged-token cache. Defaults to `None`:
/// every request pays the full exchange round-trip unless caching is opted
/// into explicitly.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStore {
    InMemory,
    #[serde(other)]
    #[default]
    None,
}

/// Configuration for the exchanged-token cache
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Upper bound on entry lifetime in seconds; individual entries are
    /// additionally capped by the token's own expiry (default: 1 hour)
    #[config(env = "OBO_CACHE_TTL", default = 3600)]
    pub ttl: u64,

    /// Cache store type: "in-memory" or "none" (default)
    #[config(env = "OBO_CACHE_STORE", default = "none")]
    pub store: CacheStore,

    /// Maximum in-memory capacity in MiB (default: 128 MiB)
    #[config(env = "OBO_CACHE_MEMORY_CAPACITY", default = 128)]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: 3600,
            store: CacheStore::None,
            capacity: 128,
        }
    }
}
