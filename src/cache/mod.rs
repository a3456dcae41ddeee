// Keysafe — Cache Module
//
// Best-effort memo of ciphertext keyed by `cache_prefix + key`. The cache is
// never authoritative; callers treat any error as a miss.

mod memory;

use std::time::Duration;

use thiserror::Error;

pub use memory::MemoryCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// TTL-bounded key/value memo.
pub trait Cache {
    fn get(&self, cache_key: &str) -> Result<Option<String>, CacheError>;

    fn save(&self, cache_key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    fn delete(&self, cache_key: &str) -> Result<(), CacheError>;
}

impl<T: Cache + ?Sized> Cache for &T {
    fn get(&self, cache_key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(cache_key)
    }

    fn save(&self, cache_key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        (**self).save(cache_key, value, ttl)
    }

    fn delete(&self, cache_key: &str) -> Result<(), CacheError> {
        (**self).delete(cache_key)
    }
}
