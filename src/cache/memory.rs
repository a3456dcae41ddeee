// Keysafe — In-Process Cache
//
// Backed by a bounded `moka` cache. Each entry carries its own TTL so the
// configured `cache_ttl` applies per save rather than per cache instance.

use std::time::{Duration, Instant};

use moka::sync::Cache as MokaCache;
use moka::Expiry;

use super::{Cache, CacheError};

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was saved with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MemoryCache {
    inner: MokaCache<String, CachedValue>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { inner }
    }
}

impl Cache for MemoryCache {
    fn get(&self, cache_key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(cache_key).map(|entry| entry.value))
    }

    fn save(&self, cache_key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(
            cache_key.to_string(),
            CachedValue {
                value: value.to_string(),
                ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, cache_key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(cache_key);
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_save_then_get() {
        let cache = MemoryCache::new(16);
        cache.save("secrets_api_key", "abcd", HOUR).unwrap();
        assert_eq!(cache.get("secrets_api_key").unwrap().as_deref(), Some("abcd"));
        assert!(cache.get("secrets_other").unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let cache = MemoryCache::new(16);
        cache.save("k", "old", HOUR).unwrap();
        cache.save("k", "new", HOUR).unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_delete_removes_entry() {
        let cache = MemoryCache::new(16);
        cache.save("k", "v", HOUR).unwrap();
        cache.delete("k").unwrap();
        assert!(cache.get("k").unwrap().is_none());
        // Deleting an absent entry is not an error
        assert!(cache.delete("k").is_ok());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new(16);
        cache.save("short", "v", Duration::from_millis(20)).unwrap();
        cache.save("long", "v", HOUR).unwrap();

        std::thread::sleep(Duration::from_millis(80));

        assert!(cache.get("short").unwrap().is_none(), "Expired entry must read as a miss");
        assert!(cache.get("long").unwrap().is_some());
    }
}
