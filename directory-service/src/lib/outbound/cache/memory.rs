use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::domain::cache::CacheError;
use crate::domain::cache::CacheStore;

#[derive(Clone)]
struct CachedValue {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

/// Expires every entry after the TTL it was written with.
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

/// In-process cache for single-instance deployments and tests.
///
/// Keys claimed through `set_if_absent` live in their own cache with no
/// capacity bound: size-based eviction must never forget a claim before its
/// TTL runs out.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, CachedValue>,
    claims: Cache<String, CachedValue>,
}

impl MokaCacheStore {
    /// Create a cache holding at most `max_entries` plain keys.
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        let claims = Cache::builder().expire_after(PerEntryTtl).build();

        Self { cache, claims }
    }
}

#[async_trait]
impl CacheStore for MokaCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = match self.cache.get(key).await {
            Some(value) => Some(value),
            None => self.claims.get(key).await,
        };

        Ok(value.map(|value| value.bytes.to_vec()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    bytes: Arc::from(value),
                    ttl,
                },
            )
            .await;

        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        if self.cache.contains_key(key) {
            return Ok(false);
        }

        let candidate = CachedValue {
            bytes: Arc::from(value),
            ttl,
        };

        let entry = self
            .claims
            .entry(key.to_string())
            .or_insert_with(async move { candidate })
            .await;

        Ok(entry.is_fresh())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        self.claims.invalidate(key).await;
        Ok(())
    }
}
