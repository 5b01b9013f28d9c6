use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::domain::cache::CacheError;
use crate::domain::cache::CacheStore;

/// Redis-backed cache shared by every service instance.
///
/// Expiry is delegated to Redis (`PX`), so entries expire on the server clock.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis.
    ///
    /// # Arguments
    /// * `url` - Connection URL, e.g. `redis://localhost:6379`
    ///
    /// # Errors
    /// * `Unavailable` - URL is invalid or the server is unreachable
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("Invalid Redis URL: {}", e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection })
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    // PX rejects zero
    (ttl.as_millis() as u64).max(1)
}

fn unavailable(command: &str, e: redis::RedisError) -> CacheError {
    CacheError::Unavailable(format!("Redis {} failed: {}", command, e))
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut connection = self.connection.clone();

        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(|e| unavailable("GET", e))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();

        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await
            .map_err(|e| unavailable("SET", e))?;

        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();

        // OK when the key was set, nil when it already existed
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut connection)
            .await
            .map_err(|e| unavailable("SET NX", e))?;

        Ok(reply.is_some())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();

        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(|e| unavailable("DEL", e))?;

        tracing::debug!(key, removed, "Cache key invalidated");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_secs(600)), 600_000);
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_url() {
        let result = RedisCacheStore::new("not a url").await;
        assert!(matches!(result, Err(CacheError::Unavailable(_))));
    }
}
