use std::time::Duration;

use async_trait::async_trait;

use crate::domain::cache::errors::CacheError;

/// Key-value cache with per-entry expiry.
///
/// Every operation is atomic at the backend. Sequences of operations are not.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Read a value.
    ///
    /// # Returns
    /// `None` on a miss or once the entry expired
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value, replacing any previous one and resetting its expiry to `now + ttl`.
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Store a value only if the key is absent.
    ///
    /// # Returns
    /// True if this call inserted the value, false if a live entry already existed
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn set_if_absent(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    /// Drop a key. Invalidating a missing key is not an error.
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}
