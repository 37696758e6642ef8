//! Key-value medium trait

use async_trait::async_trait;

use crate::Result;

/// String key-value storage the cache store persists entries into
///
/// The medium has bounded capacity: `set` fails with
/// [`CacheError::CapacityExceeded`](crate::CacheError::CapacityExceeded)
/// when the write does not fit. Keys must be enumerable so the store can
/// sweep and invalidate by prefix.
#[async_trait]
pub trait KeyValueMedium: Send + Sync + 'static {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`
    ///
    /// Returns `true` if the key existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Every key currently stored
    async fn keys(&self) -> Result<Vec<String>>;

    /// Number of stored keys
    async fn len(&self) -> Result<usize> {
        Ok(self.keys().await?.len())
    }

    /// Check if the medium is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
