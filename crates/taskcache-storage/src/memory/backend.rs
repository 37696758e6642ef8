//! In-memory key-value medium using DashMap

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use taskcache_core::{CacheError, KeyValueMedium, Result};

/// Configuration for the memory medium
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum stored bytes, keys included (0 = unlimited)
    pub max_bytes: usize,
    /// Maximum number of keys (0 = unlimited)
    pub max_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_entries: 0,
        }
    }
}

impl MemoryConfig {
    /// Create config with a byte quota
    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }

    /// Create config with an entry quota
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Default::default()
        }
    }

    /// Create config with unlimited capacity
    pub fn unlimited() -> Self {
        Self {
            max_bytes: 0,
            max_entries: 0,
        }
    }
}

/// In-process, session-scoped key-value medium with a bounded quota
///
/// Writes that would exceed the quota fail with
/// [`CacheError::CapacityExceeded`] and leave the medium untouched.
/// Cloning creates a new handle to the SAME underlying store.
#[derive(Clone)]
pub struct MemoryMedium {
    /// Main data store
    data: Arc<DashMap<String, String>>,
    /// Bytes currently stored; the lock also serializes quota checks
    used_bytes: Arc<Mutex<usize>>,
    /// Configuration
    config: MemoryConfig,
}

impl MemoryMedium {
    /// Create a new memory medium
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            used_bytes: Arc::new(Mutex::new(0)),
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Bytes currently stored
    pub fn used_bytes(&self) -> usize {
        *self.used_bytes.lock()
    }

    fn footprint(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl KeyValueMedium for MemoryMedium {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut used = self.used_bytes.lock();

        let previous = self
            .data
            .get(key)
            .map(|old| Self::footprint(key, &old));
        let incoming = Self::footprint(key, &value);
        let projected = *used - previous.unwrap_or(0) + incoming;

        if self.config.max_bytes > 0 && projected > self.config.max_bytes {
            trace!(target: "taskcache", key, projected, "memory medium over byte quota");
            return Err(CacheError::CapacityExceeded);
        }
        if self.config.max_entries > 0
            && previous.is_none()
            && self.data.len() >= self.config.max_entries
        {
            trace!(target: "taskcache", key, "memory medium over entry quota");
            return Err(CacheError::CapacityExceeded);
        }

        self.data.insert(key.to_string(), value);
        *used = projected;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut used = self.used_bytes.lock();
        match self.data.remove(key) {
            Some((key, value)) => {
                *used -= Self::footprint(&key, &value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.data.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_basic_get_set() {
        let medium = MemoryMedium::with_defaults();

        assert_ok!(medium.set("todolist_a", "1".to_string()).await);
        assert_eq!(medium.get("todolist_a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(medium.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove() {
        let medium = MemoryMedium::with_defaults();
        medium.set("k", "value".to_string()).await.unwrap();

        assert!(medium.remove("k").await.unwrap());
        assert!(!medium.remove("k").await.unwrap());
        assert!(medium.is_empty().await.unwrap());
        assert_eq!(medium.used_bytes(), 0);
    }

    #[tokio::test]
    async fn test_keys_are_enumerable() {
        let medium = MemoryMedium::with_defaults();
        medium.set("a", "1".to_string()).await.unwrap();
        medium.set("b", "2".to_string()).await.unwrap();

        let mut keys = medium.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_byte_quota() {
        let medium = MemoryMedium::new(MemoryConfig::with_max_bytes(10));

        assert_ok!(medium.set("k", "12345".to_string()).await);
        let err = assert_err!(medium.set("j", "12345".to_string()).await);
        assert!(err.is_capacity());

        // The rejected write left nothing behind.
        assert_eq!(medium.len().await.unwrap(), 1);
        assert_eq!(medium.used_bytes(), 6);
    }

    #[tokio::test]
    async fn test_overwrite_counts_replaced_bytes() {
        let medium = MemoryMedium::new(MemoryConfig::with_max_bytes(10));

        medium.set("k", "123456789".to_string()).await.unwrap();
        assert_ok!(medium.set("k", "12345678".to_string()).await);
        assert_eq!(medium.used_bytes(), 9);
    }

    #[tokio::test]
    async fn test_entry_quota() {
        let medium = MemoryMedium::new(MemoryConfig::with_max_entries(1));

        medium.set("a", "1".to_string()).await.unwrap();
        assert_ok!(medium.set("a", "2".to_string()).await);
        assert_err!(medium.set("b", "1".to_string()).await);
    }

    #[tokio::test]
    async fn test_clone_shares_store() {
        let medium = MemoryMedium::with_defaults();
        let handle = medium.clone();
        medium.set("a", "1".to_string()).await.unwrap();
        assert_eq!(handle.len().await.unwrap(), 1);
    }
}
