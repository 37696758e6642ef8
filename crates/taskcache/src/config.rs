//! Configuration for the store, collection services and input streams

use std::time::Duration;

/// Configuration for [`CacheStore`](crate::CacheStore)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Prefix added to every stored key; `clear` only touches these keys
    pub namespace: Option<String>,
    /// TTL for writes that do not carry one
    pub default_ttl: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: Some("todolist_".to_string()),
            default_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl StoreConfig {
    /// Create config with a specific default TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            default_ttl: ttl,
            ..Default::default()
        }
    }

    /// Create config with a namespace
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Store keys without a namespace
    pub fn no_namespace(mut self) -> Self {
        self.namespace = None;
        self
    }
}

/// Configuration for a [`CollectionService`](crate::CollectionService)
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// TTL of cached pages
    pub ttl: Duration,
    /// Initial page size
    pub page_size: u64,
    /// TTL jitter fraction (0.0 - 1.0); spreads expiry of pages cached together
    pub ttl_jitter: f64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(2 * 60),
            page_size: 20,
            ttl_jitter: 0.0,
        }
    }
}

impl CollectionConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }

    pub fn page_size(mut self, size: u64) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn jitter(mut self, fraction: f64) -> Self {
        self.ttl_jitter = fraction.clamp(0.0, 1.0);
        self
    }
}

/// Configuration for a [`StreamCoordinator`](crate::StreamCoordinator)
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Quiet period of the search channel
    pub search_quiet: Duration,
    /// Quiet period of the filter channel
    pub filter_quiet: Duration,
    /// Buffered emissions per subscriber
    pub capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            search_quiet: Duration::from_millis(300),
            filter_quiet: Duration::from_millis(500),
            capacity: 16,
        }
    }
}
