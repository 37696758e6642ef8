//! TTL cache store over a key-value medium

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, trace, warn};

use taskcache_core::{
    CacheEntry, CacheMetrics, CacheOperation, CacheOptions, CacheResult, CacheStats, Clock,
    EvictionReason, JsonSerializer, KeyValueMedium, NoopMetrics, Result, Serializer, SystemClock,
};

use crate::config::StoreConfig;

mod sweeper;
pub use sweeper::SweepHandle;

/// Outcome of loading one stored entry
enum Loaded<T> {
    Fresh(CacheEntry<T>),
    Expired,
    Corrupt,
    Absent,
}

/// Keyed storage with per-entry TTL
///
/// Expiry is lazy: a read of an entry older than its TTL removes it and
/// reports a miss. [`sweep_expired`](Self::sweep_expired) removes such
/// entries proactively. Writes are best-effort; a full medium is swept once
/// and the write retried, after which it is dropped.
///
/// Generic over:
/// - `M`: The key-value medium
/// - `S`: The serializer
/// - `Mt`: The metrics collector
pub struct CacheStore<M, S = JsonSerializer, Mt = NoopMetrics>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    medium: Arc<M>,
    serializer: Arc<S>,
    metrics: Arc<Mt>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    counters: Arc<Mutex<CacheStats>>,
    epoch: Arc<AtomicU64>,
}

// Constructors for default serializer/metrics
impl<M: KeyValueMedium> CacheStore<M, JsonSerializer, NoopMetrics> {
    /// Create a store with JSON serialization and no metrics
    pub fn new(medium: M) -> Self {
        Self::with_config(medium, StoreConfig::default())
    }

    /// Create with custom config
    pub fn with_config(medium: M, config: StoreConfig) -> Self {
        Self::with_serializer_and_metrics(medium, JsonSerializer, NoopMetrics, config)
    }
}

impl<M, S, Mt> CacheStore<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    /// Create a store with custom serializer and metrics
    pub fn with_serializer_and_metrics(medium: M, serializer: S, metrics: Mt, config: StoreConfig) -> Self {
        Self {
            medium: Arc::new(medium),
            serializer: Arc::new(serializer),
            metrics: Arc::new(metrics),
            clock: Arc::new(SystemClock),
            config,
            counters: Arc::new(Mutex::new(CacheStats::default())),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the clock used to stamp and expire entries
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Invalidation epoch; advanced by every prefix delete and clear
    ///
    /// A reader that captured the epoch before fetching should not store
    /// its result if the epoch has moved since.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn namespace(&self) -> &str {
        self.config.namespace.as_deref().unwrap_or("")
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace(), key)
    }

    /// Keys of the medium that belong to this store
    async fn owned_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let full_prefix = self.full_key(prefix);
        let mut keys = self.medium.keys().await?;
        keys.retain(|key| key.starts_with(&full_prefix));
        Ok(keys)
    }

    /// Read and classify one stored entry, purging it if expired or unreadable
    async fn load<T: DeserializeOwned>(&self, full_key: &str) -> Result<Loaded<T>> {
        let Some(text) = self.medium.get(full_key).await? else {
            return Ok(Loaded::Absent);
        };

        match self.serializer.deserialize::<CacheEntry<T>>(&text) {
            Ok(entry) if entry.is_expired_at(self.clock.now()) => {
                self.medium.remove(full_key).await?;
                self.counters.lock().expirations += 1;
                self.metrics.record_eviction(EvictionReason::Expired, 1);
                trace!(target: "taskcache", key = full_key, "entry expired");
                Ok(Loaded::Expired)
            }
            Ok(entry) => Ok(Loaded::Fresh(entry)),
            Err(err) => {
                warn!(target: "taskcache", key = full_key, error = %err, "purging unreadable cache entry");
                self.medium.remove(full_key).await?;
                self.metrics.record_eviction(EvictionReason::Corrupt, 1);
                Ok(Loaded::Corrupt)
            }
        }
    }

    /// Get a value; expired and unreadable entries are removed and missed
    pub async fn get<T>(&self, key: &str) -> Result<CacheResult<T>>
    where
        T: DeserializeOwned,
    {
        let full_key = self.full_key(key);
        let start = Instant::now();

        let result = match self.load::<T>(&full_key).await? {
            Loaded::Fresh(entry) => {
                self.counters.lock().hits += 1;
                self.metrics.record_hit(&full_key);
                CacheResult::Hit(entry)
            }
            Loaded::Expired | Loaded::Corrupt | Loaded::Absent => {
                self.counters.lock().misses += 1;
                self.metrics.record_miss(&full_key);
                CacheResult::Miss
            }
        };

        self.metrics.record_latency(CacheOperation::Get, start.elapsed());
        Ok(result)
    }

    /// Store a value
    ///
    /// Returns `Ok(false)` when the medium stayed full after a sweep and the
    /// write was dropped.
    pub async fn set<T>(&self, key: &str, value: &T, options: impl Into<CacheOptions>) -> Result<bool>
    where
        T: Serialize,
    {
        let full_key = self.full_key(key);
        let ttl = options.into().ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        let text = self.serializer.serialize(&entry)?;
        let start = Instant::now();

        let stored = match self.medium.set(&full_key, text.clone()).await {
            Ok(()) => true,
            Err(err) if err.is_capacity() => {
                let swept = self.sweep_expired().await?;
                debug!(target: "taskcache", key = %full_key, swept, "medium full, retrying after sweep");
                match self.medium.set(&full_key, text).await {
                    Ok(()) => true,
                    Err(err) if err.is_capacity() => false,
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        if stored {
            self.counters.lock().writes += 1;
        } else {
            self.counters.lock().dropped_writes += 1;
            self.metrics.record_dropped_write(&full_key);
            warn!(target: "taskcache", key = %full_key, "medium full, cache write dropped");
        }

        self.metrics.record_latency(CacheOperation::Set, start.elapsed());
        Ok(stored)
    }

    /// Whether a fresh entry exists
    pub async fn has(&self, key: &str) -> Result<bool> {
        let full_key = self.full_key(key);
        Ok(matches!(self.load::<IgnoredAny>(&full_key).await?, Loaded::Fresh(_)))
    }

    /// Delete one entry
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let full_key = self.full_key(key);
        let start = Instant::now();
        let removed = self.medium.remove(&full_key).await?;
        if removed {
            self.counters.lock().deletes += 1;
        }
        self.metrics.record_latency(CacheOperation::Delete, start.elapsed());
        Ok(removed)
    }

    /// Delete every entry whose key starts with `prefix`
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<u64> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let start = Instant::now();
        let mut removed = 0;
        for key in self.owned_keys(prefix).await? {
            if self.medium.remove(&key).await? {
                removed += 1;
            }
        }

        self.counters.lock().deletes += removed;
        self.metrics.record_eviction(EvictionReason::Invalidated, removed);
        self.metrics.record_latency(CacheOperation::Invalidate, start.elapsed());
        debug!(target: "taskcache", prefix, removed, "invalidated prefix");
        Ok(removed)
    }

    /// Delete every entry of this store
    ///
    /// Keys outside the namespace are left alone.
    pub async fn clear(&self) -> Result<u64> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut removed = 0;
        for key in self.owned_keys("").await? {
            if self.medium.remove(&key).await? {
                removed += 1;
            }
        }

        self.counters.lock().deletes += removed;
        self.metrics.record_eviction(EvictionReason::Cleared, removed);
        Ok(removed)
    }

    /// Remove expired and unreadable entries; fresh entries are untouched
    pub async fn sweep_expired(&self) -> Result<u64> {
        let start = Instant::now();
        let mut removed = 0;
        for key in self.owned_keys("").await? {
            if matches!(
                self.load::<IgnoredAny>(&key).await?,
                Loaded::Expired | Loaded::Corrupt
            ) {
                removed += 1;
            }
        }

        self.metrics.record_latency(CacheOperation::Sweep, start.elapsed());
        if removed > 0 {
            debug!(target: "taskcache", removed, "swept cache");
        }
        Ok(removed)
    }

    /// Number of stored entries, expired ones included until swept
    pub async fn len(&self) -> Result<usize> {
        Ok(self.owned_keys("").await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Approximate bytes held by this store's entries, keys included
    pub async fn size_bytes(&self) -> Result<usize> {
        let mut bytes = 0;
        for key in self.owned_keys("").await? {
            if let Some(text) = self.medium.get(&key).await? {
                bytes += key.len() + text.len();
            }
        }
        Ok(bytes)
    }

    /// Snapshot of counters plus current size
    pub async fn stats(&self) -> Result<CacheStats> {
        let size = self.len().await?;
        let bytes = self.size_bytes().await?;
        let mut stats = self.counters.lock().clone();
        stats.size = size;
        stats.bytes = bytes;
        Ok(stats)
    }
}

impl<M, S, Mt> Clone for CacheStore<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            medium: self.medium.clone(),
            serializer: self.serializer.clone(),
            metrics: self.metrics.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
            counters: self.counters.clone(),
            epoch: self.epoch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taskcache_core::{CacheOpts, ManualClock};
    use taskcache_storage::{MemoryConfig, MemoryMedium};

    fn store_with_clock() -> (CacheStore<MemoryMedium>, ManualClock, MemoryMedium) {
        let medium = MemoryMedium::with_defaults();
        let clock = ManualClock::default();
        let store = CacheStore::new(medium.clone()).with_clock(clock.clone());
        (store, clock, medium)
    }

    #[tokio::test]
    async fn test_hit_then_expiry() {
        let (store, clock, medium) = store_with_clock();

        store.set("tasks:a", &42u32, CacheOpts::new().ttl_millis(100)).await.unwrap();
        assert_eq!(store.get::<u32>("tasks:a").await.unwrap().value(), Some(42));

        clock.advance(Duration::from_millis(150));
        assert!(store.get::<u32>("tasks:a").await.unwrap().is_miss());

        // Lazy expiry removed the entry from the medium
        assert!(medium.is_empty().await.unwrap());
        assert_eq!(store.stats().await.unwrap().expirations, 1);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let (store, clock, _) = store_with_clock();
        store.set("k", &1u8, CacheOpts::new()).await.unwrap();

        clock.advance(Duration::from_secs(4 * 60));
        assert!(store.has("k").await.unwrap());
        clock.advance(Duration::from_secs(2 * 60));
        assert!(!store.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let (store, _, medium) = store_with_clock();
        store.set("tasks:a", &1u8, CacheOpts::new()).await.unwrap();

        let keys = medium.keys().await.unwrap();
        assert_eq!(keys, vec!["todolist_tasks:a".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_by_prefix() {
        let (store, _, _) = store_with_clock();
        store.set("tasks:1", &1u8, CacheOpts::new()).await.unwrap();
        store.set("tasks:2", &2u8, CacheOpts::new()).await.unwrap();
        store.set("task_lists:1", &3u8, CacheOpts::new()).await.unwrap();

        let epoch = store.epoch();
        assert_eq!(store.delete_by_prefix("tasks:").await.unwrap(), 2);
        assert!(store.epoch() > epoch);
        assert!(!store.has("tasks:1").await.unwrap());
        assert!(!store.has("tasks:2").await.unwrap());
        assert!(store.has("task_lists:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_single() {
        let (store, _, _) = store_with_clock();
        store.set("k", &1u8, CacheOpts::new()).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_only_touches_namespace() {
        let (store, _, medium) = store_with_clock();
        medium.set("session_token", "abc".to_string()).await.unwrap();
        store.set("tasks:1", &1u8, CacheOpts::new()).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 1);
        assert_eq!(medium.get("session_token").await.unwrap().as_deref(), Some("abc"));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_entries() {
        let (store, clock, _) = store_with_clock();
        store.set("short", &1u8, CacheOpts::new().ttl_millis(100)).await.unwrap();
        store.set("long", &2u8, CacheOpts::new().ttl_secs(60)).await.unwrap();

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(store.get::<u8>("long").await.unwrap().value(), Some(2));
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_purged_miss() {
        let (store, _, medium) = store_with_clock();
        medium.set("todolist_tasks:x", "{broken".to_string()).await.unwrap();

        assert!(store.get::<u8>("tasks:x").await.unwrap().is_miss());
        assert!(medium.get("todolist_tasks:x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_incompatible_entry_is_purged_miss() {
        let (store, _, medium) = store_with_clock();
        store.set("k", &"text", CacheOpts::new()).await.unwrap();

        assert!(store.get::<u64>("k").await.unwrap().is_miss());
        assert!(medium.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_purges_unreadable_entries() {
        let (store, _, medium) = store_with_clock();
        medium.set("todolist_junk", "???".to_string()).await.unwrap();
        store.set("ok", &1u8, CacheOpts::new()).await.unwrap();

        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert!(store.has("ok").await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_retry_after_sweep() {
        let medium = MemoryMedium::new(MemoryConfig::with_max_bytes(200));
        let clock = ManualClock::default();
        let store = CacheStore::new(medium).with_clock(clock.clone());

        let payload = "x".repeat(60);
        store.set("old", &payload, CacheOpts::new().ttl_millis(10)).await.unwrap();
        clock.advance(Duration::from_millis(50));

        // Only fits once the expired entry is swept
        assert!(store.set("new", &payload, CacheOpts::new()).await.unwrap());
        assert!(store.has("new").await.unwrap());
        assert!(!store.has("old").await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_drop_is_non_fatal() {
        let medium = MemoryMedium::new(MemoryConfig::with_max_bytes(300));
        let store = CacheStore::new(medium);

        let payload = "x".repeat(60);
        assert!(store.set("a", &payload, CacheOpts::new()).await.unwrap());
        assert!(!store.set("b", &payload, CacheOpts::new()).await.unwrap());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.dropped_writes, 1);
        assert_eq!(stats.writes, 1);
        assert!(store.has("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_stats_counts_hits_and_misses() {
        let (store, _, _) = store_with_clock();
        store.set("k", &1u8, CacheOpts::new()).await.unwrap();
        store.get::<u8>("k").await.unwrap();
        store.get::<u8>("nope").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!(stats.bytes > 0);
        assert_eq!(stats.hit_ratio(), 0.5);
    }
}
