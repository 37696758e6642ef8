use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use taskcache_core::{CacheMetrics, KeyValueMedium, Serializer};

use super::CacheStore;
use crate::config::StoreConfig;

/// Handle to a periodic sweep task; the sweep stops when the handle drops
#[derive(Debug)]
pub struct SweepHandle {
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Stop sweeping
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<M, S, Mt> CacheStore<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    /// Run [`sweep_expired`](Self::sweep_expired) every `interval`
    ///
    /// A zero `interval` falls back to the default sweep interval. Must be
    /// called from within a Tokio runtime.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweepHandle {
        let interval = if interval.is_zero() {
            let fallback = StoreConfig::default().sweep_interval;
            warn!(target: "taskcache", ?fallback, "zero sweep interval, using default");
            fallback
        } else {
            interval
        };
        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = store.sweep_expired().await {
                    warn!(target: "taskcache", error = %err, "periodic sweep failed");
                }
            }
        });
        SweepHandle { task }
    }

    /// Start the sweeper at the configured interval
    pub fn spawn_default_sweeper(&self) -> SweepHandle {
        self.spawn_sweeper(self.config.sweep_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcache_core::{CacheOpts, ManualClock};
    use taskcache_storage::MemoryMedium;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_entries() {
        let clock = ManualClock::default();
        let store = CacheStore::with_config(MemoryMedium::with_defaults(), StoreConfig::default())
            .with_clock(clock.clone());
        store.set("k", &1u8, CacheOpts::new().ttl_millis(10)).await.unwrap();
        clock.advance(Duration::from_secs(1));

        let handle = store.spawn_sweeper(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(store.len().await.unwrap(), 0);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_uses_default() {
        let clock = ManualClock::default();
        let store = CacheStore::new(MemoryMedium::with_defaults()).with_clock(clock.clone());
        store.set("k", &1u8, CacheOpts::new().ttl_millis(10)).await.unwrap();
        clock.advance(Duration::from_secs(1));

        let handle = store.spawn_sweeper(Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(!handle.is_finished());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_sweeping() {
        let clock = ManualClock::default();
        let store = CacheStore::new(MemoryMedium::with_defaults()).with_clock(clock.clone());
        store.set("k", &1u8, CacheOpts::new().ttl_millis(10)).await.unwrap();
        clock.advance(Duration::from_secs(1));

        let handle = store.spawn_sweeper(Duration::from_secs(1));
        drop(handle);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Still stored: nothing swept it and nothing read it
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
