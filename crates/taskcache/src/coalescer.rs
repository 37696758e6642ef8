//! In-flight request coalescing

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::{SyncError, SyncResult};

/// Joins concurrent requests for the same key onto one in-flight call
#[derive(Clone)]
pub struct Coalescer<V> {
    // Map key -> sender of the leader's result
    inflight: Arc<DashMap<String, broadcast::Sender<SyncResult<V>>>>,
}

/// Removes the leader's map entry even if the leader is dropped mid-call
struct InflightGuard<'a, V> {
    inflight: &'a DashMap<String, broadcast::Sender<SyncResult<V>>>,
    key: &'a str,
}

impl<V> Drop for InflightGuard<'_, V> {
    fn drop(&mut self) {
        self.inflight.remove(self.key);
    }
}

impl<V: Clone + Send + 'static> Coalescer<V> {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Run `f` unless a call for `key` is already in flight, in which case
    /// wait for that call's result instead
    pub async fn run<F, Fut>(&self, key: &str, f: F) -> SyncResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SyncResult<V>>,
    {
        // The entry lock must be released before awaiting
        let joined = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(leader) => Ok(leader.get().subscribe()),
            Entry::Vacant(slot) => {
                let (tx, _) = broadcast::channel(1);
                slot.insert(tx.clone());
                Err(tx)
            }
        };

        match joined {
            Ok(mut rx) => {
                trace!(target: "taskcache", key, "joined in-flight request");
                rx.recv()
                    .await
                    .unwrap_or_else(|_| Err(SyncError::Abandoned(key.to_string())))
            }
            Err(tx) => {
                let guard = InflightGuard {
                    inflight: &self.inflight,
                    key,
                };
                let result = f().await;
                drop(guard);

                if tx.receiver_count() > 0 {
                    let _ = tx.send(result.clone());
                }
                result
            }
        }
    }

    /// Number of keys with a call in flight
    pub fn inflight_count(&self) -> usize {
        self.inflight.len()
    }
}

impl<V: Clone + Send + 'static> Default for Coalescer<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use taskcache_core::TransportError;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_call() {
        let coalescer = Coalescer::<u32>::new();
        let calls = &AtomicUsize::new(0);

        let work = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(100)).await;
            Ok(7)
        };

        let (a, b, c) = tokio::join!(
            coalescer.run("tasks:page", work),
            coalescer.run("tasks:page", work),
            coalescer.run("tasks:page", work),
        );

        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (7, 7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coalescer.inflight_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_separately() {
        let coalescer = Coalescer::<u32>::new();
        let calls = &AtomicUsize::new(0);
        let work = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(10)).await;
            Ok(1)
        };

        let _ = tokio::join!(coalescer.run("a", work), coalescer.run("b", work));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_shared() {
        let coalescer = Coalescer::<u32>::new();
        let work = || async {
            sleep(Duration::from_millis(10)).await;
            Err(SyncError::Transport(TransportError::Timeout))
        };

        let (a, b) = tokio::join!(coalescer.run("k", work), coalescer.run("k", work));
        assert_eq!(a, Err(SyncError::Transport(TransportError::Timeout)));
        assert_eq!(b, a);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_leader_releases_key() {
        let coalescer = Coalescer::<u32>::new();

        let mut leader = Box::pin(coalescer.run("k", || async {
            sleep(Duration::from_secs(10)).await;
            Ok(1)
        }));
        let mut follower = Box::pin(coalescer.run("k", || async { Ok(2) }));

        // Poll both once so the leader registers and the follower joins
        tokio::select! {
            biased;
            _ = &mut leader => unreachable!(),
            _ = &mut follower => unreachable!(),
            _ = sleep(Duration::from_millis(1)) => {}
        }
        assert_eq!(coalescer.inflight_count(), 1);

        drop(leader);
        assert_eq!(follower.await, Err(SyncError::Abandoned("k".to_string())));
        assert_eq!(coalescer.inflight_count(), 0);
    }
}
