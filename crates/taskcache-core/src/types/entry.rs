//! Cache entry type

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A cached value with the metadata needed to decide its freshness
///
/// The timestamp is absolute, so an entry written to a durable medium keeps
/// its expiry across process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When the entry was written
    pub stored_at: SystemTime,
    /// Time-to-live
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Create an entry stored at `stored_at`
    pub fn new(value: T, stored_at: SystemTime, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Age of the entry at `now`. Zero if the clock went backwards.
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.stored_at).unwrap_or_default()
    }

    /// An entry older than its TTL is logically absent
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.age_at(now) > self.ttl
    }

    /// Remaining lifetime at `now`
    pub fn ttl_remaining_at(&self, now: SystemTime) -> Option<Duration> {
        self.ttl.checked_sub(self.age_at(now))
    }

    /// Map the value, keeping the metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            stored_at: self.stored_at,
            ttl: self.ttl,
        }
    }
}
