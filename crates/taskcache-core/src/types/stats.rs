//! Cache statistics

/// Statistics for cache store operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses (absent, expired or unreadable)
    pub misses: u64,
    /// Number of successful writes
    pub writes: u64,
    /// Number of entries removed by delete, prefix invalidation or clear
    pub deletes: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Writes dropped because the medium stayed full after a sweep
    pub dropped_writes: u64,
    /// Current number of entries
    pub size: usize,
    /// Approximate storage usage in bytes
    pub bytes: usize,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total lookups (hits + misses)
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}
