//! Cache write options and builder

use std::time::Duration;

/// Options for a single cache write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheOptions {
    /// Time-to-live; the store default applies when absent
    pub ttl: Option<Duration>,
}

/// Builder for CacheOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct CacheOpts(CacheOptions);

impl CacheOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set TTL
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.0.ttl = Some(duration);
        self
    }

    /// Set TTL in milliseconds
    pub fn ttl_millis(self, millis: u64) -> Self {
        self.ttl(Duration::from_millis(millis))
    }

    /// Set TTL in seconds
    pub fn ttl_secs(self, seconds: u64) -> Self {
        self.ttl(Duration::from_secs(seconds))
    }

    /// Set TTL in minutes
    pub fn ttl_mins(self, minutes: u64) -> Self {
        self.ttl(Duration::from_secs(minutes * 60))
    }

    /// Build the options
    pub fn build(self) -> CacheOptions {
        self.0
    }
}

impl From<CacheOpts> for CacheOptions {
    fn from(opts: CacheOpts) -> Self {
        opts.0
    }
}

impl From<Duration> for CacheOptions {
    fn from(ttl: Duration) -> Self {
        CacheOptions { ttl: Some(ttl) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        assert!(CacheOpts::new().build().ttl.is_none());
    }

    #[test]
    fn test_builder_units() {
        assert_eq!(CacheOpts::new().ttl_mins(2).build().ttl, Some(Duration::from_secs(120)));
        assert_eq!(CacheOpts::new().ttl_millis(100).build().ttl, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_from_duration() {
        let opts: CacheOptions = Duration::from_secs(300).into();
        assert_eq!(opts.ttl, Some(Duration::from_secs(300)));
    }
}
