//! Cache result type

use super::entry::CacheEntry;

/// Result of a cache lookup operation
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    /// Fresh cache hit
    Hit(CacheEntry<T>),
    /// Absent, expired, or unreadable
    Miss,
}

impl<T> CacheResult<T> {
    /// Check if this is a hit
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheResult::Hit(_))
    }

    /// Check if this is a miss
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheResult::Miss)
    }

    /// Extract the value, consuming the result
    pub fn value(self) -> Option<T> {
        match self {
            CacheResult::Hit(entry) => Some(entry.value),
            CacheResult::Miss => None,
        }
    }

    /// Extract the full entry, consuming the result
    pub fn entry(self) -> Option<CacheEntry<T>> {
        match self {
            CacheResult::Hit(entry) => Some(entry),
            CacheResult::Miss => None,
        }
    }

    /// Map the value if present
    pub fn map<U, F>(self, f: F) -> CacheResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            CacheResult::Hit(entry) => CacheResult::Hit(entry.map(f)),
            CacheResult::Miss => CacheResult::Miss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn hit(value: i32) -> CacheResult<i32> {
        CacheResult::Hit(CacheEntry::new(value, SystemTime::now(), Duration::from_secs(60)))
    }

    #[test]
    fn test_hit() {
        let result = hit(42);
        assert!(result.is_hit());
        assert!(!result.is_miss());
        assert_eq!(result.value(), Some(42));
    }

    #[test]
    fn test_miss() {
        let result: CacheResult<i32> = CacheResult::Miss;
        assert!(result.is_miss());
        assert!(result.entry().is_none());
    }

    #[test]
    fn test_map() {
        assert_eq!(hit(42).map(|v| v * 2).value(), Some(84));
    }
}
