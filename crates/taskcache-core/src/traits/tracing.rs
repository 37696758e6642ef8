use crate::{CacheMetrics, CacheOperation, EvictionReason};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Metrics adapter that logs events via `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingMetrics {
    /// Service name/prefix (optional)
    service_name: Option<String>,
}

impl TracingMetrics {
    /// Create new tracing metrics adapter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with service name prefix
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }
}

impl CacheMetrics for TracingMetrics {
    fn record_hit(&self, key: &str) {
        debug!(
            target: "taskcache",
            event = "hit",
            key = %key,
            service = ?self.service_name,
            "Cache Hit"
        );
    }

    fn record_miss(&self, key: &str) {
        debug!(
            target: "taskcache",
            event = "miss",
            key = %key,
            service = ?self.service_name,
            "Cache Miss"
        );
    }

    fn record_latency(&self, operation: CacheOperation, duration: Duration) {
        trace!(
            target: "taskcache",
            event = "latency",
            operation = operation.as_str(),
            duration_us = duration.as_micros() as u64,
            service = ?self.service_name,
            "Cache Operation Latency"
        );
    }

    fn record_eviction(&self, reason: EvictionReason, count: u64) {
        debug!(
            target: "taskcache",
            event = "eviction",
            reason = reason.as_str(),
            count,
            service = ?self.service_name,
            "Cache Eviction"
        );
    }

    fn record_dropped_write(&self, key: &str) {
        warn!(
            target: "taskcache",
            event = "dropped_write",
            key = %key,
            service = ?self.service_name,
            "Cache Write Dropped"
        );
    }
}
