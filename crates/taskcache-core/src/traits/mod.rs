//! Core traits for cache operations and external collaborators

mod clock;
mod medium;
mod metrics;
mod resource;
mod serializer;
mod transport;

#[cfg(feature = "tracing")]
mod tracing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use medium::KeyValueMedium;
pub use metrics::{CacheMetrics, CacheOperation, EvictionReason, NoopMetrics};
pub use resource::Resource;
pub use serializer::{JsonSerializer, Serializer};
pub use transport::{
    Method, NoopNotifier, NoticeKind, Notifier, Request, StaticToken, TokenProvider, Transport,
};

#[cfg(feature = "metrics")]
pub use metrics::MetricsCrateAdapter;

#[cfg(feature = "tracing")]
pub use self::tracing::TracingMetrics;
