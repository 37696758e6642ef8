//! taskcache-storage: Key-value media for taskcache

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryConfig, MemoryMedium};
