//! In-memory key-value medium

mod backend;

pub use backend::{MemoryConfig, MemoryMedium};
