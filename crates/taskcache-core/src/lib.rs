//! taskcache-core: Core traits and types for the taskcache library
//!
//! This crate provides the data model, key construction and collaborator
//! traits shared by the storage and coordination crates.

mod error;
mod key;
mod traits;
mod types;

pub use error::{CacheError, Result, TransportError};
pub use key::{rolling_hash, KeyBuilder, KeyEncoding, KeyOrdering, QueryParams};
pub use traits::*;
pub use types::*;
