//! taskcache: cache-first collection sync for a to-do REST backend
//!
//! # Features
//!
//! - **TTL cache** over a pluggable key-value medium, with lazy expiry and a
//!   periodic sweep
//! - **Prefix invalidation** on every successful write
//! - **Request coalescing** and **latest-wins** response ordering
//! - **Pagination state** shared with every subscriber
//! - **Debounced search and filter streams**
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskcache::prelude::*;
//!
//! # async fn run(transport: Arc<dyn Transport>) -> SyncResult<()> {
//! let store = CacheStore::new(MemoryMedium::with_defaults());
//! let tasks = TaskService::new(CollectionService::new(store.clone(), transport.clone()));
//! let lists = TaskListService::new(CollectionService::new(store, transport));
//!
//! let mut sidebar = lists.list_updates();
//! tasks.list_by_list(3).await?;
//! tasks.create(&Task::new("Buy milk").in_list(3)).await?;
//!
//! // The task write also invalidated every cached list page
//! lists.load().await?;
//! println!("{} lists", sidebar.current().items.len());
//! # Ok(())
//! # }
//! ```

mod broadcast;
mod coalescer;
mod collection;
mod config;
mod error;
mod pagination;
mod sequencer;
mod store;
mod stream;

// Re-export core
pub use taskcache_core::*;

// Re-export storage
#[cfg(feature = "memory")]
pub use taskcache_storage::{MemoryConfig, MemoryMedium};

pub use broadcast::{CollectionChannel, CollectionSubscriber, Snapshot};
pub use coalescer::Coalescer;
pub use collection::{CollectionService, TaskListService, TaskService};
pub use config::{CollectionConfig, StoreConfig, StreamConfig};
pub use error::{SyncError, SyncResult};
pub use pagination::{PaginationCoordinator, PaginationState};
pub use sequencer::{RequestSequencer, Ticket};
pub use store::{CacheStore, SweepHandle};
pub use stream::{Debouncer, StreamCoordinator};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CacheError, CacheOpts, CacheResult, CacheStore, CollectionConfig, CollectionService,
        FilterCriteria, JsonSerializer, KeyBuilder, ListQuery, Page, PaginationCoordinator,
        Priority, Resource, StoreConfig, StreamConfig, StreamCoordinator, SyncError, SyncResult,
        Task, TaskList, TaskListService, TaskService, Transport,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryConfig, MemoryMedium};
}
