//! Core types for cache operations and the task domain

mod entry;
mod filter;
mod options;
mod page;
mod result;
mod stats;
mod task;

pub use entry::CacheEntry;
pub use filter::{DateFilter, FilterCriteria, ListQuery, StatusFilter};
pub use options::{CacheOptions, CacheOpts};
pub use page::{Page, PagePayload};
pub use result::CacheResult;
pub use stats::CacheStats;
pub use task::{Priority, Task, TaskList};
