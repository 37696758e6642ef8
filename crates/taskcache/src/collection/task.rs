use std::sync::Arc;

use tokio::task::JoinHandle;

use taskcache_core::{
    CacheMetrics, FilterCriteria, JsonSerializer, KeyValueMedium, NoopMetrics, Page,
    Serializer, Task,
};

use super::CollectionService;
use crate::broadcast::CollectionSubscriber;
use crate::error::{SyncError, SyncResult};
use crate::pagination::PaginationCoordinator;
use crate::stream::StreamCoordinator;

/// Task collection: paged listing, per-list listing, search and filters
pub struct TaskService<M, S = JsonSerializer, Mt = NoopMetrics>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    inner: Arc<CollectionService<Task, M, S, Mt>>,
}

impl<M, S, Mt> TaskService<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    pub fn new(service: CollectionService<Task, M, S, Mt>) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    pub fn service(&self) -> &Arc<CollectionService<Task, M, S, Mt>> {
        &self.inner
    }

    pub fn pagination(&self) -> &PaginationCoordinator {
        self.inner.pagination()
    }

    pub fn subscribe(&self) -> CollectionSubscriber<Task> {
        self.inner.subscribe()
    }

    /// Read the current page under the current filter
    pub async fn load(&self) -> SyncResult<Page<Task>> {
        self.inner.fetch_current().await
    }

    /// Every task, first page
    pub async fn list_all(&self) -> SyncResult<Page<Task>> {
        self.inner.apply_filter(FilterCriteria::default()).await
    }

    /// Tasks of one list, first page
    pub async fn list_by_list(&self, list_id: u64) -> SyncResult<Page<Task>> {
        self.inner
            .apply_filter(FilterCriteria::new().list(list_id))
            .await
    }

    /// Free-text search on top of the current constraints; blank clears it
    pub async fn search(&self, term: &str) -> SyncResult<Page<Task>> {
        self.inner.apply_filter(self.inner.filter().search(term)).await
    }

    pub async fn filtered(&self, criteria: FilterCriteria) -> SyncResult<Page<Task>> {
        self.inner.apply_filter(criteria).await
    }

    pub async fn detail(&self, id: u64) -> SyncResult<Task> {
        self.inner.fetch_one(id).await
    }

    pub async fn create(&self, task: &Task) -> SyncResult<Task> {
        self.inner.create(task).await
    }

    /// Update a saved task
    pub async fn update(&self, task: &Task) -> SyncResult<Task> {
        let id = task.id.ok_or(SyncError::MissingId("task"))?;
        self.inner.update(id, task).await
    }

    /// Flip the completion flag of a saved task
    pub async fn toggle_completed(&self, task: &Task) -> SyncResult<Task> {
        let mut toggled = task.clone();
        toggled.completed = !task.completed;
        self.update(&toggled).await
    }

    pub async fn delete(&self, id: u64) -> SyncResult<()> {
        self.inner.delete(id).await
    }

    pub async fn go_to_page(&self, n: u64) -> SyncResult<Option<Page<Task>>> {
        self.inner.go_to_page(n).await
    }

    pub async fn next_page(&self) -> SyncResult<Option<Page<Task>>> {
        self.inner.next_page().await
    }

    pub async fn previous_page(&self) -> SyncResult<Option<Page<Task>>> {
        self.inner.previous_page().await
    }

    /// Re-search on every debounced search term
    pub fn follow_search(&self, streams: &StreamCoordinator) -> JoinHandle<()> {
        self.inner
            .follow(streams.search_stream(), |filter, term: String| filter.set_search(term))
    }

    /// Re-filter on every debounced filter change
    ///
    /// The incoming criteria replace the current ones; a running search is
    /// kept unless the criteria carry their own.
    pub fn follow_filter(&self, streams: &StreamCoordinator) -> JoinHandle<()> {
        self.inner
            .follow(streams.filter_stream(), |filter, criteria: FilterCriteria| {
                let search_term = filter.search_term.take();
                *filter = criteria;
                if filter.search_term.is_none() {
                    filter.search_term = search_term;
                }
            })
    }
}

impl<M, S, Mt> Clone for TaskService<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
