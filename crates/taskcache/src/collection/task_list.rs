use std::sync::Arc;

use taskcache_core::{
    CacheMetrics, JsonSerializer, KeyValueMedium, NoopMetrics, Page, Serializer, TaskList,
};

use super::CollectionService;
use crate::broadcast::CollectionSubscriber;
use crate::error::{SyncError, SyncResult};

/// Task list collection
///
/// Lists embed their tasks, so task writes invalidate cached lists too.
pub struct TaskListService<M, S = JsonSerializer, Mt = NoopMetrics>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    inner: Arc<CollectionService<TaskList, M, S, Mt>>,
}

impl<M, S, Mt> TaskListService<M, S, Mt>
where
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    pub fn new(service: CollectionService<TaskList, M, S, Mt>) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    pub fn service(&self) -> &Arc<CollectionService<TaskList, M, S, Mt>> {
        &self.inner
    }

    /// Read the current page of lists
    pub async fn load(&self) -> SyncResult<Page<TaskList>> {
        self.inner.fetch_current().await
    }

    pub async fn detail(&self, id: u64) -> SyncResult<TaskList> {
        self.inner.fetch_one(id).await
    }

    pub async fn create(&self, list: &TaskList) -> SyncResult<TaskList> {
        self.inner.create(list).await
    }

    /// Rename or re-describe a saved list; its tasks are not sent
    pub async fn update(&self, list: &TaskList) -> SyncResult<TaskList> {
        let id = list.id.ok_or(SyncError::MissingId("task list"))?;
        self.inner.update(id, list).await
    }

    pub async fn delete(&self, id: u64) -> SyncResult<()> {
        self.inner.delete(id).await
    }

    /// Drop every cached list page and detail
    pub async fn clear_cache(&self) -> u64 {
        self.inner.invalidate().await
    }

    /// Notified whenever the published lists change
    pub fn list_updates(&self) -> CollectionSubscriber<TaskList> {
        self.inner.subscribe()
    }
}

impl<M, S, Mt> Clone for TaskListService<M, S, Mt>
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
