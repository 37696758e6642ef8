//! Cache-first collection service shared by the entity facades

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use taskcache_core::{
    CacheMetrics, CacheOpts, CacheResult, FilterCriteria, JsonSerializer, KeyBuilder,
    KeyValueMedium, ListQuery, Method, NoopMetrics, NoopNotifier, NoticeKind, Notifier, Page,
    PagePayload, QueryParams, Request, Resource, Serializer, TokenProvider, Transport,
};

use crate::broadcast::{CollectionChannel, CollectionSubscriber, Snapshot};
use crate::coalescer::Coalescer;
use crate::config::CollectionConfig;
use crate::error::{SyncError, SyncResult};
use crate::pagination::PaginationCoordinator;
use crate::sequencer::{RequestSequencer, Ticket};
use crate::store::CacheStore;

mod task;
mod task_list;

pub use task::TaskService;
pub use task_list::TaskListService;

/// Cache-first reads, write-through invalidation and a shared broadcast of
/// the current collection for one entity type
///
/// Reads consult the cache under a key derived from the entity prefix and
/// the query; misses go to the transport, concurrent misses for one key
/// share a single call, and only the most recently dispatched request may
/// publish. Successful writes invalidate every cached page of the entity
/// (and of the entities embedding it) before merging the saved entity into
/// the published collection.
pub struct CollectionService<E, M, S = JsonSerializer, Mt = NoopMetrics>
where
    E: Resource,
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    store: CacheStore<M, S, Mt>,
    transport: Arc<dyn Transport>,
    tokens: Option<Arc<dyn TokenProvider>>,
    notifier: Arc<dyn Notifier>,
    config: CollectionConfig,
    keys: KeyBuilder,
    pagination: PaginationCoordinator,
    channel: CollectionChannel<E>,
    filter: RwLock<FilterCriteria>,
    pages: Coalescer<Page<E>>,
    details: Coalescer<E>,
    sequencer: RequestSequencer,
}

impl<E, M, S, Mt> CollectionService<E, M, S, Mt>
where
    E: Resource,
    M: KeyValueMedium,
    S: Serializer,
    Mt: CacheMetrics,
{
    pub fn new(store: CacheStore<M, S, Mt>, transport: Arc<dyn Transport>) -> Self {
        let config = CollectionConfig::default();
        Self {
            store,
            transport,
            tokens: None,
            notifier: Arc::new(NoopNotifier),
            pagination: PaginationCoordinator::new(config.page_size),
            config,
            keys: KeyBuilder::new(),
            channel: CollectionChannel::new(),
            filter: RwLock::new(FilterCriteria::default()),
            pages: Coalescer::new(),
            details: Coalescer::new(),
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn with_config(mut self, config: CollectionConfig) -> Self {
        self.pagination = PaginationCoordinator::new(config.page_size);
        self.config = config;
        self
    }

    /// Attach a bearer token to every request
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_key_builder(mut self, keys: KeyBuilder) -> Self {
        self.keys = keys;
        self
    }

    pub fn store(&self) -> &CacheStore<M, S, Mt> {
        &self.store
    }

    pub fn pagination(&self) -> &PaginationCoordinator {
        &self.pagination
    }

    /// Subscribe to the published collection
    pub fn subscribe(&self) -> CollectionSubscriber<E> {
        self.channel.subscribe()
    }

    /// Latest published collection
    pub fn current(&self) -> Snapshot<E> {
        self.channel.current()
    }

    pub fn filter(&self) -> FilterCriteria {
        self.filter.read().clone()
    }

    /// Cache key of a listing at `path`
    pub fn page_key(&self, path: &str, query: &ListQuery) -> String {
        let params = query.to_params().with("endpoint", path);
        self.keys.build_key(E::CACHE_PREFIX, &params)
    }

    fn detail_key(&self, id: u64) -> String {
        let params = QueryParams::new().with("id", id);
        self.keys.build_key(E::CACHE_PREFIX, &params)
    }

    /// Apply TTL jitter so pages cached together do not expire together
    fn page_ttl(&self) -> Duration {
        let ttl = self.config.ttl;
        if self.config.ttl_jitter > 0.0 {
            let jitter_range = (ttl.as_millis() as f64 * self.config.ttl_jitter) as u64;
            if jitter_range > 0 {
                let jitter = rand::random::<u64>() % jitter_range;
                return ttl + Duration::from_millis(jitter);
            }
        }
        ttl
    }

    fn request(&self, method: Method, path: impl Into<String>) -> Request {
        let request = Request::new(method, path);
        match self.tokens.as_ref().and_then(|tokens| tokens.bearer_token()) {
            Some(token) => request.with_header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    fn report_failure(&self, action: &str, err: &SyncError) {
        warn!(target: "taskcache", entity = E::NAME, action, error = %err, "request failed");
        self.notifier
            .report(&format!("Failed to {action}: {err}"), NoticeKind::Error);
    }

    fn report_success(&self, verb: &str) {
        self.notifier
            .report(&format!("{} {verb}", capitalize(E::NAME)), NoticeKind::Success);
    }

    /// Cache read that never fails the caller
    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get::<T>(key).await {
            Ok(CacheResult::Hit(entry)) => Some(entry.value),
            Ok(CacheResult::Miss) => None,
            Err(err) => {
                warn!(target: "taskcache", key, error = %err, "cache read failed");
                None
            }
        }
    }

    /// Cache write that never fails the caller; skipped if an invalidation
    /// happened since `epoch` was captured
    async fn remember<T: serde::Serialize>(&self, key: &str, value: &T, epoch: u64) {
        if self.store.epoch() != epoch {
            debug!(target: "taskcache", key, "invalidated while in flight, not caching");
            return;
        }
        if let Err(err) = self.store.set(key, value, CacheOpts::new().ttl(self.page_ttl())).await {
            warn!(target: "taskcache", key, error = %err, "cache write failed");
        }
    }

    /// Publish `page` unless a newer request already published
    fn apply(&self, ticket: Ticket, page: &Page<E>) -> bool {
        let applied = self.sequencer.apply_if_latest(ticket, || {
            self.pagination.update_total_items(page.total_items);
            self.channel.publish(page.items.clone());
        });
        if !applied {
            debug!(target: "taskcache", seq = ticket.seq(), "discarding superseded response");
        }
        applied
    }

    async fn load_page(&self, path: &str, query: &ListQuery, key: &str, epoch: u64) -> SyncResult<Page<E>> {
        let request = self
            .request(Method::Get, path)
            .with_query(query.to_params().to_query_pairs());
        let body = self.transport.request(request).await?;
        let page: Page<E> = serde_json::from_value::<PagePayload<E>>(body)?.into();
        self.remember(key, &page, epoch).await;
        Ok(page)
    }

    /// Read one page of the listing at `path`
    ///
    /// On failure the published collection is left as it was.
    pub async fn fetch_from(&self, path: &str, query: &ListQuery) -> SyncResult<Page<E>> {
        let ticket = self.sequencer.issue();
        let key = self.page_key(path, query);

        if let Some(page) = self.cached::<Page<E>>(&key).await {
            debug!(target: "taskcache", key = %key, "serving page from cache");
            self.apply(ticket, &page);
            return Ok(page);
        }

        let epoch = self.store.epoch();
        let key_ref = key.as_str();
        let load = move || self.load_page(path, query, key_ref, epoch);
        match self.pages.run(&inflight_key(&key, epoch), load).await {
            Ok(page) => {
                self.apply(ticket, &page);
                Ok(page)
            }
            Err(err) => {
                self.report_failure(&format!("load {}s", E::NAME), &err);
                Err(err)
            }
        }
    }

    /// Read one page of the listing selected by the query's filter
    pub async fn fetch(&self, query: &ListQuery) -> SyncResult<Page<E>> {
        self.fetch_from(&E::list_path(&query.filter), query).await
    }

    /// Read the page the pagination state points at, under the current filter
    pub async fn fetch_current(&self) -> SyncResult<Page<E>> {
        let state = self.pagination.state();
        let query = ListQuery::new(state.current_page, state.page_size).with_filter(self.filter());
        self.fetch(&query).await
    }

    /// Read one entity; cached under the entity prefix, never published
    pub async fn fetch_one(&self, id: u64) -> SyncResult<E> {
        let key = self.detail_key(id);
        if let Some(entity) = self.cached::<E>(&key).await {
            return Ok(entity);
        }

        let epoch = self.store.epoch();
        let key_ref = key.as_str();
        let load = move || async move {
            let body = self.transport.request(self.request(Method::Get, E::item_path(id))).await?;
            let entity: E = serde_json::from_value(body)?;
            self.remember(key_ref, &entity, epoch).await;
            Ok(entity)
        };

        self.details.run(&inflight_key(&key, epoch), load).await.inspect_err(|err| {
            self.report_failure(&format!("load {} {id}", E::NAME), err);
        })
    }

    /// Replace the filter, return to the first page and read it
    pub async fn apply_filter(&self, filter: FilterCriteria) -> SyncResult<Page<E>> {
        self.update_filter(|current| *current = filter);
        self.fetch_current().await
    }

    fn update_filter(&self, f: impl FnOnce(&mut FilterCriteria)) {
        f(&mut self.filter.write());
        self.pagination.first_page();
    }

    /// Move to page `n` and read it; `None` if `n` is out of range
    pub async fn go_to_page(&self, n: u64) -> SyncResult<Option<Page<E>>> {
        if !self.pagination.go_to_page(n) {
            return Ok(None);
        }
        self.fetch_current().await.map(Some)
    }

    pub async fn next_page(&self) -> SyncResult<Option<Page<E>>> {
        if !self.pagination.next_page() {
            return Ok(None);
        }
        self.fetch_current().await.map(Some)
    }

    pub async fn previous_page(&self) -> SyncResult<Option<Page<E>>> {
        if !self.pagination.previous_page() {
            return Ok(None);
        }
        self.fetch_current().await.map(Some)
    }

    /// Drop every cached page of this entity and of the entities embedding it
    pub async fn invalidate(&self) -> u64 {
        let mut removed = 0;
        for prefix in std::iter::once(E::CACHE_PREFIX).chain(E::DEPENDENT_PREFIXES.iter().copied()) {
            match self.store.delete_by_prefix(prefix).await {
                Ok(count) => removed += count,
                Err(err) => warn!(target: "taskcache", prefix, error = %err, "invalidation failed"),
            }
        }
        removed
    }

    /// Send a write; the cache is only invalidated once the server accepted it
    async fn write(&self, action: &str, request: Request) -> SyncResult<Value> {
        match self.transport.request(request).await {
            Ok(body) => {
                self.invalidate().await;
                Ok(body)
            }
            Err(err) => {
                let err = SyncError::from(err);
                self.report_failure(action, &err);
                Err(err)
            }
        }
    }

    /// Entity echoed by the server, or `fallback` for an empty or unreadable
    /// body; the write itself was accepted either way
    fn saved(body: Value, fallback: &E) -> E {
        if body.is_null() {
            return fallback.clone();
        }
        match serde_json::from_value(body) {
            Ok(entity) => entity,
            Err(err) => {
                warn!(target: "taskcache", entity = E::NAME, error = %err, "unreadable write response, keeping sent entity");
                fallback.clone()
            }
        }
    }

    /// Publish a local change; it supersedes every read dispatched before it
    fn publish_local(&self, change: impl FnOnce(&[E]) -> Vec<E>, total_delta: i64) {
        let ticket = self.sequencer.issue();
        self.sequencer.apply_if_latest(ticket, || {
            self.channel.update(change);
            self.pagination.adjust_total_items(total_delta);
        });
    }

    pub async fn create(&self, entity: &E) -> SyncResult<E> {
        let action = format!("create {}", E::NAME);
        let request = self
            .request(Method::Post, E::PATH)
            .with_body(entity.write_payload()?);
        let body = self.write(&action, request).await?;
        let created = Self::saved(body, entity);

        let merged = created.clone();
        self.publish_local(move |items| merge_by_id(items, merged), 1);
        self.report_success("created");
        Ok(created)
    }

    pub async fn update(&self, id: u64, entity: &E) -> SyncResult<E> {
        let action = format!("update {} {id}", E::NAME);
        let request = self
            .request(Method::Put, E::item_path(id))
            .with_body(entity.write_payload()?);
        let body = self.write(&action, request).await?;
        let updated = Self::saved(body, entity);

        let merged = updated.clone();
        self.publish_local(move |items| merge_by_id(items, merged), 0);
        self.report_success("updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> SyncResult<()> {
        let action = format!("delete {} {id}", E::NAME);
        self.write(&action, self.request(Method::Delete, E::item_path(id)))
            .await?;

        self.publish_local(
            |items| {
                items
                    .iter()
                    .filter(|item| item.id() != Some(id))
                    .cloned()
                    .collect()
            },
            -1,
        );
        self.report_success("deleted");
        Ok(())
    }

    /// Re-read the collection on every value of `rx`, after folding the value
    /// into the filter
    ///
    /// Each read is dispatched without waiting for the previous one; the
    /// sequencer keeps a slow earlier read from overwriting a later one.
    /// Must be called from within a Tokio runtime.
    pub fn follow<T, F>(self: &Arc<Self>, mut rx: broadcast::Receiver<T>, fold: F) -> JoinHandle<()>
    where
        T: Clone + Send + 'static,
        F: Fn(&mut FilterCriteria, T) + Send + Sync + 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(value) => {
                        service.update_filter(|filter| fold(filter, value));
                        let service = Arc::clone(&service);
                        tokio::spawn(async move {
                            if let Err(err) = service.fetch_current().await {
                                debug!(target: "taskcache", error = %err, "followed read failed");
                            }
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "taskcache", skipped, "input stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Coalescing key for a read started at invalidation `epoch`
///
/// A read started after an invalidation never joins one started before it.
fn inflight_key(key: &str, epoch: u64) -> String {
    format!("{key}@{epoch}")
}

/// Replace the item with the same id, or append it
fn merge_by_id<E: Resource>(items: &[E], entity: E) -> Vec<E> {
    let mut merged = items.to_vec();
    match merged
        .iter_mut()
        .find(|item| item.id().is_some() && item.id() == entity.id())
    {
        Some(slot) => *slot = entity,
        None => merged.push(entity),
    }
    merged
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
