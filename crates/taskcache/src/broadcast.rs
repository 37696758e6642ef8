//! Hot, replay-1 publish point for a collection

use std::sync::Arc;

use tokio::sync::watch;

/// A published collection and its publication number
#[derive(Debug)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    /// Incremented on every publication; 0 means nothing was published yet
    pub version: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            version: self.version,
        }
    }
}

/// Republishes the current collection to every subscribed surface
///
/// A late subscriber immediately sees the most recent publication and no
/// earlier history. Only the owning service publishes.
pub struct CollectionChannel<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T: Send + Sync + 'static> CollectionChannel<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot {
            items: Arc::new(Vec::new()),
            version: 0,
        });
        Self { tx }
    }

    /// Replace the collection
    pub(crate) fn publish(&self, items: Vec<T>) {
        self.tx.send_modify(|snapshot| {
            snapshot.items = Arc::new(items);
            snapshot.version += 1;
        });
    }

    /// Derive a new collection from the current one
    pub(crate) fn update(&self, f: impl FnOnce(&[T]) -> Vec<T>) {
        self.tx.send_modify(|snapshot| {
            snapshot.items = Arc::new(f(&snapshot.items));
            snapshot.version += 1;
        });
    }

    /// Latest publication
    pub fn current(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> CollectionSubscriber<T> {
        CollectionSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Send + Sync + 'static> Default for CollectionChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One surface's view of a [`CollectionChannel`]
pub struct CollectionSubscriber<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T> CollectionSubscriber<T> {
    /// Most recent publication, marking it seen
    pub fn current(&mut self) -> Snapshot<T> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next publication; `None` once the channel is gone
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }

    /// Whether a publication arrived since the last `current` or `changed`
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

impl<T> Clone for CollectionSubscriber<T> {
    fn clone(&self) -> Self {
        Self { rx: self.rx.clone() }
    }
}
