//! Debounced input channels for search terms and filter changes

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::trace;

use taskcache_core::FilterCriteria;

use crate::config::StreamConfig;

/// Collapses bursts of values into one emission after a quiet period
///
/// A value is emitted once no newer value arrived for `quiet`, and only if
/// it differs from the previous emission. Debouncing delays dispatch only;
/// it never cancels work started by an earlier emission.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    output: Mutex<Option<broadcast::Sender<T>>>,
    capacity: usize,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Spawn the timer task; must be called from within a Tokio runtime
    pub fn new(quiet: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (input, rx) = mpsc::unbounded_channel();
        let (output, _) = broadcast::channel(capacity);
        let task = tokio::spawn(Self::run(rx, output.clone(), quiet));
        Self {
            input,
            output: Mutex::new(Some(output)),
            capacity,
            task,
        }
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<T>, output: broadcast::Sender<T>, quiet: Duration) {
        let mut last: Option<T> = None;
        let mut pending: Option<T> = None;

        loop {
            let received = if pending.is_some() {
                match tokio::time::timeout(quiet, rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => {
                        flush(&output, &mut last, pending.take());
                        continue;
                    }
                }
            } else {
                rx.recv().await
            };

            match received {
                Some(value) => pending = Some(value),
                None => {
                    flush(&output, &mut last, pending.take());
                    break;
                }
            }
        }
    }

    /// Feed a raw value
    pub fn emit(&self, value: T) -> bool {
        self.input.send(value).is_ok()
    }

    /// Receive debounced values; closed once disposed
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        match self.output.lock().as_ref() {
            Some(output) => output.subscribe(),
            None => broadcast::channel(self.capacity).1,
        }
    }

    /// Stop the timer and close every subscription
    pub fn dispose(&self) {
        self.task.abort();
        self.output.lock().take();
    }

    pub fn is_disposed(&self) -> bool {
        self.output.lock().is_none()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn flush<T: Clone + PartialEq>(output: &broadcast::Sender<T>, last: &mut Option<T>, pending: Option<T>) {
    let Some(value) = pending else {
        return;
    };
    if last.as_ref() == Some(&value) {
        trace!(target: "taskcache", "debounced value unchanged, not emitted");
        return;
    }
    *last = Some(value.clone());
    // No subscribers is fine
    let _ = output.send(value);
}

/// Search and filter input channels for one surface
pub struct StreamCoordinator {
    search: Debouncer<String>,
    filter: Debouncer<FilterCriteria>,
}

impl StreamCoordinator {
    /// Must be called from within a Tokio runtime
    pub fn new(config: StreamConfig) -> Self {
        Self {
            search: Debouncer::new(config.search_quiet, config.capacity),
            filter: Debouncer::new(config.filter_quiet, config.capacity),
        }
    }

    /// Feed a raw search term; surrounding whitespace is ignored
    pub fn emit_search(&self, term: impl Into<String>) -> bool {
        let term = term.into();
        self.search.emit(term.trim().to_string())
    }

    pub fn emit_filter(&self, criteria: FilterCriteria) -> bool {
        self.filter.emit(criteria)
    }

    pub fn search_stream(&self) -> broadcast::Receiver<String> {
        self.search.subscribe()
    }

    pub fn filter_stream(&self) -> broadcast::Receiver<FilterCriteria> {
        self.filter.subscribe()
    }

    /// Tear down both channels
    pub fn dispose(&self) {
        self.search.dispose();
        self.filter.dispose();
    }
}

impl Default for StreamCoordinator {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}
