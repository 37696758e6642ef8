//! Two surfaces sharing one task collection over an in-process backend

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use taskcache::prelude::*;
use taskcache::{Method, Request, TransportError};

/// A tiny task backend kept in memory
#[derive(Default)]
struct InMemoryBackend {
    tasks: Mutex<Vec<Task>>,
    next_id: Mutex<u64>,
    reads: Mutex<u64>,
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn request(&self, request: Request) -> Result<Value, TransportError> {
        match (request.method, request.path.as_str()) {
            (Method::Get, "/api/tasks") | (Method::Get, "/api/tasks/filter") => {
                *self.reads.lock() += 1;
                let search = request.query_param("search").unwrap_or("").to_lowercase();
                let tasks: Vec<Task> = self
                    .tasks
                    .lock()
                    .iter()
                    .filter(|task| task.title.to_lowercase().contains(&search))
                    .cloned()
                    .collect();
                let total = tasks.len();
                Ok(json!({"items": tasks, "totalItems": total}))
            }
            (Method::Post, "/api/tasks") => {
                let mut task: Task = serde_json::from_value(request.body.unwrap_or_default())
                    .map_err(|e| TransportError::server(400, e.to_string()))?;
                let mut next_id = self.next_id.lock();
                *next_id += 1;
                task.id = Some(*next_id);
                self.tasks.lock().push(task.clone());
                serde_json::to_value(task).map_err(|e| TransportError::server(500, e.to_string()))
            }
            (method, path) => Err(TransportError::server(
                404,
                format!("no route for {} {}", method.as_str(), path),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== taskcache collection sync ===\n");

    let backend = Arc::new(InMemoryBackend::default());
    let store = CacheStore::new(MemoryMedium::with_defaults());
    let _sweeper = store.spawn_default_sweeper();

    let tasks = TaskService::new(CollectionService::new(store.clone(), backend.clone()));

    // Two independent surfaces watching the same collection
    let mut list_view = tasks.subscribe();
    let mut sidebar = tasks.subscribe();

    for title in ["Buy milk", "Walk dog", "Milk the cow"] {
        tasks.create(&Task::new(title)).await?;
    }

    tasks.load().await?;
    tasks.load().await?;
    println!("Backend reads after two loads: {}", backend.reads.lock());
    println!("List view sees {} tasks", list_view.current().items.len());
    println!("Sidebar sees {} tasks", sidebar.current().items.len());

    // Debounced search: one read for the whole burst
    let streams = StreamCoordinator::default();
    let follower = tasks.follow_search(&streams);
    for term in ["m", "mi", "mil", "milk"] {
        streams.emit_search(term);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let found = list_view.current();
    println!("\nSearch 'milk' matched:");
    for task in found.items.iter() {
        println!("  - {}", task.title);
    }

    let (start, end) = tasks.pagination().display_range();
    println!("Showing {start}-{end} of {}", tasks.pagination().state().total_items);
    println!("Cache stats: {:?}", store.stats().await?);

    streams.dispose();
    follower.await?;
    Ok(())
}
