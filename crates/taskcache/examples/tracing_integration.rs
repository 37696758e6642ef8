use std::sync::Arc;
use taskcache::prelude::*;
use taskcache::{NoticeKind, Notifier, TracingMetrics};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Logs user notices instead of showing them
struct LogNotifier;

impl Notifier for LogNotifier {
    fn report(&self, message: &str, kind: NoticeKind) {
        tracing::info!(?kind, "{message}");
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing subscriber
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Store with the tracing metrics adapter
    let metrics = TracingMetrics::new().with_service_name("todo-client");
    let store = CacheStore::with_serializer_and_metrics(
        MemoryMedium::with_defaults(),
        JsonSerializer,
        metrics,
        StoreConfig::default(),
    );

    println!("\nSetting a page...");
    let page = Page::complete(vec![Task::new("Water plants")]);
    store.set("tasks:demo", &page, CacheOpts::new().ttl_secs(60)).await?;

    println!("\nReading it back (hit)...");
    let hit = store.get::<Page<Task>>("tasks:demo").await?.value();
    println!("   Got: {:?}", hit.map(|page| page.items.len()));

    println!("\nReading a missing page (miss)...");
    let miss = store.get::<Page<Task>>("tasks:other").await?.value();
    println!("   Got: {:?}", miss.map(|page| page.items.len()));

    println!("\nInvalidating the prefix...");
    store.delete_by_prefix("tasks:").await?;

    // Notices from a service go through the same subscriber
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    notifier.report("Task created", NoticeKind::Success);

    Ok(())
}
