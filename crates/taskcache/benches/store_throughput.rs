//! Benchmarks for cache store throughput and invalidation

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use taskcache::{CacheOpts, CacheResult, CacheStore, MemoryConfig, MemoryMedium, Page, Task};
use tokio::runtime::Runtime;

fn create_store() -> CacheStore<MemoryMedium> {
    CacheStore::new(MemoryMedium::new(MemoryConfig::unlimited()))
}

fn page(size: usize) -> Page<Task> {
    let items = (0..size)
        .map(|i| {
            let mut task = Task::new(format!("task {i}"));
            task.id = Some(i as u64);
            task
        })
        .collect();
    Page::new(items, size as u64)
}

fn bench_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = create_store();
    let value = page(20);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("page_of_20", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .set(black_box("tasks:page"), black_box(&value), CacheOpts::new())
                    .await
                    .unwrap();
            });
        });
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = create_store();

    // Pre-populate
    rt.block_on(async {
        store
            .set("tasks:page", &page(20), CacheOpts::new().ttl_secs(3600))
            .await
            .unwrap();
    });

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result: CacheResult<Page<Task>> =
                    store.get(black_box("tasks:page")).await.unwrap();
                black_box(result);
            });
        });
    });

    group.bench_function("miss", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result: CacheResult<Page<Task>> =
                    store.get(black_box("tasks:none")).await.unwrap();
                black_box(result);
            });
        });
    });

    group.finish();
}

fn bench_invalidate(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = create_store();
    let value = page(5);

    let mut group = c.benchmark_group("invalidate");
    group.throughput(Throughput::Elements(100));

    group.bench_function("prefix_of_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                for i in 0..100 {
                    store
                        .set(&format!("tasks:{i}"), &value, CacheOpts::new())
                        .await
                        .unwrap();
                }
                black_box(store.delete_by_prefix("tasks:").await.unwrap());
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_invalidate);
criterion_main!(benches);
