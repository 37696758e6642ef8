//! Benchmarks for cache key construction

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use taskcache_core::{
    DateFilter, FilterCriteria, KeyBuilder, KeyEncoding, KeyOrdering, ListQuery, Priority,
    StatusFilter,
};

fn queries() -> Vec<(&'static str, ListQuery)> {
    vec![
        ("unfiltered", ListQuery::new(1, 20)),
        (
            "filtered",
            ListQuery::new(3, 20).with_filter(
                FilterCriteria::new()
                    .search("groceries for the weekend")
                    .status(StatusFilter::Pending)
                    .priority(Priority::High)
                    .date(DateFilter::Week)
                    .list(42),
            ),
        ),
        (
            "long_search",
            ListQuery::new(1, 50).with_filter(FilterCriteria::new().search("x".repeat(2048))),
        ),
    ]
}

fn bench_build_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_key");

    let builders = [
        ("canonical_hashed", KeyBuilder::new()),
        (
            "insertion_hashed",
            KeyBuilder::new().with_ordering(KeyOrdering::Insertion),
        ),
        (
            "canonical_verbatim",
            KeyBuilder::new().with_encoding(KeyEncoding::Verbatim),
        ),
    ];

    for (query_name, query) in queries() {
        let params = query.to_params();
        for (builder_name, builder) in &builders {
            group.bench_with_input(
                BenchmarkId::new(*builder_name, query_name),
                &params,
                |b, params| b.iter(|| builder.build_key(black_box("tasks:"), black_box(params))),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_build_key);
criterion_main!(benches);
