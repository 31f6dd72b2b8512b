//! Benchmarks for the counting hot path.
//!
//! - cache construction for a mid-size order
//! - one canonical first column of a deep search
//! - the completion pass, which iterates the last level instead of popcounting it

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use latin_rect::counter::RectangleCounter;
use latin_rect::derangement::DerangementCache;
use latin_rect::first_column::enumerate_first_columns;
use latin_rect::partition::{count_all, CountConfig, Executor};

fn bench_cache_build_n8(c: &mut Criterion) {
    c.bench_function("derangement_cache_n8", |b| {
        b.iter(|| DerangementCache::build(black_box(8)).map(|cache| cache.len()));
    });
}

fn bench_single_column_4x7(c: &mut Criterion) {
    let cache = DerangementCache::build(7).expect("n=7 cache");
    let counter = RectangleCounter::new(&cache);
    let column = enumerate_first_columns(4, 7).expect("columns")[0].clone();

    c.bench_function("single_column_4x7", |b| {
        b.iter(|| counter.count(black_box(4), Some(column.as_slice())));
    });
}

fn bench_completion_5x6(c: &mut Criterion) {
    let cache = DerangementCache::build(6).expect("n=6 cache");
    let counter = RectangleCounter::new(&cache);

    c.bench_function("completion_5x6", |b| {
        b.iter(|| counter.count_with_completion(black_box(5), None));
    });
}

fn bench_executors_4x7(c: &mut Criterion) {
    let cache = DerangementCache::build(7).expect("n=7 cache");
    let mut group = c.benchmark_group("executors_4x7");
    group.sample_size(10);
    for executor in [Executor::Rayon, Executor::Queue] {
        let cfg = CountConfig { rows: 4, order: 7, executor, ..CountConfig::default() };
        group.bench_function(format!("{executor:?}"), |b| {
            b.iter(|| count_all(black_box(&cfg), &cache));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_cache_build_n8,
    bench_single_column_4x7,
    bench_completion_5x6,
    bench_executors_4x7
);
criterion_main!(benches);
