//! # Pool and Identifier Benchmark
//!
//! Measures the shared services on the hot path of entity creation:
//! recycling through the object pool and generating business ids.
//!
//! Run with: `cargo bench --package arbor_core --bench pool_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::sync::Arc;

use arbor_core::{IdGenerator, ObjectPool, TimeInfo, TypeKey};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Payload roughly the size of a small behavior.
#[derive(Default)]
struct Payload {
    data: [u64; 8],
}

/// Benchmark: fetch/recycle round trip against a warm store.
fn bench_fetch_recycle(c: &mut Criterion) {
    let pool: ObjectPool<Payload> = ObjectPool::new(1000);
    let key = TypeKey::of::<Payload>();
    pool.recycle(key, Box::default());

    c.bench_function("pool_fetch_recycle_warm", |b| {
        b.iter(|| {
            let mut item = pool.fetch(key, Box::default);
            item.data[0] += 1;
            black_box(pool.recycle(key, item))
        });
    });
}

/// Benchmark: draining and refilling stores of growing depth.
fn bench_drain_refill(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_drain_refill");

    for depth in [16usize, 256, 1000] {
        let pool: ObjectPool<Payload> = ObjectPool::new(depth);
        let key = TypeKey::of::<Payload>();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let items: Vec<Box<Payload>> =
                    (0..depth).map(|_| pool.fetch(key, Box::default)).collect();
                for item in items {
                    pool.recycle(key, item);
                }
                black_box(pool.available(key))
            });
        });
    }

    group.finish();
}

/// Benchmark: contended pool traffic from 4 threads.
fn bench_contended(c: &mut Criterion) {
    const THREADS: usize = 4;
    const ROUNDS: usize = 1_000;

    let pool: Arc<ObjectPool<Payload>> = Arc::new(ObjectPool::new(64));
    let key = TypeKey::of::<Payload>();

    c.bench_function("pool_contended_4x1000", |b| {
        b.iter(|| {
            std::thread::scope(|scope| {
                for _ in 0..THREADS {
                    let pool = Arc::clone(&pool);
                    scope.spawn(move || {
                        for _ in 0..ROUNDS {
                            let item = pool.fetch(key, Box::default);
                            pool.recycle(key, item);
                        }
                    });
                }
            });
            black_box(pool.stats())
        });
    });
}

/// Benchmark: business and instance id generation.
fn bench_ids(c: &mut Criterion) {
    let ids = IdGenerator::new(Arc::new(TimeInfo::new()), 1);

    c.bench_function("generate_id", |b| b.iter(|| black_box(ids.generate_id())));
    c.bench_function("generate_instance_id", |b| {
        b.iter(|| black_box(ids.generate_instance_id()));
    });
}

criterion_group!(
    benches,
    bench_fetch_recycle,
    bench_drain_refill,
    bench_contended,
    bench_ids,
);
criterion_main!(benches);
