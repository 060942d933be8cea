//! # Concurrency Tests
//!
//! The pool and the identifier generator are the only services shared
//! across threads. Everything else lives on the driver thread.
//!
//! Run with: cargo test -p arbor_core --test concurrency_test

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use arbor_core::{IdGenerator, IdParts, ObjectPool, TimeInfo, TypeKey};

const THREADS: usize = 8;

fn generator(zone: u16) -> Arc<IdGenerator> {
    let time = Arc::new(TimeInfo::frozen(1_700_000_000_000));
    Arc::new(IdGenerator::new(time, zone))
}

#[test]
fn test_ids_unique_across_threads() {
    const PER_THREAD: usize = 10_000;
    let ids = generator(7);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || (0..PER_THREAD).map(|_| ids.generate_id()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::with_capacity(THREADS * PER_THREAD);
    for handle in handles {
        for id in handle.join().unwrap() {
            assert_eq!(IdParts::decode(id).zone, 7);
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

#[test]
fn test_instance_ids_unique_across_threads() {
    const PER_THREAD: usize = 10_000;
    let ids = generator(0);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let ids = Arc::clone(&ids);
            thread::spawn(move || {
                (0..PER_THREAD)
                    .map(|_| ids.generate_instance_id())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert_ne!(id, 0);
            assert!(seen.insert(id));
        }
    }
}

#[test]
fn test_pool_traffic_across_threads() {
    const ROUNDS: u64 = 2_000;
    const CAPACITY: usize = 16;
    let pool: Arc<ObjectPool<u64>> = Arc::new(ObjectPool::new(CAPACITY));
    let key = TypeKey::of::<u64>();

    let handles: Vec<_> = (0..THREADS as u64)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let mut item = pool.fetch(key, || Box::new(0));
                    *item = worker * ROUNDS + round;
                    pool.recycle(key, item);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    let total = THREADS as u64 * ROUNDS;
    assert_eq!(stats.hits + stats.misses, total);
    assert_eq!(stats.recycled + stats.dropped, total);
    assert!(pool.available(key) <= CAPACITY);
    assert_eq!(pool.available(key) as u64, stats.recycled - stats.hits);
}

#[test]
fn test_pool_never_exceeds_capacity() {
    const CAPACITY: usize = 4;
    let pool: Arc<ObjectPool<u64>> = Arc::new(ObjectPool::new(CAPACITY));
    let key = TypeKey::of::<u64>();

    let handles: Vec<_> = (0..THREADS as u64)
        .map(|worker| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for value in 0..100 {
                    pool.recycle(key, Box::new(worker * 100 + value));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(pool.available(key) <= CAPACITY);
    let mut drained = 0;
    while pool.take(key).is_some() {
        drained += 1;
    }
    assert_eq!(drained, pool.stats().recycled);
    assert!(drained <= CAPACITY as u64);
}
