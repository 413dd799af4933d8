//! Benchmark for storage operations.
//!
//! Tests the core storage layer performance under various conditions.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sack::persistence::AppendLog;
use sack::protocol::Frame;
use sack::Store;
use std::sync::Arc;
use std::thread;

/// Benchmark single-threaded SET/GET operations
fn bench_single_thread_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");

    for size in [64usize, 1024] {
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("set", size), &size, |b, &size| {
            let store = Store::new();
            let value = Bytes::from(vec![b'x'; size]);
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                store.set(Bytes::from(format!("key:{}", i % 10_000)), value.clone());
            });
        });

        group.bench_with_input(BenchmarkId::new("get", size), &size, |b, &size| {
            let store = Store::new();
            let value = Bytes::from(vec![b'x'; size]);
            for i in 0..10_000 {
                store.set(Bytes::from(format!("key:{i}")), value.clone());
            }
            let mut i = 0u64;
            b.iter(|| {
                i += 1;
                let key = format!("key:{}", i % 10_000);
                black_box(store.get(key.as_bytes()))
            });
        });
    }

    group.bench_function("hset", |b| {
        let store = Store::new();
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            store.hset(
                Bytes::from_static(b"user"),
                Bytes::from(format!("field:{}", i % 1_000)),
                Bytes::from_static(b"value"),
            );
        });
    });

    group.finish();
}

/// Benchmark concurrent access patterns
fn bench_concurrent_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [1usize, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("read_heavy", num_threads),
            &num_threads,
            |b, &threads| {
                let store = Arc::new(Store::new());
                for i in 0..1_000 {
                    store.set(Bytes::from(format!("key:{i}")), Bytes::from_static(b"v"));
                }
                b.iter(|| {
                    thread::scope(|s| {
                        for t in 0..threads {
                            let store = &store;
                            s.spawn(move || {
                                for i in 0..1_000usize {
                                    let key = format!("key:{}", (i + t) % 1_000);
                                    if i % 10 == 0 {
                                        store.set(Bytes::from(key), Bytes::from_static(b"w"));
                                    } else {
                                        black_box(store.get(key.as_bytes()));
                                    }
                                }
                            });
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

/// Benchmark appending write commands to the log (no sync)
fn bench_append_log(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let log = AppendLog::open(dir.path().join("bench.sack")).unwrap();
    let frame = Frame::command(["SET", "key:000001", "value-value-value"]);

    c.bench_function("append_log/set", |b| {
        b.iter(|| log.append(black_box(&frame)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_single_thread_ops,
    bench_concurrent_access,
    bench_append_log
);
criterion_main!(benches);
