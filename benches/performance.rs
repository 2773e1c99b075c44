//! Performance benchmarks for the revision cache.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use revcache::{EventLog, Revision, RevisionedStore, Session};
use std::sync::Arc;

fn populated_store(keys: i64) -> (RevisionedStore, Arc<EventLog>) {
    let log = Arc::new(EventLog::new(16384).unwrap());
    let store = RevisionedStore::new().with_log(Arc::clone(&log));
    for rev in 1..=keys {
        store.apply_put(format!("key/{:06}", rev), vec![0u8; 64], Revision(rev));
    }
    (store, log)
}

/// Benchmark apply throughput with and without an attached log.
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_put");

    group.bench_function("bare_store", |b| {
        let store = RevisionedStore::new();
        let mut rev = 0i64;
        b.iter(|| {
            rev += 1;
            store.apply_put("hot", vec![0u8; 64], Revision(rev));
        });
    });

    group.bench_function("with_log", |b| {
        let log = Arc::new(EventLog::new(16384).unwrap());
        let store = RevisionedStore::new().with_log(log);
        let mut rev = 0i64;
        b.iter(|| {
            rev += 1;
            store.apply_put("hot", vec![0u8; 64], Revision(rev));
        });
    });

    group.finish();
}

/// Benchmark snapshot capture cost as the store grows.
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for size in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("store_size", size), &size, |b, &size| {
            let (store, _log) = populated_store(size);
            b.iter(|| {
                black_box(store.snapshot());
            });
        });
    }

    group.finish();
}

/// Benchmark paging and prefix scans over a fixed snapshot.
fn bench_snapshot_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_reads");

    let (store, _log) = populated_store(10_000);
    let snap = store.snapshot();

    group.bench_function("page_100", |b| {
        b.iter(|| {
            black_box(snap.page(50, 100));
        });
    });

    group.bench_function("prefix_scan", |b| {
        b.iter(|| {
            black_box(snap.list("key/00"));
        });
    });

    group.finish();
}

/// Benchmark session open (snapshot copy plus watch registration).
fn bench_session_open(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_open");

    for size in [100, 10_000] {
        group.bench_with_input(BenchmarkId::new("store_size", size), &size, |b, &size| {
            let (store, log) = populated_store(size);
            b.iter(|| {
                let session = Session::open("bench", &store, Arc::clone(&log)).unwrap();
                black_box(session.revision());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_apply,
    bench_snapshot,
    bench_snapshot_reads,
    bench_session_open
);
criterion_main!(benches);
