//! Throughput Benchmark for FlashKV Sessions
//!
//! This benchmark measures the session store and the sweep over the
//! in-memory table under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flashkv_sessions::session::{Session, SessionBackend, SessionStore, StoreConfig};
use flashkv_sessions::sweep::Sweeper;
use flashkv_sessions::table::{MemoryTable, RecordTable};
use serde_json::json;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn store(table: Arc<MemoryTable>) -> SessionStore<MemoryTable> {
    SessionStore::builder(table, StoreConfig::new("bench").without_cleanup())
        .build()
        .unwrap()
}

fn sample_session() -> Session {
    let mut session = Session::new();
    session.insert("user", json!("ariz"));
    session.insert("cart", json!([1, 2, 3, 4, 5]));
    session.insert("cookie", json!({"path": "/", "httpOnly": true}));
    session
}

/// Benchmark set operations
fn bench_set(c: &mut Criterion) {
    let rt = runtime();
    let store = store(Arc::new(MemoryTable::new("bench")));
    let session = sample_session();

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_session", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let sid = format!("sid:{}", i);
            rt.block_on(store.set(&sid, &session)).unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark get operations
fn bench_get(c: &mut Criterion) {
    let rt = runtime();
    let store = store(Arc::new(MemoryTable::new("bench")));
    let session = sample_session();

    // Pre-populate with data
    for i in 0..100_000 {
        rt.block_on(store.set(&format!("sid:{}", i), &session))
            .unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let sid = format!("sid:{}", i % 100_000);
            black_box(rt.block_on(store.get(&sid)).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let sid = format!("missing:{}", i);
            black_box(rt.block_on(store.get(&sid)).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark touch operations inside and outside the grace window
fn bench_touch(c: &mut Criterion) {
    let rt = runtime();
    let store = store(Arc::new(MemoryTable::new("bench")));

    let mut fresh = sample_session();
    fresh.set_last_modified(chrono::Utc::now().timestamp_millis());
    let mut stale = sample_session();
    stale.set_last_modified(0);

    let mut group = c.benchmark_group("touch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("within_grace", |b| {
        b.iter(|| rt.block_on(store.touch("sid", &fresh)).unwrap());
    });

    group.bench_function("refresh", |b| {
        b.iter(|| rt.block_on(store.touch("sid", &stale)).unwrap());
    });

    group.finish();
}

/// Benchmark full sweeps over tables where half the rows are expired
fn bench_sweep(c: &mut Criterion) {
    let rt = runtime();

    let mut group = c.benchmark_group("sweep");

    for rows in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(rows));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter_batched(
                || {
                    let table = Arc::new(MemoryTable::new("bench").with_page_limit(500));
                    rt.block_on(async {
                        for i in 0..rows {
                            let expires = if i % 2 == 0 { 100 } else { i64::MAX };
                            table
                                .put(&format!("sid:{}", i), expires, Bytes::from("{}"))
                                .await
                                .unwrap();
                        }
                    });
                    table
                },
                |table| {
                    let stats = rt
                        .block_on(Sweeper::new(Arc::clone(&table)).sweep(1_000))
                        .unwrap();
                    black_box(stats);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_touch, bench_sweep);
criterion_main!(benches);
