//! Benchmarks for tracked writes, transactions, and undo/redo replay.
//!
//! Run with: cargo bench -p pagecraft-history --bench history_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pagecraft_history::{
    ArrayRef, Historian, HistoryConfig, ObjectRef, TrackedArray, TrackedObject, Value,
};

// ============================================================================
// Setup helpers
// ============================================================================

fn tracked_object(historian: &Historian) -> TrackedObject {
    TrackedObject::new(historian, ObjectRef::new())
}

fn tracked_array(historian: &Historian, n: usize) -> TrackedArray {
    let items = (0..n).map(|i| Value::from(i as u64)).collect();
    TrackedArray::new(historian, ArrayRef::from_vec(items))
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_property_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("history/property_set");
    for &n in &[10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let historian = Historian::new(HistoryConfig::new(n + 1));
                let doc = tracked_object(&historian);
                for i in 0..n {
                    doc.set("value", i as u64);
                }
                black_box(historian.can_undo())
            });
        });
    }
    group.finish();
}

fn bench_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("history/transaction");
    for &n in &[10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let historian = Historian::default();
                let doc = tracked_object(&historian);
                historian.batch(|| {
                    for i in 0..n {
                        doc.set(format!("k{}", i % 16), i as u64);
                    }
                });
                black_box(historian.undo())
            });
        });
    }
    group.finish();
}

fn bench_undo_redo_cycle(c: &mut Criterion) {
    let historian = Historian::new(HistoryConfig::new(1_001));
    let items = tracked_array(&historian, 0);
    for i in 0..1_000u64 {
        items.push(i);
    }

    c.bench_function("history/undo_redo_1000", |b| {
        b.iter(|| {
            while historian.undo() {}
            while historian.redo() {}
            black_box(items.len())
        });
    });
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("history/sort_reverse");
    for &n in &[100usize, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let historian = Historian::default();
                let items = tracked_array(&historian, n);
                items.sort_by(|a, b| b.as_i64().cmp(&a.as_i64()));
                black_box(items.get(0))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_property_writes,
    bench_transaction,
    bench_undo_redo_cycle,
    bench_sort
);
criterion_main!(benches);
