//! Benchmarks for memtx-storage's journal using criterion.

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memtx_core::schema::{Table, TableBuilder};
use memtx_core::{DataType, Row, Value};
use memtx_storage::cache::InMemoryRowCache;
use memtx_storage::index_store::InMemoryIndexStore;
use memtx_storage::journal::Journal;
use std::collections::BTreeMap;

fn accounts_schema() -> Table {
    TableBuilder::new("accounts")
        .unwrap()
        .add_column("id", DataType::Int64)
        .unwrap()
        .add_column("balance", DataType::Int64)
        .unwrap()
        .add_primary_key(&["id"], false)
        .unwrap()
        .build()
        .unwrap()
}

fn new_journal(schema: &Table) -> Journal {
    let cache = Rc::new(RefCell::new(InMemoryRowCache::new()));
    let mut store = InMemoryIndexStore::new();
    store.register_table(schema);
    let mut scope = BTreeMap::new();
    scope.insert(schema.name().to_string(), schema.clone());
    Journal::new(scope, cache, Rc::new(RefCell::new(store)))
}

fn row(id: i64) -> Row {
    Row::new(id as u64, vec![Value::Int64(id), Value::Int64(0)])
}

fn insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_insert");
    let schema = accounts_schema();

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut journal = new_journal(&schema);
                let rows: Vec<Row> = (0..size).map(row).collect();
                journal.insert("accounts", rows).unwrap();
                black_box(journal)
            });
        });
    }

    group.finish();
}

fn insert_then_rollback_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_insert_then_rollback");
    let schema = accounts_schema();

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut journal = new_journal(&schema);
                let rows: Vec<Row> = (0..size).map(row).collect();
                journal.insert("accounts", rows).unwrap();
                journal.rollback().unwrap();
                black_box(journal)
            });
        });
    }

    group.finish();
}

fn update_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_update");
    let schema = accounts_schema();

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || {
                    let mut journal = new_journal(&schema);
                    let rows: Vec<Row> = (0..size).map(row).collect();
                    journal.insert("accounts", rows).unwrap();
                    journal
                },
                |mut journal| {
                    let updated: Vec<Row> = (0..size)
                        .map(|id| Row::new(id as u64, vec![Value::Int64(id), Value::Int64(id * 2)]))
                        .collect();
                    journal.update("accounts", updated).unwrap();
                    black_box(journal)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn insert_or_replace_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal_insert_or_replace");
    let schema = accounts_schema();
    let size = 10000i64;

    group.bench_function("half_new_half_existing", |b| {
        b.iter_batched(
            || {
                let mut journal = new_journal(&schema);
                let rows: Vec<Row> = (0..size / 2).map(row).collect();
                journal.insert("accounts", rows).unwrap();
                journal
            },
            |mut journal| {
                let rows: Vec<Row> = (0..size).map(row).collect();
                journal.insert_or_replace("accounts", rows).unwrap();
                black_box(journal)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    insert_benchmark,
    insert_then_rollback_benchmark,
    update_benchmark,
    insert_or_replace_benchmark,
);

criterion_main!(benches);
