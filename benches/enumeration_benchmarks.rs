//! # Enumeration Engine Benchmarks
//!
//! Measures the lazy pipeline against plain std iterator chains and
//! imperative loops:
//! - map + filter pipelines across data sizes
//! - flatMap expansion
//! - grouping
//! - short-circuiting terminals (find) on large sources

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use funcoll::coll;
use itertools::Itertools;

/// Test record for benchmarking structured pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BenchRecord {
    pub id: u32,
    pub name: String,
    pub department: u32,
    pub active: bool,
}

impl BenchRecord {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            name: format!("Record {}", id),
            department: id % 7,
            active: id % 3 == 0,
        }
    }
}

/// Generate test data for benchmarking
pub fn generate_records(size: usize) -> Vec<BenchRecord> {
    (0..size).map(|i| BenchRecord::new(i as u32)).collect()
}

/// Benchmark: map + filter pipelines
pub fn benchmark_map_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_filter");

    for size in [100, 1000, 10000].iter() {
        let data = generate_records(*size);

        let snapshot = coll(data.clone());
        group.bench_with_input(BenchmarkId::new("pipeline", size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let result = snapshot
                    .filter(|r| r.active)
                    .map(|r| r.id * 2)
                    .to_vec()
                    .unwrap();
                black_box(result)
            })
        });

        group.bench_with_input(BenchmarkId::new("std_iterator", size), &data, |b, data| {
            b.iter(|| {
                let result: Vec<u32> = data
                    .iter()
                    .filter(|r| r.active)
                    .map(|r| r.id * 2)
                    .collect();
                black_box(result)
            })
        });

        group.bench_with_input(BenchmarkId::new("imperative", size), &data, |b, data| {
            b.iter(|| {
                let mut result = Vec::new();
                for record in data {
                    if record.active {
                        result.push(record.id * 2);
                    }
                }
                black_box(result)
            })
        });
    }

    group.finish();
}

/// Benchmark: flatMap expansion
pub fn benchmark_flat_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_map");

    for size in [100, 1000].iter() {
        let data: Vec<u32> = (0..*size as u32).collect();

        let snapshot = coll(data.clone());
        group.bench_with_input(BenchmarkId::new("pipeline", size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let result = snapshot
                    .flat_map(|x| vec![*x, x + 1, x + 2])
                    .to_vec()
                    .unwrap();
                black_box(result)
            })
        });

        group.bench_with_input(BenchmarkId::new("std_iterator", size), &data, |b, data| {
            b.iter(|| {
                let result: Vec<u32> =
                    data.iter().flat_map(|x| vec![*x, x + 1, x + 2]).collect();
                black_box(result)
            })
        });
    }

    group.finish();
}

/// Benchmark: grouping records by department
pub fn benchmark_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for size in [1000, 10000].iter() {
        let data = generate_records(*size);

        let snapshot = coll(data.clone());
        group.bench_with_input(BenchmarkId::new("pipeline", size), &snapshot, |b, snapshot| {
            b.iter(|| {
                let groups = snapshot.group_by(|r| r.department).unwrap();
                black_box(groups)
            })
        });

        group.bench_with_input(BenchmarkId::new("itertools", size), &data, |b, data| {
            b.iter(|| {
                let groups = data
                    .iter()
                    .cloned()
                    .map(|r| (r.department, r))
                    .into_group_map();
                black_box(groups)
            })
        });
    }

    group.finish();
}

/// Benchmark: short-circuiting find over a large source
pub fn benchmark_short_circuit_find(c: &mut Criterion) {
    let snapshot = coll(generate_records(100000));

    c.bench_function("find_early_match", |b| {
        b.iter(|| {
            // The match sits in the first batch; the pipeline pulls almost
            // nothing.
            let found = snapshot.find(|r| r.id == 3).unwrap();
            black_box(found)
        })
    });

    c.bench_function("find_late_match", |b| {
        b.iter(|| {
            let found = snapshot.find(|r| r.name == "Record 99999").unwrap();
            black_box(found)
        })
    });
}

criterion_group!(
    benches,
    benchmark_map_filter,
    benchmark_flat_map,
    benchmark_grouping,
    benchmark_short_circuit_find
);
criterion_main!(benches);
