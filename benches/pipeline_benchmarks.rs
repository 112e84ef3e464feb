//! Generation pipeline benchmarks: compile and generate over varying dataset sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use loom_dsl::dataset::Generator;
use loom_dsl::{compile, Program};
use std::time::Duration;

fn flat_program(size: u32) -> Program {
    compile(&format!(
        "schema Invoice {{ amount: decimal in 1..1000, status: 0.7:\"paid\" | 0.3:\"draft\" }}\n\
         dataset T {{ invoices: {size} * Invoice }}"
    ))
    .expect("source compiles")
}

fn constrained_program(size: u32) -> Program {
    compile(&format!(
        "schema Invoice {{ issued: int in 1..100, due: int in 1..200, assume due >= issued }}\n\
         dataset T {{ invoices: {size} * Invoice }}"
    ))
    .expect("source compiles")
}

fn nested_program(parents: u32) -> Program {
    compile(&format!(
        "schema C {{ id: unique int in 1..1000000 }}\n\
         schema I {{ parent_id: = ^id, n: int in 1..3 }}\n\
         dataset T {{ c: {parents} * C, i: 2..4 per c * I }}"
    ))
    .expect("source compiles")
}

fn bench_flat_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_generation");
    for size in [100u32, 1_000, 10_000] {
        let program = flat_program(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| Generator::generate(&program, u64::from(size)).unwrap());
        });
    }
    group.finish();
}

fn bench_constrained_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("constrained_generation");
    for size in [100u32, 1_000, 5_000] {
        let program = constrained_program(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| Generator::generate(&program, u64::from(size)).unwrap());
        });
    }
    group.finish();
}

fn bench_nested_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_collections");
    for parents in [50u32, 500, 2_000] {
        let program = nested_program(parents);
        group.bench_with_input(BenchmarkId::from_parameter(parents), &parents, |b, &parents| {
            b.iter(|| Generator::generate(&program, u64::from(parents)).unwrap());
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_flat_generation, bench_constrained_generation, bench_nested_collections
}
criterion_main!(benches);
