#![allow(missing_docs)]

use std::fmt::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use picolog::Engine;

const PEANO: &str = "
nat(zero).
nat(s(N)) :- nat(N).
plus(zero, N, N).
plus(s(M), N, s(K)) :- plus(M, N, K).
";

/// `s(s(...(zero)))` with `n` successors
fn numeral(n: usize) -> String {
    let mut term = String::new();
    for _ in 0..n {
        term.push_str("s(");
    }
    term.push_str("zero");
    term.push_str(&")".repeat(n));
    term
}

fn edges(count: usize) -> String {
    let mut program = String::new();
    for i in 0..count {
        writeln!(program, "edge(node_{i}, node_{}).", i + 1).unwrap();
    }
    program
}

/// Benchmark for parsing and asserting a fact base
fn bench_load_facts(c: &mut Criterion) {
    let program = edges(1000);
    c.bench_function("load_facts", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.consult(black_box(&program)).unwrap();
            black_box(engine)
        });
    });
}

/// Benchmark for a long chain of rule applications
fn bench_deep_recursion(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.consult(PEANO).unwrap();
    let goal = engine.parse_goal(&format!("nat({})", numeral(200))).unwrap();

    c.bench_function("deep_recursion", |b| {
        b.iter(|| black_box(engine.ask(black_box(&goal)).unwrap()));
    });
}

/// Benchmark for building a result term through instantiation
fn bench_addition(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.consult(PEANO).unwrap();
    let goal = engine
        .parse_goal(&format!("plus({}, {}, R)", numeral(100), numeral(100)))
        .unwrap();

    c.bench_function("addition", |b| {
        b.iter(|| black_box(engine.query(black_box(&goal)).unwrap()));
    });
}

/// Benchmark for backtracking through every clause of a predicate
fn bench_backtracking(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.consult(&edges(1000)).unwrap();
    engine.consult("main :- edge(node_999, X).").unwrap();

    c.bench_function("backtracking", |b| {
        b.iter(|| black_box(engine.execute_main()));
    });
}

criterion_group!(
    benches,
    bench_load_facts,
    bench_deep_recursion,
    bench_addition,
    bench_backtracking
);
criterion_main!(benches);
