#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use picolog::Engine;

fn setup_large_graph() -> Engine {
    let mut engine = Engine::new();
    let mut program = String::new();

    // 1000 nodes with 5 outgoing edges each
    for i in 0..1000 {
        for j in 0..5 {
            let next = (i + j + 1) % 1000;
            program.push_str(&format!("edge(node_{i}, node_{next}).\n"));
        }
    }
    program.push_str("reach(X, Y) :- edge(X, Y).\n");
    program.push_str("hop(X, Y) :- reach(X, Y).\n");

    engine.consult(&program).unwrap();
    engine
}

fn query_first_edge(c: &mut Criterion) {
    let mut engine = setup_large_graph();
    let goal = engine.parse_goal("hop(node_0, X)").unwrap();

    c.bench_function("query_first_edge", |b| {
        b.iter(|| black_box(engine.query(&goal).unwrap()));
    });
}

fn query_existence_check(c: &mut Criterion) {
    let mut engine = setup_large_graph();
    let goal = engine.parse_goal("hop(node_999, node_3)").unwrap();

    c.bench_function("query_existence_check", |b| {
        b.iter(|| black_box(engine.ask(&goal).unwrap()));
    });
}

fn query_missing(c: &mut Criterion) {
    let mut engine = setup_large_graph();
    let goal = engine.parse_goal("hop(node_0, nowhere)").unwrap();

    c.bench_function("query_missing", |b| {
        b.iter(|| black_box(engine.ask(&goal).unwrap()));
    });
}

criterion_group!(
    benches,
    query_first_edge,
    query_existence_check,
    query_missing
);
criterion_main!(benches);
