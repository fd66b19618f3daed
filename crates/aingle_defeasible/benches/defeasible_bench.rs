//! Benchmarks for aingle_defeasible
//!
//! Run with: cargo bench -p aingle_defeasible

use aingle_defeasible::{Grounder, Interpreter, Literal, Program};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const BIRDS: &str = "
    bird(X) <- chicken(X).
    bird(X) <- penguin(X).
    ~flies(X) <- penguin(X).
    chicken(tina).
    penguin(tweety).
    scared(tina).
    flies(X) -< bird(X).
    flies(X) -< chicken(X), scared(X).
    nests_in_trees(X) -< flies(X).
    ~flies(X) -< chicken(X).
";

/// A chain of `size` edges with a transitive reachability rule.
fn chain(size: usize) -> String {
    let mut text = String::from(
        "reach(X, Y) <- edge(X, Y).\nreach(X, Z) <- edge(X, Y), reach(Y, Z).\n",
    );
    for i in 0..size {
        text.push_str(&format!("edge(n{}, n{}).\n", i, i + 1));
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_birds", |b| {
        b.iter(|| Program::parse(black_box(BIRDS)).unwrap());
    });
}

fn bench_ground(c: &mut Criterion) {
    let mut group = c.benchmark_group("ground");

    for size in [10, 25, 50].iter() {
        let program = Program::parse(&chain(*size)).unwrap();
        group.bench_with_input(BenchmarkId::new("chain", size), &program, |b, program| {
            b.iter(|| Grounder::new().ground(black_box(program)).unwrap());
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let program = Program::parse(BIRDS).unwrap();
    let queries: Vec<Literal> = ["flies(tina)", "~flies(tweety)", "nests_in_trees(tina)"]
        .iter()
        .map(|q| q.parse().unwrap())
        .collect();

    let mut group = c.benchmark_group("query");

    group.bench_function("birds_cold", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new(&program).unwrap();
            for query in &queries {
                black_box(interpreter.query(query).unwrap());
            }
        });
    });

    let mut warm = Interpreter::new(&program).unwrap();
    for query in &queries {
        warm.query(query).unwrap();
    }
    group.bench_function("birds_memoized", |b| {
        b.iter(|| warm.query(black_box(&queries[0])).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_ground, bench_query);
criterion_main!(benches);
