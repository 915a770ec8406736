use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use vinculum::solver::constraints::all_different::AllDifferentConstraint;
use vinculum::solver::constraints::less_than::LessThanConstraint;
use vinculum::solver::node::NodeId;
use vinculum::solver::store::ConstraintStore;

fn all_different_store(n: usize) -> (ConstraintStore, Vec<NodeId>) {
    let mut store = ConstraintStore::new();
    let vars: Vec<NodeId> = (0..n)
        .map(|i| store.new_int_variable(format!("x{i}"), 1, n as i64))
        .collect();
    store
        .add_constraint(Box::new(AllDifferentConstraint::new(vars.clone())))
        .unwrap();
    (store, vars)
}

fn chain_store(n: usize) -> (ConstraintStore, Vec<NodeId>) {
    let mut store = ConstraintStore::new();
    let vars: Vec<NodeId> = (0..n)
        .map(|i| store.new_int_variable(format!("x{i}"), 1, 10 * n as i64))
        .collect();
    for pair in vars.windows(2) {
        store
            .add_constraint(Box::new(LessThanConstraint::new(pair[0], pair[1], true)))
            .unwrap();
    }
    (store, vars)
}

/// Drain cost of one full propagation episode over pairwise-distinct
/// variables after binding the first of them.
fn all_different_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("all-different propagation");
    for n in [8usize, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let (mut store, vars) = all_different_store(n);
                    store.propagate().unwrap();
                    store.set_value(vars[0], 1).unwrap();
                    store
                },
                |mut store| {
                    store.propagate().unwrap();
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Bounds changes rippling down a strict `<` chain, end to end.
fn bounds_chain_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounds chain propagation");
    for n in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let (mut store, vars) = chain_store(n);
                    store.propagate().unwrap();
                    store.set_min(vars[0], n as i64).unwrap();
                    store
                },
                |mut store| {
                    store.propagate().unwrap();
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// The transactional overhead search pays per edge: push, bind, propagate,
/// pop, with all the snapshotting and rollback that implies.
fn push_bind_pop_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("push/bind/pop cycle");
    for n in [8usize, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let (mut store, vars) = all_different_store(n);
            store.propagate().unwrap();
            b.iter(|| {
                store.push();
                store.set_value(vars[0], 1).unwrap();
                store.propagate().unwrap();
                store.pop();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    all_different_propagation,
    bounds_chain_propagation,
    push_bind_pop_cycle
);
criterion_main!(benches);
