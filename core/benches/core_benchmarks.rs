use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use passforge_core::dag::{Dag, Direction, NodeId};

/// Layered graph: `layers` rows of `width` nodes, every node wired to every
/// node of the next row.
fn layered(layers: usize, width: usize) -> (Dag<usize, ()>, NodeId) {
    let mut dag = Dag::new();
    let mut prev: Vec<NodeId> = Vec::new();
    for layer in 0..layers {
        let row: Vec<NodeId> = (0..width)
            .map(|i| dag.add_node(layer * width + i))
            .collect();
        for &from in &prev {
            for &to in &row {
                dag.add_edge(from, to, ());
            }
        }
        prev = row;
    }
    let sink = dag.add_node(usize::MAX);
    for &from in &prev {
        dag.add_edge(from, sink, ());
    }
    (dag, sink)
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

fn bench_topological_order_chain(c: &mut Criterion) {
    let (dag, _) = layered(64, 1);
    c.bench_function("dag_topological_order_64_chain", |b| {
        b.iter(|| black_box(&dag).topological_order());
    });
}

fn bench_topological_order_layered(c: &mut Criterion) {
    let (dag, _) = layered(16, 4);
    c.bench_function("dag_topological_order_16x4_layered", |b| {
        b.iter(|| black_box(&dag).topological_order());
    });
}

// ---------------------------------------------------------------------------
// Reachability and cloning
// ---------------------------------------------------------------------------

fn bench_upstream_reachability(c: &mut Criterion) {
    let (dag, sink) = layered(16, 4);
    c.bench_function("dag_reachable_upstream_16x4", |b| {
        b.iter(|| black_box(&dag).reachable(sink, Direction::Upstream));
    });
}

fn bench_clone_nodes(c: &mut Criterion) {
    c.bench_function("dag_clone_nodes_16x4", |b| {
        b.iter_with_setup(
            || layered(16, 4),
            |(mut dag, sink)| {
                let nodes = dag.reachable(sink, Direction::Upstream);
                black_box(dag.clone_nodes(&nodes, |_, n| *n, |_, _| ()));
            },
        );
    });
}

criterion_group!(
    benches,
    bench_topological_order_chain,
    bench_topological_order_layered,
    bench_upstream_reachability,
    bench_clone_nodes,
);
criterion_main!(benches);
