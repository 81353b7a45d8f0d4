//! Criterion benchmarks for the CPU shortest-path algorithms
//!
//! The interesting ratio is sequential relaxation vs the priority queue as
//! edge density grows; the harness reports the same ratio at runtime.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use waypath::{bellman_ford, dijkstra, EdgeListGraph};

/// Generate a mirrored pseudo-random graph (LCG for reproducibility)
fn generate_graph(vertex_count: u32, pairs_per_vertex: u32) -> EdgeListGraph {
    let mut edges = Vec::new();
    let mut weights = Vec::new();
    let mut rng_state = 12345_u64;

    for from in 0..vertex_count {
        for _ in 0..pairs_per_vertex {
            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            let to = (rng_state % u64::from(vertex_count)) as u32;
            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            #[allow(clippy::cast_precision_loss)]
            let weight = (rng_state % 1000) as f32 + 1.0;

            if to != from {
                edges.push([from, to]);
                weights.push(weight);
                edges.push([to, from]);
                weights.push(weight);
            }
        }
    }

    EdgeListGraph::new(vertex_count, edges, weights).unwrap()
}

fn bench_bellman_ford(c: &mut Criterion) {
    let mut group = c.benchmark_group("bellman_ford");

    for size in [100, 500, 1000, 5000] {
        let graph = generate_graph(size, 3);

        group.bench_with_input(BenchmarkId::new("relax", size), &graph, |b, graph| {
            b.iter(|| {
                let run = bellman_ford(black_box(graph), 0);
                black_box(run);
            });
        });
    }

    group.finish();
}

fn bench_dijkstra(c: &mut Criterion) {
    let mut group = c.benchmark_group("dijkstra");

    for size in [100, 500, 1000, 5000] {
        let graph = generate_graph(size, 3);

        group.bench_with_input(BenchmarkId::new("frontier", size), &graph, |b, graph| {
            b.iter(|| {
                let distances = dijkstra(black_box(graph), 0);
                black_box(distances);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bellman_ford, bench_dijkstra);
criterion_main!(benches);
