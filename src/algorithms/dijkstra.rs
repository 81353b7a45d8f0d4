//! Priority-queue shortest paths (Dijkstra)
//!
//! Valid only for non-negative weights, which graph construction guarantees.
//! Uses lazy deletion instead of decrease-key: every improvement pushes a
//! fresh heap entry, and popped entries worse than the vertex's current best
//! are stale and skipped.
//!
//! # Example
//!
//! ```
//! use waypath::{dijkstra, EdgeListGraph};
//!
//! let graph = EdgeListGraph::new(3, vec![[0, 1], [1, 2], [0, 2]], vec![1.0, 2.0, 5.0]).unwrap();
//! let distances = dijkstra(&graph, 0);
//! assert_eq!(distances[2], 3.0); // via vertex 1, not the direct 5.0 edge
//! ```

use crate::model::{EdgeListGraph, INFINITE_DISTANCE};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Frontier entry: cost from the source plus the vertex it reaches
#[derive(Clone, Copy)]
struct State {
    cost: f32,
    vertex: u32,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.vertex == other.vertex
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.vertex.cmp(&other.vertex))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute single-source shortest paths with a priority-queue frontier
///
/// Builds the adjacency structure once from the edge list, then expands the
/// cheapest frontier vertex until the frontier empties. Output matches
/// [`crate::bellman_ford`] within tolerance for any non-negative-weight
/// graph. Unreached vertices hold [`INFINITE_DISTANCE`].
#[must_use]
pub fn dijkstra(graph: &EdgeListGraph, source: u32) -> Vec<f32> {
    let mut distances = vec![INFINITE_DISTANCE; graph.vertex_count() as usize];
    if source >= graph.vertex_count() {
        return distances;
    }

    let adjacency = graph.adjacency();
    let mut frontier = BinaryHeap::new();

    distances[source as usize] = 0.0;
    frontier.push(State {
        cost: 0.0,
        vertex: source,
    });

    while let Some(State { cost, vertex }) = frontier.pop() {
        // Stale entry: a cheaper path to this vertex was already expanded
        if cost > distances[vertex as usize] {
            continue;
        }

        for &(weight, target) in &adjacency[vertex as usize] {
            let candidate = cost + weight;
            if candidate < distances[target as usize] {
                distances[target as usize] = candidate;
                frontier.push(State {
                    cost: candidate,
                    vertex: target,
                });
            }
        }
    }

    distances
}
