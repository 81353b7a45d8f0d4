//! Sequential edge relaxation (Bellman-Ford)
//!
//! The reference algorithm the other backends are validated against: scan
//! every edge in list order, improve the target's distance where possible,
//! and repeat full passes until one changes nothing. With non-negative
//! weights there is no negative cycle, so at most `vertex_count - 1` passes
//! can improve anything and the loop terminates.
//!
//! # Example
//!
//! ```
//! use waypath::{bellman_ford, EdgeListGraph};
//!
//! let graph = EdgeListGraph::new(3, vec![[0, 1], [1, 2]], vec![1.0, 2.0]).unwrap();
//! let run = bellman_ford(&graph, 0);
//! assert_eq!(run.distances, vec![0.0, 1.0, 3.0]);
//! ```

use crate::model::{EdgeListGraph, INFINITE_DISTANCE};

/// Outcome of a sequential relaxation run
#[derive(Debug, Clone)]
pub struct RelaxationRun {
    /// Shortest distance from the source per vertex; unreached entries hold
    /// [`INFINITE_DISTANCE`]
    pub distances: Vec<f32>,

    /// Number of full edge passes performed, including the final unchanged
    /// one (diagnostic)
    pub passes: usize,
}

/// Relax every edge once, in list order
///
/// Improves `distances[to]` wherever `distances[from]` is finite and
/// `distances[from] + weight` beats the current value. Returns whether any
/// entry changed. This is the unit the convergence loop and the
/// idempotence property are built on: once it returns `false`, running it
/// again leaves every distance untouched.
pub fn relax_all_edges(graph: &EdgeListGraph, distances: &mut [f32]) -> bool {
    let mut changed = false;

    for (edge, &weight) in graph.edges().iter().zip(graph.weights()) {
        let from = distances[edge[0] as usize];
        if from >= INFINITE_DISTANCE {
            continue;
        }

        let candidate = from + weight;
        if candidate < distances[edge[1] as usize] {
            distances[edge[1] as usize] = candidate;
            changed = true;
        }
    }

    changed
}

/// Compute single-source shortest paths by repeated edge relaxation
///
/// All distances start at [`INFINITE_DISTANCE`] except `distances[source] =
/// 0`. Passes repeat until one produces no change. A `source` outside the
/// vertex range yields all-infinite distances after a single pass.
#[must_use]
pub fn bellman_ford(graph: &EdgeListGraph, source: u32) -> RelaxationRun {
    let mut distances = vec![INFINITE_DISTANCE; graph.vertex_count() as usize];
    if let Some(entry) = distances.get_mut(source as usize) {
        *entry = 0.0;
    }

    let mut passes = 0;
    loop {
        passes += 1;
        if !relax_all_edges(graph, &mut distances) {
            break;
        }
    }

    RelaxationRun { distances, passes }
}
