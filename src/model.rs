//! Edge-list graph model shared by every shortest-path backend
//!
//! # Layout
//!
//! ```text
//! Graph: 0 → 1 (2.0), 1 → 0 (2.0), 1 → 2 (3.5), 2 → 1 (3.5)
//!
//! edges:   [[0, 1], [1, 0], [1, 2], [2, 1]]   // directed [from, to] pairs
//! weights: [2.0,    2.0,    3.5,    3.5   ]   // index-aligned with edges
//! ```
//!
//! Undirected inputs are materialized as mirrored pairs sharing one weight
//! (see [`crate::loader`]), but nothing here depends on that: the edge list
//! is treated as opaque directed pairs. The flat `[u32; 2]` layout is the
//! same bytes the GPU engine uploads, so no repacking happens at bind time.

use thiserror::Error;

/// Sentinel distance for vertices no path has reached yet.
pub const INFINITE_DISTANCE: f32 = 1e12;

/// Errors from graph construction
#[derive(Debug, Error)]
pub enum GraphError {
    /// Edge and weight lists disagree in length
    #[error("edge list has {edges} entries but weight list has {weights}")]
    LengthMismatch {
        /// Number of edges supplied
        edges: usize,
        /// Number of weights supplied
        weights: usize,
    },

    /// An edge endpoint is outside `[0, vertex_count)`
    #[error("edge {index} endpoint {vertex} out of range (vertex count {vertex_count})")]
    VertexOutOfRange {
        /// Position of the offending edge
        index: usize,
        /// The out-of-range endpoint
        vertex: u32,
        /// Number of vertices in the graph
        vertex_count: u32,
    },

    /// A weight is negative, NaN, or infinite
    #[error("weight {weight} at edge {index} is not a finite non-negative value")]
    InvalidWeight {
        /// Position of the offending edge
        index: usize,
        /// The rejected weight
        weight: f32,
    },
}

/// Immutable weighted directed graph in edge-list form
///
/// Owned by the caller and borrowed by all algorithms; construction validates
/// every invariant once so the relaxation loops can index without checks.
///
/// # Example
///
/// ```
/// use waypath::EdgeListGraph;
///
/// let graph = EdgeListGraph::new(3, vec![[0, 1], [1, 2]], vec![2.0, 3.5]).unwrap();
/// assert_eq!(graph.vertex_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EdgeListGraph {
    vertex_count: u32,
    edges: Vec<[u32; 2]>,
    weights: Vec<f32>,
}

impl EdgeListGraph {
    /// Build a graph from directed `[from, to]` pairs and aligned weights
    ///
    /// # Errors
    ///
    /// Returns `GraphError` if the lists disagree in length, an endpoint is
    /// outside `[0, vertex_count)`, or a weight is negative or non-finite.
    pub fn new(
        vertex_count: u32,
        edges: Vec<[u32; 2]>,
        weights: Vec<f32>,
    ) -> Result<Self, GraphError> {
        if edges.len() != weights.len() {
            return Err(GraphError::LengthMismatch {
                edges: edges.len(),
                weights: weights.len(),
            });
        }

        for (index, edge) in edges.iter().enumerate() {
            for &vertex in edge {
                if vertex >= vertex_count {
                    return Err(GraphError::VertexOutOfRange {
                        index,
                        vertex,
                        vertex_count,
                    });
                }
            }
        }

        for (index, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GraphError::InvalidWeight { index, weight });
            }
        }

        Ok(Self {
            vertex_count,
            edges,
            weights,
        })
    }

    /// Number of vertices
    #[must_use]
    pub const fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of directed edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Directed `[from, to]` pairs, in insertion order
    #[must_use]
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    /// Edge weights, index-aligned with [`Self::edges`]
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Adjacency structure: for each vertex, its outgoing `(weight, target)` list
    ///
    /// Built on demand; the priority-queue algorithm constructs it once per
    /// invocation.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<(f32, u32)>> {
        let mut adjacency = vec![Vec::new(); self.vertex_count as usize];
        for (edge, &weight) in self.edges.iter().zip(&self.weights) {
            adjacency[edge[0] as usize].push((weight, edge[1]));
        }
        adjacency
    }
}
