//! Graph-file loading with synthetic edge weights
//!
//! Input format: line 1 is `vertex_count edge_count`; the next `edge_count`
//! lines are `from to` pairs. Each pair is mirrored into two directed edges
//! sharing one synthetic positive weight, and vertex ids are relabeled
//! densely to `[0, distinct_count)` in order of first appearance — input
//! files routinely carry sparse ids, and the declared vertex count is
//! trusted less than the ids actually seen.

use crate::model::{EdgeListGraph, GraphError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Upper bound (exclusive) for synthetic edge weights.
pub const MAX_WEIGHT: f32 = 1e3;

/// Graph-file loading errors; all are fatal at load time
#[derive(Debug, Error)]
pub enum LoadError {
    /// File could not be read
    #[error("cannot read graph file: {0}")]
    Io(#[from] std::io::Error),

    /// A token was missing or not an integer
    #[error("line {line}: expected {expected}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What the parser was looking for
        expected: &'static str,
    },

    /// Fewer edge lines than the header declared
    #[error("header declared {declared} edges but the file holds {found}")]
    TruncatedEdgeList {
        /// Edge count from the header
        declared: usize,
        /// Edge lines actually present
        found: usize,
    },

    /// The relabeled edge list failed graph validation
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Load a graph, drawing synthetic weights from entropy
///
/// # Errors
///
/// Returns [`LoadError`] on I/O failures, malformed tokens, or a truncated
/// edge list.
pub fn load_graph(path: &Path) -> Result<EdgeListGraph, LoadError> {
    load_graph_with_rng(path, &mut SmallRng::from_entropy())
}

/// Load a graph with a caller-supplied weight generator
///
/// Splitting the generator out keeps loading deterministic under test seeds.
///
/// # Errors
///
/// Returns [`LoadError`] on I/O failures, malformed tokens, or a truncated
/// edge list.
pub fn load_graph_with_rng<R: Rng>(path: &Path, rng: &mut R) -> Result<EdgeListGraph, LoadError> {
    let text = fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or(LoadError::Parse {
        line: 1,
        expected: "`vertex_count edge_count` header",
    })?;
    let mut header_fields = header.split_whitespace();
    let _declared_vertices: u64 = parse_field(header_fields.next(), 1, "vertex count")?;
    let declared_edges: usize = parse_field(header_fields.next(), 1, "edge count")?;

    let mut relabel: HashMap<u64, u32> = HashMap::new();
    let mut dense = |id: u64| -> u32 {
        let next = relabel.len() as u32;
        *relabel.entry(id).or_insert(next)
    };

    let mut edges = Vec::with_capacity(declared_edges * 2);
    let mut weights = Vec::with_capacity(declared_edges * 2);
    let mut found = 0;

    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        if found == declared_edges {
            break;
        }

        let line_number = index + 1;
        let mut fields = line.split_whitespace();
        let from = dense(parse_field(fields.next(), line_number, "edge source")?);
        let to = dense(parse_field(fields.next(), line_number, "edge target")?);

        // One weight per input pair, shared by both mirrored directions
        let weight = rng.gen_range(f32::EPSILON..MAX_WEIGHT);
        edges.push([from, to]);
        weights.push(weight);
        edges.push([to, from]);
        weights.push(weight);

        found += 1;
    }

    if found < declared_edges {
        return Err(LoadError::TruncatedEdgeList {
            declared: declared_edges,
            found,
        });
    }

    let vertex_count = relabel.len() as u32;
    tracing::debug!(
        vertex_count,
        directed_edges = edges.len(),
        "graph loaded"
    );

    Ok(EdgeListGraph::new(vertex_count, edges, weights)?)
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    line: usize,
    expected: &'static str,
) -> Result<T, LoadError> {
    field
        .and_then(|token| token.parse().ok())
        .ok_or(LoadError::Parse { line, expected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_graph(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn seeded() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_loads_and_mirrors() {
        let file = write_graph("3 2\n0 1\n1 2\n");
        let graph = load_graph_with_rng(file.path(), &mut seeded()).unwrap();

        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.edges(), &[[0, 1], [1, 0], [1, 2], [2, 1]]);

        // Mirrored directions share one weight
        assert_eq!(graph.weights()[0], graph.weights()[1]);
        assert_eq!(graph.weights()[2], graph.weights()[3]);
        assert!(graph.weights().iter().all(|&w| w > 0.0 && w < MAX_WEIGHT));
    }

    #[test]
    fn test_sparse_ids_relabeled_densely() {
        let file = write_graph("1000 2\n100 900\n900 7\n");
        let graph = load_graph_with_rng(file.path(), &mut seeded()).unwrap();

        // First-appearance order: 100→0, 900→1, 7→2
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edges(), &[[0, 1], [1, 0], [1, 2], [2, 1]]);
    }

    #[test]
    fn test_vertex_count_is_distinct_count() {
        // Header over-declares; the ids actually seen win
        let file = write_graph("50 1\n3 4\n");
        let graph = load_graph_with_rng(file.path(), &mut seeded()).unwrap();
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = load_graph(Path::new("/nonexistent/graph.txt"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_empty_file() {
        let file = write_graph("");
        let result = load_graph_with_rng(file.path(), &mut seeded());
        assert!(matches!(result, Err(LoadError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_malformed_header() {
        let file = write_graph("three 2\n0 1\n1 2\n");
        let result = load_graph_with_rng(file.path(), &mut seeded());
        assert!(matches!(result, Err(LoadError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_malformed_edge_line() {
        let file = write_graph("3 2\n0 1\n1 x\n");
        let result = load_graph_with_rng(file.path(), &mut seeded());
        assert!(matches!(result, Err(LoadError::Parse { line: 3, .. })));
    }

    #[test]
    fn test_truncated_edge_list() {
        let file = write_graph("3 5\n0 1\n1 2\n");
        let result = load_graph_with_rng(file.path(), &mut seeded());
        assert!(matches!(
            result,
            Err(LoadError::TruncatedEdgeList {
                declared: 5,
                found: 2
            })
        ));
    }

    #[test]
    fn test_deterministic_under_seed() {
        let file = write_graph("3 2\n0 1\n1 2\n");
        let first = load_graph_with_rng(file.path(), &mut seeded()).unwrap();
        let second = load_graph_with_rng(file.path(), &mut seeded()).unwrap();
        assert_eq!(first.weights(), second.weights());
    }
}
