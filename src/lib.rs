//! waypath: cross-validated single-source shortest paths
//!
//! # Overview
//!
//! waypath computes shortest paths on weighted directed graphs three ways —
//! sequential edge relaxation (Bellman-Ford), a priority-queue frontier
//! (Dijkstra), and GPU-parallel relaxation via wgpu compute shaders — and
//! cross-checks that all of them agree within numerical tolerance. The GPU
//! engine is the point; the CPU algorithms are its ground truth.
//!
//! # Quick Start
//!
//! ```
//! use waypath::{bellman_ford, dijkstra, EdgeListGraph};
//!
//! // Mirrored chain: 0 -1.5- 1 -2.5- 2
//! let graph = EdgeListGraph::new(
//!     3,
//!     vec![[0, 1], [1, 0], [1, 2], [2, 1]],
//!     vec![1.5, 1.5, 2.5, 2.5],
//! )?;
//!
//! let reference = bellman_ford(&graph, 0);
//! assert_eq!(reference.distances, vec![0.0, 1.5, 4.0]);
//! assert_eq!(dijkstra(&graph, 0), reference.distances);
//! # Ok::<(), waypath::GraphError>(())
//! ```
//!
//! # Architecture
//!
//! - **Model**: immutable edge-list graph, validated at construction
//! - **Algorithms**: CPU references the accelerated path is checked against
//! - **GPU engine**: device buffers + iterative dispatch with host-side
//!   convergence detection (feature `gpu`, on by default)
//! - **Harness**: repetitions, elementwise comparison at `1e-6`, timing
//!   report

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithms;
pub mod harness;
pub mod loader;
pub mod model;

// GPU-parallel relaxation (optional)
#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export core types
pub use algorithms::{bellman_ford, dijkstra, relax_all_edges, RelaxationRun};
pub use harness::{
    HarnessConfig, HarnessError, TimingReport, TimingRow, ValidationHarness, TOLERANCE,
};
pub use loader::{load_graph, load_graph_with_rng, LoadError};
pub use model::{EdgeListGraph, GraphError, INFINITE_DISTANCE};

#[cfg(feature = "gpu")]
pub use gpu::{
    EngineError, GpuDevice, GpuDeviceError, KernelVariant, LaunchGeometry, RelaxEngine,
    RelaxSession, RunOptions, RunStats,
};

// Error type
pub use anyhow::{Error, Result};
