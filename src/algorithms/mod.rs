//! CPU reference algorithms the accelerated path is validated against

pub mod bellman_ford;
pub mod dijkstra;

pub use bellman_ford::{bellman_ford, relax_all_edges, RelaxationRun};
pub use dijkstra::dijkstra;
