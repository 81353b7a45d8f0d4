//! GPU-parallel relaxation
//!
//! # Architecture
//!
//! - `device`: wgpu device handles and adapter enumeration
//! - `geometry`: launch sizing and per-variant edge partitioning
//! - `ordered`: the order-preserving f32/u32 encoding behind atomic-minimum
//! - `engine`: buffer lifecycle and the dispatch/convergence protocol
//! - `shaders/`: WGSL compute kernels, one file per variant
//!
//! # Feature Flag
//!
//! This module is only available with the `gpu` feature flag (on by
//! default):
//! ```bash
//! cargo build --no-default-features   # CPU algorithms only
//! ```

mod device;
mod engine;
mod geometry;
mod ordered;

pub use device::{GpuDevice, GpuDeviceError};
pub use engine::{EngineError, RelaxEngine, RelaxSession, RunOptions, RunStats};
pub use geometry::{KernelVariant, LaunchGeometry, WORKGROUP_SIZE};
pub use ordered::{bits_to_distance, distance_to_bits};
