//! Launch geometry and per-variant edge partitioning
//!
//! A relax dispatch spreads hardware lanes across the edge index range; how
//! edges map onto lanes is a per-variant strategy, kept out of the engine so
//! each variant's coverage can be checked host-side instead of trusted.
//!
//! - [`KernelVariant::PerEdge`]: one lane per edge, lane count aligned up to
//!   the workgroup size.
//! - [`KernelVariant::Folded`]: the aligned per-edge lane count is divided by
//!   the workgroup size and re-aligned; each lane walks a contiguous block of
//!   `WORKGROUP_SIZE` edges. Far fewer lanes touch far more memory each.

use std::ops::Range;

/// Lanes per hardware workgroup for every kernel in this crate.
pub const WORKGROUP_SIZE: u32 = 256;

/// Round `n` up to the next multiple of `size`
const fn align_up(n: u32, size: u32) -> u32 {
    match n % size {
        0 => n,
        rem => n - rem + size,
    }
}

/// Edge-partitioning strategy, one per compiled relax kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelVariant {
    /// One edge per lane
    PerEdge,
    /// One `WORKGROUP_SIZE` block of edges per lane
    Folded,
}

impl KernelVariant {
    /// All variants, in the order the harness enumerates them
    pub const ALL: [Self; 2] = [Self::PerEdge, Self::Folded];

    /// Human-readable label used in timing reports and diagnostics
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PerEdge => "per-edge",
            Self::Folded => "folded",
        }
    }

    /// WGSL source carrying this variant's `init_distances` and `relax_pass`
    /// entry points
    #[must_use]
    pub const fn shader_source(self) -> &'static str {
        match self {
            Self::PerEdge => include_str!("shaders/relax.wgsl"),
            Self::Folded => include_str!("shaders/relax_folded.wgsl"),
        }
    }

    /// Total lanes to launch for a relax pass over `edge_count` edges
    #[must_use]
    pub const fn relax_lane_count(self, edge_count: u32) -> u32 {
        let aligned = align_up(edge_count, WORKGROUP_SIZE);
        match self {
            Self::PerEdge => aligned,
            Self::Folded => align_up(aligned / WORKGROUP_SIZE, WORKGROUP_SIZE),
        }
    }

    /// Half-open edge range the given lane relaxes; empty past the end
    ///
    /// Mirrors the index arithmetic in the variant's shader exactly.
    #[must_use]
    pub fn lane_edges(self, lane: u32, edge_count: u32) -> Range<u32> {
        let (start, len) = match self {
            Self::PerEdge => (lane, 1),
            Self::Folded => (lane.saturating_mul(WORKGROUP_SIZE), WORKGROUP_SIZE),
        };
        let start = start.min(edge_count);
        start..start.saturating_add(len).min(edge_count)
    }

    /// Host-side proof that a dispatch visits every edge exactly once
    #[must_use]
    pub fn covers_all_edges(self, edge_count: u32) -> bool {
        let mut visits = vec![0u32; edge_count as usize];
        for lane in 0..self.relax_lane_count(edge_count) {
            for edge in self.lane_edges(lane, edge_count) {
                visits[edge as usize] += 1;
            }
        }
        visits.iter().all(|&count| count == 1)
    }
}

/// Dispatch sizes for one bound session
#[derive(Debug, Clone, Copy)]
pub struct LaunchGeometry {
    /// Lanes for `init_distances` (vertex range, aligned)
    pub init_lanes: u32,
    /// Lanes for `relax_pass` (variant partition, aligned)
    pub relax_lanes: u32,
}

impl LaunchGeometry {
    /// Compute geometry for a graph under the given variant
    #[must_use]
    pub const fn new(variant: KernelVariant, vertex_count: u32, edge_count: u32) -> Self {
        Self {
            init_lanes: align_up(vertex_count, WORKGROUP_SIZE),
            relax_lanes: variant.relax_lane_count(edge_count),
        }
    }

    /// Workgroups to dispatch for the init kernel
    #[must_use]
    pub const fn init_workgroups(&self) -> u32 {
        let groups = self.init_lanes / WORKGROUP_SIZE;
        if groups == 0 {
            1
        } else {
            groups
        }
    }

    /// Workgroups to dispatch for the relax kernel
    #[must_use]
    pub const fn relax_workgroups(&self) -> u32 {
        let groups = self.relax_lanes / WORKGROUP_SIZE;
        if groups == 0 {
            1
        } else {
            groups
        }
    }
}
