// crates/driftfvm-device/src/layout.rs

//! Global unknown-vector layout.
//!
//! Offsets are assigned once, region-by-region in id order and node-by-node
//! in global-index order, then boundary extra unknowns in boundary order —
//! so electrode rows always sit at the tail of the vector where the last
//! rank owns them.

use crate::boundary::Boundary;
use crate::region::{Region, RegionKind};
use driftfvm_mesh::FvmGraph;

/// Physical model level; decides the per-node unknown stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelLevel {
    /// Nonlinear Poisson only: `{ψ}` everywhere.
    Poisson,
    /// Drift-diffusion level 1: `{ψ, n, p}` in semiconductors.
    Ddm1,
    /// Drift-diffusion level 2: level 1 plus lattice temperature.
    Ddm2,
}

/// Named unknowns within a per-node block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Var {
    /// Electrostatic potential.
    Psi,
    /// Electron density.
    N,
    /// Hole density.
    P,
    /// Lattice temperature.
    TLattice,
}

impl ModelLevel {
    /// Unknowns per FVM node for a region kind. The stride is fixed for
    /// the life of a solve.
    #[must_use]
    pub const fn stride(self, kind: RegionKind) -> usize {
        match (self, kind) {
            (Self::Poisson, _) => 1,
            (Self::Ddm1, RegionKind::Semiconductor) => 3,
            (Self::Ddm1, _) => 1,
            (Self::Ddm2, RegionKind::Semiconductor) => 4,
            (Self::Ddm2, _) => 2,
        }
    }

    /// Block index of a variable for a region kind, if the variable exists
    /// at this level.
    #[must_use]
    pub const fn var_index(self, kind: RegionKind, var: Var) -> Option<usize> {
        match var {
            Var::Psi => Some(0),
            Var::N => match (self, kind) {
                (Self::Ddm1 | Self::Ddm2, RegionKind::Semiconductor) => Some(1),
                _ => None,
            },
            Var::P => match (self, kind) {
                (Self::Ddm1 | Self::Ddm2, RegionKind::Semiconductor) => Some(2),
                _ => None,
            },
            Var::TLattice => match (self, kind) {
                (Self::Ddm2, RegionKind::Semiconductor) => Some(3),
                (Self::Ddm2, _) => Some(1),
                _ => None,
            },
        }
    }
}

/// Frozen offset tables for one solve.
#[derive(Clone, Debug)]
pub struct DofMap {
    /// Per-region unknown stride.
    pub stride: Vec<usize>,
    /// Per-region, per-FVM-node offset of the node's first unknown.
    pub node_offset: Vec<Vec<usize>>,
    /// Per-boundary offset of the attached scalar unknown (electrode
    /// potential, hub potential, integral charge), if any.
    pub bc_offset: Vec<Option<usize>>,
    /// Total unknown count.
    pub n_dofs: usize,
}

impl DofMap {
    /// Assign offsets in region-then-boundary order.
    #[must_use]
    pub fn build(
        regions: &[Region],
        graphs: &[FvmGraph],
        boundaries: &[Boundary],
        level: ModelLevel,
    ) -> Self {
        let mut next = 0usize;
        let mut stride = Vec::with_capacity(regions.len());
        let mut node_offset = Vec::with_capacity(regions.len());
        for region in regions {
            let s = level.stride(region.kind);
            stride.push(s);
            let graph = &graphs[region.id];
            let mut offsets = Vec::with_capacity(graph.n_nodes());
            for _ in 0..graph.n_nodes() {
                offsets.push(next);
                next += s;
            }
            node_offset.push(offsets);
        }

        let mut bc_offset = Vec::with_capacity(boundaries.len());
        for b in boundaries {
            if b.has_extra_unknown() {
                bc_offset.push(Some(next));
                next += 1;
            } else {
                bc_offset.push(None);
            }
        }

        Self {
            stride,
            node_offset,
            bc_offset,
            n_dofs: next,
        }
    }

    /// Global offset of `(region, fvm node)`'s first unknown.
    #[must_use]
    pub fn offset(&self, region: usize, fvm: usize) -> usize {
        self.node_offset[region][fvm]
    }
}
