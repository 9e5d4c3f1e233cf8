// crates/driftfvm-solver/src/bc/insulator_semi.rs

//! Insulator–semiconductor interface: the insulator-side displacement
//! flux merges onto the semiconductor Poisson row (which also receives
//! the fixed interface charge `Q_f`), and the insulator rows become
//! equality constraints against the semiconductor node.

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};
use driftfvm_math::units::Q;

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

use super::continuity;

/// Outside surface area of the interface at a boundary vertex; the tagged
/// faces may sit on either side, so take the larger accumulation.
fn interface_area(sys: &System, bd: &driftfvm_device::BdNode) -> f64 {
    bd.rnodes
        .iter()
        .map(|&(r, f)| sys.graphs[r].nodes[f].boundary_area)
        .fold(0.0, f64::max)
}

/// Preprocess is the ψ/T continuity merge.
pub fn function_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    lists: &mut ClearLists,
) -> Result<()> {
    continuity::function_preprocess(sys, bc, comm, lists, false)
}

/// Residual hook: continuity constraints plus the interface sheet charge
/// on the semiconductor Poisson row.
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    _params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    continuity::function(sys, bc, comm, x, f, mode, false)?;
    ensure_vec_add(f, mode);

    let qf = sys.boundaries[bc].params.qf;
    if qf != 0.0 {
        let rank = comm.rank();
        let mut iy = Vec::new();
        let mut y = Vec::new();
        for bd in &sys.boundaries[bc].nodes {
            if !sys.mesh.on_processor(bd.node, rank) {
                continue;
            }
            let (rp, fp) = bd.rnodes[0];
            iy.push(sys.offset(rp, fp));
            y.push(Q * qf * interface_area(sys, bd));
        }
        if !iy.is_empty() {
            f.set_values(&iy, &y, AssemblyMode::Add)?;
        }
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian hook: the sheet charge is constant, so the Jacobian is the
/// continuity one.
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    _params: &SolveParams,
    _x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);
    continuity::jacobian(sys, bc, comm, jac, mode, false)
}

#[cfg(test)]
mod tests {
    use driftfvm_device::Var;

    #[test]
    fn semiconductor_rows_stay_primary() {
        // The continuity merge anchors on rnodes[0]; region sorting places
        // the semiconductor first, so Var::Psi of the primary is index 0.
        assert_eq!(
            driftfvm_device::ModelLevel::Ddm1
                .var_index(driftfvm_device::RegionKind::Semiconductor, Var::Psi),
            Some(0)
        );
    }
}
