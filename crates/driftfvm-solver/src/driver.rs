// crates/driftfvm-solver/src/driver.rs

//! Global assembly driver.
//!
//! Fixed order on both the residual and the Jacobian: per-region volume
//! assembly, hanging-node reconstruction, boundary preprocess (collect
//! clear/merge lists), flush + apply merges + zero cleared rows, boundary
//! equation writes, final assembly. The electrode-trace routine reads the
//! converged Jacobian back to build the small-signal `(∂I/∂x, ∂F/∂V_e)`
//! pair.

use anyhow::{bail, Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, ModelLevel, RegionKind, System};

use crate::bc::{self, BcScratch};
use crate::params::SolveParams;
use crate::proto::ClearLists;
use crate::{ddm1, ddm2, hanging, poisson};

fn flush_vec(f: &mut SysVector, mode: &mut AssemblyMode) {
    f.assembly_begin();
    f.assembly_end();
    *mode = AssemblyMode::NotSet;
}

/// Assemble the global residual at `x` into `f`.
pub fn assemble_function(
    sys: &mut System,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    scratch: &mut Vec<BcScratch>,
) -> Result<()> {
    if x.len() != sys.n_dofs() {
        bail!("solution vector has {} entries, system has {} dofs", x.len(), sys.n_dofs());
    }
    scratch.resize_with(sys.boundaries.len(), BcScratch::default);
    f.zero_entries();
    let mut mode = AssemblyMode::NotSet;

    for r in 0..sys.regions.len() {
        match (sys.level, sys.regions[r].kind) {
            (ModelLevel::Poisson, RegionKind::Semiconductor) => {
                poisson::semiconductor_poisson_function(sys, r, comm, x, f, &mut mode)?;
            }
            (ModelLevel::Ddm1, RegionKind::Semiconductor) => {
                ddm1::ddm1_function(sys, r, comm, params, x, f, &mut mode)?;
            }
            (ModelLevel::Ddm2, RegionKind::Semiconductor) => {
                ddm2::ddm2_function(sys, r, comm, params, x, f, &mut mode)?;
            }
            _ => poisson::simple_region_function(sys, r, comm, params, x, f, &mut mode)?,
        }
    }

    for r in 0..sys.regions.len() {
        hanging::hanging_function(sys, r, comm, x, f, &mut mode)?;
    }

    // The boundary layer reads the assembled residual (terminal currents)
    // before any row is cleared.
    flush_vec(f, &mut mode);
    let mut lists = ClearLists::default();
    for b in 0..sys.boundaries.len() {
        bc::function_preprocess(sys, b, comm, f, &mut lists, &mut scratch[b])
            .with_context(|| format!("preprocessing boundary '{}'", sys.boundaries[b].label))?;
    }
    f.add_row_to_row(&lists.src_row, &lists.dst_row, &lists.alpha)?;
    f.zero_rows(&lists.clear_row);

    for b in 0..sys.boundaries.len() {
        bc::function(sys, b, comm, params, x, f, &mut mode, &scratch[b])
            .with_context(|| format!("assembling boundary '{}'", sys.boundaries[b].label))?;
    }

    flush_vec(f, &mut mode);
    Ok(())
}

/// Assemble the global Jacobian at `x` into `jac`.
pub fn assemble_jacobian(
    sys: &System,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    jac: &mut SysMatrix,
    scratch: &mut Vec<BcScratch>,
) -> Result<()> {
    if x.len() != sys.n_dofs() {
        bail!("solution vector has {} entries, system has {} dofs", x.len(), sys.n_dofs());
    }
    scratch.resize_with(sys.boundaries.len(), BcScratch::default);
    jac.zero_entries();
    let mut mode = AssemblyMode::NotSet;

    // Pre-touch the boundary sparsity so later Adds never relocate.
    for b in 0..sys.boundaries.len() {
        bc::jacobian_reserve(sys, b, comm, jac, &mut mode)?;
    }

    for r in 0..sys.regions.len() {
        match (sys.level, sys.regions[r].kind) {
            (ModelLevel::Poisson, RegionKind::Semiconductor) => {
                poisson::semiconductor_poisson_jacobian(sys, r, comm, x, jac, &mut mode)?;
            }
            (ModelLevel::Ddm1, RegionKind::Semiconductor) => {
                ddm1::ddm1_jacobian(sys, r, comm, params, x, jac, &mut mode)?;
            }
            (ModelLevel::Ddm2, RegionKind::Semiconductor) => {
                ddm2::ddm2_jacobian(sys, r, comm, params, x, jac, &mut mode)?;
            }
            _ => poisson::simple_region_jacobian(sys, r, comm, params, x, jac, &mut mode)?,
        }
    }

    for r in 0..sys.regions.len() {
        hanging::hanging_jacobian(sys, r, comm, x, jac, &mut mode)?;
    }

    jac.flush_assembly();
    mode = AssemblyMode::NotSet;
    let mut lists = ClearLists::default();
    for b in 0..sys.boundaries.len() {
        bc::jacobian_preprocess(sys, b, comm, params, jac, &mut lists, &mut scratch[b])
            .with_context(|| format!("preprocessing boundary '{}'", sys.boundaries[b].label))?;
    }
    jac.add_row_to_row(&lists.src_row, &lists.dst_row, &lists.alpha)?;
    jac.zero_rows(&lists.clear_row, 0.0)?;

    for b in 0..sys.boundaries.len() {
        bc::jacobian(sys, b, comm, params, x, jac, &mut mode, &scratch[b])
            .with_context(|| format!("assembling boundary '{}'", sys.boundaries[b].label))?;
    }

    jac.final_assembly();
    Ok(())
}

/// Seed the initial guess (region state plus boundary `fill_value` rows)
/// and the diagonal scale vector.
pub fn fill_initial_guess(
    sys: &System,
    comm: &dyn Communicator,
) -> Result<(Vec<f64>, SysVector)> {
    let mut x = SysVector::new(sys.n_dofs());
    let mut l = SysVector::new(sys.n_dofs());
    let guess = sys.initial_guess();
    let idx: Vec<usize> = (0..guess.len()).collect();
    x.set_values(&idx, &guess, AssemblyMode::Insert)?;
    for b in 0..sys.boundaries.len() {
        bc::fill_value(sys, b, comm, &mut x, &mut l)?;
    }
    x.assembly_begin();
    x.assembly_end();
    Ok((x.as_slice().to_vec(), l))
}

/// Linearised electrode response at a converged point: `∂I/∂x` from the
/// assembled carrier rows (or the metal conduction flux for a solder
/// pad), `∂F/∂V_e` marking the rows that carry the electrode potential,
/// and the electrode row neutralised so the trace excludes the external
/// resistance.
pub fn electrode_trace(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    jac: &mut SysMatrix,
) -> Result<(SysVector, SysVector)> {
    let b = &sys.boundaries[bc];
    let bc_row = sys.dofs.bc_offset[bc]
        .with_context(|| format!("boundary '{}' has no electrode row", b.label))?;
    let scale = crate::bc::ohmic::current_scale(sys);
    let rank = comm.rank();

    let mut pd_i = SysVector::new(sys.n_dofs());
    let mut pd_f = SysVector::new(sys.n_dofs());

    for bd in &b.nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Semiconductor => {
                    let stride = sys.dofs.stride[region];
                    let grab = |cols: &[usize]| -> Vec<f64> {
                        let a1 = jac.get_values(base + 1, cols);
                        let a2 = jac.get_values(base + 2, cols);
                        a1.iter().zip(&a2).map(|(n, p)| (n - p) * scale).collect()
                    };
                    let rows: Vec<usize> = (base..base + stride).collect();
                    pd_i.set_values(&rows, &grab(&rows), AssemblyMode::Add)?;
                    for &(nb, _, _) in &sys.graphs[region].nodes[fvm].neighbors {
                        let nb_base = sys.offset(region, nb);
                        let cols: Vec<usize> = (nb_base..nb_base + stride).collect();
                        pd_i.set_values(&cols, &grab(&cols), AssemblyMode::Add)?;
                    }
                    pd_f.set_value(base, 1.0, AssemblyMode::Add)?;
                }
                RegionKind::Metal => {
                    let sigma = sys.regions[region].material.conductance;
                    for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                        let nb_base = sys.offset(region, nb);
                        let g = area * sigma / len * scale;
                        pd_i.set_value(base, g, AssemblyMode::Add)?;
                        pd_i.set_value(nb_base, -g, AssemblyMode::Add)?;
                    }
                    pd_f.set_value(base, 1.0, AssemblyMode::Add)?;
                }
                _ => {}
            }
        }
    }
    pd_i.assembly_begin();
    pd_i.assembly_end();
    pd_f.assembly_begin();
    pd_f.assembly_end();

    // Drop the external-resistance contribution for the trace step.
    jac.zero_rows(&[bc_row], 1.0)?;
    Ok((pd_i, pd_f))
}
