// crates/driftfvm-solver/src/bc/ohmic.rs

//! Ohmic contact: equilibrium carrier pinning on the semiconductor rows,
//! potential (and temperature) slaving of co-located nodes in other
//! regions, and the external-circuit equation closed through the
//! integrated terminal current.
//!
//! Under Fermi statistics the electrode potential doubles as both carrier
//! quasi-Fermi levels; that approximation degrades at high injection.

use anyhow::{Context, Result};

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, ModelLevel, RegionKind, System, Var};
use driftfvm_math::{fermi_half, Dual, Scalar};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add, ClearLists};

use super::{electrode_row_jacobian_tail, electrode_row_residual, hub_coupling_scale, BcScratch};

/// Terminal-current scale: device z-extent for 2D meshes, 1 otherwise.
pub(crate) fn current_scale(sys: &System) -> f64 {
    if sys.mesh.dim == 2 {
        sys.z_width
    } else {
        1.0
    }
}

/// The ohmic governing equations of one semiconductor node, generic over
/// the AD scalar. Returns `(f_psi, f_n, f_p)`.
#[allow(clippy::too_many_arguments)]
fn ohmic_equations<S: Scalar>(
    fermi: bool,
    psi: S,
    n: S,
    p: S,
    t: S,
    ve: S,
    affinity: f64,
    net_doping: f64,
    nie: S,
    nc: S,
    nv: S,
    eg: S,
) -> (S, S, S) {
    let vt = t * (driftfvm_math::units::KB / driftfvm_math::units::Q);
    if fermi {
        let ec = -(psi + affinity);
        let ev = ec - eg;
        let etan = (-ve - ec) / vt;
        let etap = (ev + ve) / vt;
        let nf = nc * fermi_half(etan);
        let pf = nv * fermi_half(etap);
        (nf - pf - net_doping, n - nf, p - pf)
    } else {
        let f_psi = psi - vt * (S::from_f64(net_doping) / (nie * 2.0)).asinh()
            + eg / 2.0
            + vt * (nc / nv).ln() / 2.0
            + affinity
            - ve;
        // Majority carrier from charge neutrality, minority from mass action.
        let disc = (nie * nie * 4.0 + net_doping * net_doping).sqrt();
        let (n0, p0) = if net_doping < 0.0 {
            let p0 = (disc - net_doping) / 2.0;
            (nie * nie / p0, p0)
        } else {
            let n0 = (disc + net_doping) / 2.0;
            (n0, nie * nie / n0)
        };
        (f_psi, n - n0, p - p0)
    }
}

/// Preprocess: clear the semiconductor `{ψ,n,p}` rows (reading the
/// conduction current out of the carrier rows first), slave the other
/// regions' ψ rows, and at level 2 merge their heat rows onto the
/// semiconductor lattice-temperature row.
pub fn function_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    f: &SysVector,
    lists: &mut ClearLists,
    scratch: &mut BcScratch,
) -> Result<()> {
    scratch.current_buffer.clear();
    let heat = sys.level == ModelLevel::Ddm2;
    let rank = comm.rank();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        let mut semi_t_row = None;
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Semiconductor => {
                    lists.clear_row.push(base);
                    if sys.dofs.stride[region] >= 3 {
                        lists.clear_row.extend([base + 1, base + 2]);
                        // The electron and hole rows still hold the assembled
                        // conduction currents: I = In - Ip.
                        scratch.current_buffer.push(f.get(base + 1) - f.get(base + 2));
                    }
                    if heat {
                        semi_t_row = Some(base + 3);
                    }
                }
                RegionKind::Electrode | RegionKind::Insulator | RegionKind::Metal => {
                    lists.clear_row.push(base);
                    if heat {
                        let ti = sys
                            .var_index(region, Var::TLattice)
                            .context("level-2 region lost its temperature row")?;
                        if let Some(dst) = semi_t_row {
                            lists.redirect(base + ti, dst, 1.0);
                        }
                        lists.clear_row.push(base + ti);
                    }
                }
                RegionKind::Vacuum | RegionKind::Pml => {}
            }
        }
    }
    Ok(())
}

/// Residual hook.
#[allow(clippy::too_many_arguments)]
pub fn function(
    sys: &mut System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
    scratch: &BcScratch,
) -> Result<()> {
    ensure_vec_add(f, mode);

    let row = sys.dofs.bc_offset[bc].context("ohmic contact has no electrode row")?;
    let ve = x[row];
    let heat = sys.level == ModelLevel::Ddm2;
    let fermi = sys.fermi;
    let rank = comm.rank();
    let scale = current_scale(sys);
    let t_ext = sys.t_external;

    let mut current: f64 = scratch.current_buffer.iter().sum();
    let mut iy = Vec::new();
    let mut y = Vec::new();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        let semi = bd.rnodes[0];
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Semiconductor => {
                    let m = sys.regions[region].material;
                    let d = &sys.node_data[region][fvm];
                    let carriers = sys.dofs.stride[region] >= 3;
                    let t = if heat { x[base + 3] } else { t_ext };
                    let (n, p) = if carriers {
                        (x[base + 1], x[base + 2])
                    } else {
                        (0.0, 0.0)
                    };
                    let (f_psi, f_n, f_p) = ohmic_equations(
                        fermi,
                        x[base],
                        n,
                        p,
                        t,
                        ve,
                        d.affinity,
                        d.net_doping(),
                        m.nie(t),
                        m.nc(t),
                        m.nv(t),
                        m.eg(t),
                    );
                    iy.push(base);
                    y.push(f_psi);
                    if carriers {
                        iy.extend_from_slice(&[base + 1, base + 2]);
                        y.extend_from_slice(&[f_n, f_p]);
                    }

                    if heat {
                        let h = sys.boundaries[bc].params.heat_transfer;
                        let area = sys.graphs[region].nodes[fvm].boundary_area;
                        iy.push(base + 3);
                        y.push(h * (t_ext - t) * area);
                    }

                    // Displacement current through the contact faces.
                    if params.time_dependent {
                        for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                            let nb_base = sys.offset(region, nb);
                            let dn = &sys.node_data[region][nb];
                            let de_dt = params.ddt(
                                x[base] - x[nb_base],
                                d.psi - dn.psi,
                                d.psi_last - dn.psi_last,
                            ) / len;
                            current += area * d.eps * de_dt;
                        }
                    }
                }
                RegionKind::Electrode | RegionKind::Insulator | RegionKind::Metal => {
                    let semi_base = sys.offset(semi.0, semi.1);
                    iy.push(base);
                    y.push(x[base] - x[semi_base]);
                    if heat {
                        let ti = sys
                            .var_index(region, Var::TLattice)
                            .context("level-2 region lost its temperature row")?;
                        iy.push(base + ti);
                        y.push(x[base + ti] - x[semi_base + 3]);
                    }
                }
                RegionKind::Vacuum | RegionKind::Pml => {}
            }
        }
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    electrode_row_residual(sys, bc, comm, params, x, f, scale * current)?;
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian preprocess: buffer the `d(current)/dx` rows by reading the
/// assembled carrier rows back from the matrix, then queue the same
/// clear/merge lists as the residual side.
#[allow(clippy::too_many_arguments)]
pub fn jacobian_preprocess(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    _params: &SolveParams,
    jac: &SysMatrix,
    lists: &mut ClearLists,
    scratch: &mut BcScratch,
) -> Result<()> {
    scratch.buffer_cols.clear();
    scratch.buffer_jac.clear();
    let scale = current_scale(sys);
    let rank = comm.rank();

    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        let Some(&(region, fvm)) = bd
            .rnodes
            .iter()
            .find(|&&(r, _)| sys.regions[r].kind == RegionKind::Semiconductor)
        else {
            continue;
        };
        let stride = sys.dofs.stride[region];
        if stride < 3 {
            continue;
        }
        let base = sys.offset(region, fvm);
        let rows: Vec<usize> = (base..base + stride).collect();

        let mut grab = |cols: &[usize]| {
            let a1 = jac.get_values(base + 1, cols);
            let a2 = jac.get_values(base + 2, cols);
            let jn: Vec<f64> = a1
                .iter()
                .zip(&a2)
                .map(|(n, p)| (n - p) * scale)
                .collect();
            scratch.buffer_cols.push(cols.to_vec());
            scratch.buffer_jac.push(jn);
        };

        for &(nb, _, _) in &sys.graphs[region].nodes[fvm].neighbors {
            let nb_base = sys.offset(region, nb);
            let cols: Vec<usize> = (nb_base..nb_base + stride).collect();
            grab(&cols);
        }
        grab(&rows);
    }

    // Same row bookkeeping as the residual preprocess, sans the reads.
    let heat = sys.level == ModelLevel::Ddm2;
    for bd in &sys.boundaries[bc].nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        let mut semi_t_row = None;
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Semiconductor => {
                    lists.clear_row.push(base);
                    if sys.dofs.stride[region] >= 3 {
                        lists.clear_row.extend([base + 1, base + 2]);
                    }
                    if heat {
                        semi_t_row = Some(base + 3);
                    }
                }
                RegionKind::Electrode | RegionKind::Insulator | RegionKind::Metal => {
                    lists.clear_row.push(base);
                    if heat {
                        let ti = sys
                            .var_index(region, Var::TLattice)
                            .context("level-2 region lost its temperature row")?;
                        if let Some(dst) = semi_t_row {
                            lists.redirect(base + ti, dst, 1.0);
                        }
                        lists.clear_row.push(base + ti);
                    }
                }
                RegionKind::Vacuum | RegionKind::Pml => {}
            }
        }
    }
    Ok(())
}

/// Jacobian hook.
#[allow(clippy::too_many_arguments)]
pub fn jacobian(
    sys: &System,
    bc: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
    scratch: &BcScratch,
) -> Result<()> {
    ensure_mat_add(jac, mode);

    let bc_row = sys.dofs.bc_offset[bc].context("ohmic contact has no electrode row")?;
    let b = &sys.boundaries[bc];
    let ckt = b.ext_circuit.as_ref().context("ohmic contact has no circuit")?;
    let mna_scale = ckt.mna_scaling(params.dt);
    let hub_row = match b.hub {
        Some(h) => Some((
            sys.dofs.bc_offset[h].context("interconnect hub has no global offset")?,
            hub_coupling_scale(sys, h),
        )),
        None => None,
    };

    // d(current)/dx from the buffered row read-backs.
    for (cols, vals) in scratch.buffer_cols.iter().zip(&scratch.buffer_jac) {
        let scaled: Vec<f64> = vals.iter().map(|v| v * mna_scale).collect();
        jac.set_values(bc_row, cols, &scaled, AssemblyMode::Add)?;
        if let Some((hrow, hscale)) = hub_row {
            let hv: Vec<f64> = vals.iter().map(|v| v * hscale).collect();
            jac.set_values(hrow, cols, &hv, AssemblyMode::Add)?;
        }
    }

    let heat = sys.level == ModelLevel::Ddm2;
    let fermi = sys.fermi;
    let rank = comm.rank();
    let scale = current_scale(sys);
    let t_ext = sys.t_external;

    for bd in &b.nodes {
        if !sys.mesh.on_processor(bd.node, rank) {
            continue;
        }
        let semi = bd.rnodes[0];
        for &(region, fvm) in &bd.rnodes {
            let base = sys.offset(region, fvm);
            match sys.regions[region].kind {
                RegionKind::Semiconductor => {
                    let m = sys.regions[region].material;
                    let d = &sys.node_data[region][fvm];
                    let stride = sys.dofs.stride[region];
                    let carriers = stride >= 3;
                    let ndir = stride + 1;
                    let mut cols: Vec<usize> = (base..base + stride).collect();
                    cols.push(bc_row);

                    let psi = Dual::var(x[base], 0);
                    let (n, p) = if carriers {
                        (Dual::var(x[base + 1], 1), Dual::var(x[base + 2], 2))
                    } else {
                        (Dual::constant(0.0), Dual::constant(0.0))
                    };
                    let t = if heat {
                        Dual::var(x[base + 3], 3)
                    } else {
                        Dual::constant(t_ext)
                    };
                    let ve = Dual::var(x[bc_row], stride);

                    let (f_psi, f_n, f_p) = ohmic_equations(
                        fermi,
                        psi,
                        n,
                        p,
                        t,
                        ve,
                        d.affinity,
                        d.net_doping(),
                        m.nie(t),
                        m.nc(t),
                        m.nv(t),
                        m.eg(t),
                    );
                    jac.set_values(base, &cols, f_psi.grad(ndir), AssemblyMode::Add)?;
                    if carriers {
                        jac.set_values(base + 1, &cols, f_n.grad(ndir), AssemblyMode::Add)?;
                        jac.set_values(base + 2, &cols, f_p.grad(ndir), AssemblyMode::Add)?;
                    }

                    if heat {
                        let h = b.params.heat_transfer;
                        let area = sys.graphs[region].nodes[fvm].boundary_area;
                        let f_t = (-t + t_ext) * (h * area);
                        jac.set_values(base + 3, &cols, f_t.grad(ndir), AssemblyMode::Add)?;
                    }

                    // Displacement-current derivatives into the electrode row.
                    if params.time_dependent {
                        let factor = params.ddt_factor();
                        for &(nb, len, area) in &sys.graphs[region].nodes[fvm].neighbors {
                            let nb_base = sys.offset(region, nb);
                            let g = area * d.eps * factor / len * scale * mna_scale;
                            jac.set_value(bc_row, base, g, AssemblyMode::Add)?;
                            jac.set_value(bc_row, nb_base, -g, AssemblyMode::Add)?;
                        }
                    }
                }
                RegionKind::Electrode | RegionKind::Insulator | RegionKind::Metal => {
                    let semi_base = sys.offset(semi.0, semi.1);
                    jac.set_value(base, base, 1.0, AssemblyMode::Add)?;
                    jac.set_value(base, semi_base, -1.0, AssemblyMode::Add)?;
                    if heat {
                        let ti = sys
                            .var_index(region, Var::TLattice)
                            .context("level-2 region lost its temperature row")?;
                        jac.set_value(base + ti, base + ti, 1.0, AssemblyMode::Add)?;
                        jac.set_value(base + ti, semi_base + 3, -1.0, AssemblyMode::Add)?;
                    }
                }
                RegionKind::Vacuum | RegionKind::Pml => {}
            }
        }
    }

    electrode_row_jacobian_tail(sys, bc, comm, params, jac)?;
    *mode = AssemblyMode::Add;
    Ok(())
}
