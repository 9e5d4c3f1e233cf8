// crates/driftfvm-solver/src/ddm1.rs

//! Level-1 drift-diffusion assembler for semiconductor regions:
//! `{ψ, n, p}` per node, Scharfetter–Gummel carrier fluxes along edges,
//! space charge and recombination in the control volumes.

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};
use driftfvm_math::units::{thermal_voltage, Q};
use driftfvm_math::{sg_flux_n, sg_flux_p, Dual};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add};

/// Per-edge coefficients that do not depend on the unknowns.
struct EdgeCoeffs {
    g_psi: f64,
    g_n: f64,
    g_p: f64,
}

fn edge_coeffs(sys: &System, region: usize, i1: usize, i2: usize, area: f64, len: f64) -> EdgeCoeffs {
    let m = sys.regions[region].material;
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let d1 = &sys.node_data[region][i1];
    let d2 = &sys.node_data[region][i2];
    let eps = 0.5 * (d1.eps + d2.eps);
    let mun = 0.5 * (m.mu_n::<f64>(d1.total_doping(), t) + m.mu_n::<f64>(d2.total_doping(), t));
    let mup = 0.5 * (m.mu_p::<f64>(d1.total_doping(), t) + m.mu_p::<f64>(d2.total_doping(), t));
    EdgeCoeffs {
        g_psi: eps * area / len,
        g_n: Q * mun * vt * area / len,
        g_p: Q * mup * vt * area / len,
    }
}

/// DDM-L1 residual for one semiconductor region.
pub fn ddm1_function(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);

    let graph = &sys.graphs[region];
    let m = sys.regions[region].material;
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let nie: f64 = m.nie(t);
    let rank = comm.rank();

    let mut iy = Vec::with_capacity(6 * graph.n_edges() + 3 * graph.n_nodes());
    let mut y = Vec::with_capacity(iy.capacity());

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let c = edge_coeffs(sys, region, i1, i2, edge.cv_area, edge.length);

        let (v1, n1, p1) = (x[o1], x[o1 + 1], x[o1 + 2]);
        let (v2, n2, p2) = (x[o2], x[o2 + 1], x[o2 + 2]);

        let f_psi = c.g_psi * (v2 - v1);
        let f_n = c.g_n * sg_flux_n(vt, v1, v2, n1, n2);
        let f_p = c.g_p * sg_flux_p(vt, v1, v2, p1, p2);

        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            iy.extend_from_slice(&[o1, o1 + 1, o1 + 2]);
            y.extend_from_slice(&[f_psi, f_n, f_p]);
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            iy.extend_from_slice(&[o2, o2 + 1, o2 + 2]);
            y.extend_from_slice(&[-f_psi, -f_n, -f_p]);
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let d = &sys.node_data[region][fvm];
        let (n, p) = (x[o + 1], x[o + 2]);
        let vol = node.volume;

        iy.push(o);
        y.push(Q * (p - n + d.net_doping()) * vol);

        let r: f64 = m.recombination(n, p, nie);
        let mut rn = -Q * r * vol;
        let mut rp = -Q * r * vol;
        if params.time_dependent {
            rn -= Q * (n - d.n) / params.dt * vol;
            rp -= Q * (p - d.p) / params.dt * vol;
        }
        iy.extend_from_slice(&[o + 1, o + 2]);
        y.extend_from_slice(&[rn, rp]);
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// DDM-L1 Jacobian for one semiconductor region. Edge contributions seed
/// six AD directions `(ψ1, n1, p1, ψ2, n2, p2)`; volume terms seed three.
pub fn ddm1_jacobian(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    params: &SolveParams,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);

    let graph = &sys.graphs[region];
    let m = sys.regions[region].material;
    let t = sys.t_external;
    let vt = Dual::constant(thermal_voltage(t));
    let nie: f64 = m.nie(t);
    let rank = comm.rank();

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let c = edge_coeffs(sys, region, i1, i2, edge.cv_area, edge.length);
        let cols = [o1, o1 + 1, o1 + 2, o2, o2 + 1, o2 + 2];

        let v1 = Dual::var(x[o1], 0);
        let n1 = Dual::var(x[o1 + 1], 1);
        let p1 = Dual::var(x[o1 + 2], 2);
        let v2 = Dual::var(x[o2], 3);
        let n2 = Dual::var(x[o2 + 1], 4);
        let p2 = Dual::var(x[o2 + 2], 5);

        let f_psi = (v2 - v1) * c.g_psi;
        let f_n = sg_flux_n(vt, v1, v2, n1, n2) * c.g_n;
        let f_p = sg_flux_p(vt, v1, v2, p1, p2) * c.g_p;

        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            jac.set_values(o1, &cols, f_psi.grad(6), AssemblyMode::Add)?;
            jac.set_values(o1 + 1, &cols, f_n.grad(6), AssemblyMode::Add)?;
            jac.set_values(o1 + 2, &cols, f_p.grad(6), AssemblyMode::Add)?;
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            jac.set_values(o2, &cols, (-f_psi).grad(6), AssemblyMode::Add)?;
            jac.set_values(o2 + 1, &cols, (-f_n).grad(6), AssemblyMode::Add)?;
            jac.set_values(o2 + 2, &cols, (-f_p).grad(6), AssemblyMode::Add)?;
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let d = &sys.node_data[region][fvm];
        let cols = [o, o + 1, o + 2];
        let vol = node.volume;

        let n = Dual::var(x[o + 1], 1);
        let p = Dual::var(x[o + 2], 2);

        let charge = (p - n) * (Q * vol);
        jac.set_values(o, &cols, charge.grad(3), AssemblyMode::Add)?;

        let nie_d = Dual::constant(nie);
        let mut rn = -m.recombination(n, p, nie_d) * (Q * vol);
        let mut rp = rn;
        if params.time_dependent {
            rn -= (n - d.n) * (Q * vol / params.dt);
            rp -= (p - d.p) * (Q * vol / params.dt);
        }
        jac.set_values(o + 1, &cols, rn.grad(3), AssemblyMode::Add)?;
        jac.set_values(o + 2, &cols, rp.grad(3), AssemblyMode::Add)?;
    }

    *mode = AssemblyMode::Add;
    Ok(())
}
