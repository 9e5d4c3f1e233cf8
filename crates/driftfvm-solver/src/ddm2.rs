// crates/driftfvm-solver/src/ddm2.rs

//! Level-2 drift-diffusion assembler: level 1 plus the lattice-temperature
//! equation. Carrier fluxes take their thermal voltage from the edge
//! midpoint temperature; heat sources are Joule dissipation along edges
//! and recombination heat in the control volumes.

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, System};
use driftfvm_math::units::{KB, Q};
use driftfvm_math::{sg_flux_n, sg_flux_p, Dual, Scalar};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add};

/// Evaluate all four per-edge flux contributions for node 1 of an edge.
/// Returns `(f_psi, f_n, f_p, f_t1, f_t2)`; the temperature rows differ
/// between the endpoints because Joule heat enters both with `+`.
#[allow(clippy::too_many_arguments)]
fn edge_fluxes<S: Scalar>(
    g_psi: f64,
    g_n0: f64,
    g_p0: f64,
    g_t: f64,
    v1: S,
    n1: S,
    p1: S,
    t1: S,
    v2: S,
    n2: S,
    p2: S,
    t2: S,
) -> (S, S, S, S, S) {
    let vt = (t1 + t2) * (0.5 * KB / Q);
    let f_psi = (v2 - v1) * g_psi;
    let f_n = sg_flux_n(vt, v1, v2, n1, n2) * vt * g_n0;
    let f_p = sg_flux_p(vt, v1, v2, p1, p2) * vt * g_p0;
    let heat = (t2 - t1) * g_t;
    // Joule dissipation: charge currents into node 1 times the potential
    // drop, split evenly between the endpoints.
    let joule = (f_p - f_n) * (v2 - v1) * 0.5;
    (f_psi, f_n, f_p, heat + joule, -heat + joule)
}

struct EdgeCoeffs {
    g_psi: f64,
    g_n0: f64,
    g_p0: f64,
    g_t: f64,
}

fn edge_coeffs(sys: &System, region: usize, i1: usize, i2: usize, area: f64, len: f64) -> EdgeCoeffs {
    let m = sys.regions[region].material;
    let t = sys.t_external;
    let d1 = &sys.node_data[region][i1];
    let d2 = &sys.node_data[region][i2];
    let eps = 0.5 * (d1.eps + d2.eps);
    let mun = 0.5 * (m.mu_n::<f64>(d1.total_doping(), t) + m.mu_n::<f64>(d2.total_doping(), t));
    let mup = 0.5 * (m.mu_p::<f64>(d1.total_doping(), t) + m.mu_p::<f64>(d2.total_doping(), t));
    EdgeCoeffs {
        g_psi: eps * area / len,
        g_n0: Q * mun * area / len,
        g_p0: Q * mup * area / len,
        g_t: m.thermal_conductivity * area / len,
    }
}

/// DDM-L2 residual for one semiconductor region.
pub fn ddm2_function(
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
    let rank = comm.rank();

    let mut iy = Vec::with_capacity(8 * graph.n_edges() + 4 * graph.n_nodes());
    let mut y = Vec::with_capacity(iy.capacity());

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let c = edge_coeffs(sys, region, i1, i2, edge.cv_area, edge.length);
        let (f_psi, f_n, f_p, f_t1, f_t2) = edge_fluxes(
            c.g_psi,
            c.g_n0,
            c.g_p0,
            c.g_t,
            x[o1],
            x[o1 + 1],
            x[o1 + 2],
            x[o1 + 3],
            x[o2],
            x[o2 + 1],
            x[o2 + 2],
            x[o2 + 3],
        );

        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            iy.extend_from_slice(&[o1, o1 + 1, o1 + 2, o1 + 3]);
            y.extend_from_slice(&[f_psi, f_n, f_p, f_t1]);
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            iy.extend_from_slice(&[o2, o2 + 1, o2 + 2, o2 + 3]);
            y.extend_from_slice(&[-f_psi, -f_n, -f_p, f_t2]);
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let d = &sys.node_data[region][fvm];
        let (n, p, tl) = (x[o + 1], x[o + 2], x[o + 3]);
        let vol = node.volume;

        let nie: f64 = m.nie(tl);
        let eg: f64 = m.eg(tl);
        let r: f64 = m.recombination(n, p, nie);

        iy.push(o);
        y.push(Q * (p - n + d.net_doping()) * vol);

        let mut rn = -Q * r * vol;
        let mut rp = -Q * r * vol;
        let mut rt = Q * r * eg * vol;
        if params.time_dependent {
            rn -= Q * (n - d.n) / params.dt * vol;
            rp -= Q * (p - d.p) / params.dt * vol;
            rt -= m.density * m.heat_capacity * (tl - d.t_l) / params.dt * vol;
        }
        iy.extend_from_slice(&[o + 1, o + 2, o + 3]);
        y.extend_from_slice(&[rn, rp, rt]);
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// DDM-L2 Jacobian for one semiconductor region; edges seed eight AD
/// directions, volume terms seed four.
pub fn ddm2_jacobian(
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
    let rank = comm.rank();

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let c = edge_coeffs(sys, region, i1, i2, edge.cv_area, edge.length);
        let cols = [
            o1,
            o1 + 1,
            o1 + 2,
            o1 + 3,
            o2,
            o2 + 1,
            o2 + 2,
            o2 + 3,
        ];

        let (f_psi, f_n, f_p, f_t1, f_t2) = edge_fluxes(
            c.g_psi,
            c.g_n0,
            c.g_p0,
            c.g_t,
            Dual::var(x[o1], 0),
            Dual::var(x[o1 + 1], 1),
            Dual::var(x[o1 + 2], 2),
            Dual::var(x[o1 + 3], 3),
            Dual::var(x[o2], 4),
            Dual::var(x[o2 + 1], 5),
            Dual::var(x[o2 + 2], 6),
            Dual::var(x[o2 + 3], 7),
        );

        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            jac.set_values(o1, &cols, f_psi.grad(8), AssemblyMode::Add)?;
            jac.set_values(o1 + 1, &cols, f_n.grad(8), AssemblyMode::Add)?;
            jac.set_values(o1 + 2, &cols, f_p.grad(8), AssemblyMode::Add)?;
            jac.set_values(o1 + 3, &cols, f_t1.grad(8), AssemblyMode::Add)?;
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            jac.set_values(o2, &cols, (-f_psi).grad(8), AssemblyMode::Add)?;
            jac.set_values(o2 + 1, &cols, (-f_n).grad(8), AssemblyMode::Add)?;
            jac.set_values(o2 + 2, &cols, (-f_p).grad(8), AssemblyMode::Add)?;
            jac.set_values(o2 + 3, &cols, f_t2.grad(8), AssemblyMode::Add)?;
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let d = &sys.node_data[region][fvm];
        let cols = [o, o + 1, o + 2, o + 3];
        let vol = node.volume;

        let n = Dual::var(x[o + 1], 1);
        let p = Dual::var(x[o + 2], 2);
        let tl = Dual::var(x[o + 3], 3);

        let nie = m.nie(tl);
        let eg = m.eg(tl);
        let r = m.recombination(n, p, nie);

        let charge = (p - n) * (Q * vol);
        jac.set_values(o, &cols, charge.grad(4), AssemblyMode::Add)?;

        let mut rn = -r * (Q * vol);
        let mut rp = rn;
        let mut rt = r * eg * (Q * vol);
        if params.time_dependent {
            rn -= (n - d.n) * (Q * vol / params.dt);
            rp -= (p - d.p) * (Q * vol / params.dt);
            rt -= (tl - d.t_l) * (m.density * m.heat_capacity * vol / params.dt);
        }
        jac.set_values(o + 1, &cols, rn.grad(4), AssemblyMode::Add)?;
        jac.set_values(o + 2, &cols, rp.grad(4), AssemblyMode::Add)?;
        jac.set_values(o + 3, &cols, rt.grad(4), AssemblyMode::Add)?;
    }

    *mode = AssemblyMode::Add;
    Ok(())
}
