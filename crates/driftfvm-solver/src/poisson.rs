// crates/driftfvm-solver/src/poisson.rs

//! Poisson-type region assemblers.
//!
//! Semiconductors at the Poisson level carry the nonlinear space charge
//! with Boltzmann carrier densities; insulator, electrode, vacuum and PML
//! regions carry the plain dielectric flux; resistive metals carry the
//! conduction-current continuity `∇·(σ∇ψ) = 0`. At level 2 the simple
//! regions additionally carry heat conduction (plus Joule heating in
//! metals).

use anyhow::Result;

use driftfvm_algebra::{AssemblyMode, SysMatrix, SysVector};
use driftfvm_device::{Communicator, ModelLevel, RegionKind, System, Var};
use driftfvm_math::units::{thermal_voltage, Q};
use driftfvm_math::{Dual, Scalar};

use crate::params::SolveParams;
use crate::proto::{ensure_mat_add, ensure_vec_add};

/// Intrinsic reference potential `ψ₀` of a semiconductor node: the
/// vacuum-referenced potential at which the node is intrinsic with the
/// Fermi level at zero.
pub(crate) fn psi_intrinsic(sys: &System, region: usize, fvm: usize) -> f64 {
    let m = sys.regions[region].material;
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let eg: f64 = m.eg(t);
    let nc: f64 = m.nc(t);
    let nv: f64 = m.nv(t);
    -sys.node_data[region][fvm].affinity - eg / 2.0 - vt / 2.0 * (nc / nv).ln()
}

/// Boltzmann carriers at potential `psi`: `(n, p)`.
fn boltzmann_carriers<S: Scalar>(psi: S, psi0: f64, nie: f64, vt: f64) -> (S, S) {
    let arg = (psi - psi0) / vt;
    (arg.exp() * nie, (-arg).exp() * nie)
}

/// Flux coefficient along the edges of a simple region: conductance for
/// resistive metals, permittivity otherwise (per-node, midpoint-averaged).
fn edge_coefficient(sys: &System, region: usize, fvm: usize) -> f64 {
    let r = &sys.regions[region];
    if r.kind == RegionKind::Metal && sys.level != ModelLevel::Poisson {
        r.material.conductance
    } else {
        sys.node_data[region][fvm].eps
    }
}

/// Residual of a non-semiconductor region (ψ flux; T conduction at L2).
pub fn simple_region_function(
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
    let t_index = sys.var_index(region, Var::TLattice);
    let kind = sys.regions[region].kind;
    let material = sys.regions[region].material;
    let rank = comm.rank();

    let mut iy = Vec::with_capacity(2 * graph.n_edges());
    let mut y = Vec::with_capacity(2 * graph.n_edges());

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let coeff = 0.5 * (edge_coefficient(sys, region, i1) + edge_coefficient(sys, region, i2));
        let flux = coeff * edge.cv_area * (x[o2] - x[o1]) / edge.length;
        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            iy.push(o1);
            y.push(flux);
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            iy.push(o2);
            y.push(-flux);
        }

        if let Some(ti) = t_index {
            let kappa = material.thermal_conductivity;
            let heat = kappa * edge.cv_area * (x[o2 + ti] - x[o1 + ti]) / edge.length;
            // Joule dissipation of the conduction current in metals.
            let joule = if kind == RegionKind::Metal {
                let dv = x[o1] - x[o2];
                0.5 * material.conductance * edge.cv_area / edge.length * dv * dv
            } else {
                0.0
            };
            if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
                iy.push(o1 + ti);
                y.push(heat + joule);
            }
            if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
                iy.push(o2 + ti);
                y.push(-heat + joule);
            }
        }
    }

    // Transient lattice-heat storage.
    if let Some(ti) = t_index {
        if params.time_dependent {
            let rho_c = material.density * material.heat_capacity;
            for (fvm, node) in graph.nodes.iter().enumerate() {
                if !sys.mesh.on_processor(node.node, rank) {
                    continue;
                }
                let o = sys.offset(region, fvm);
                let d = &sys.node_data[region][fvm];
                iy.push(o + ti);
                y.push(-rho_c * (x[o + ti] - d.t_l) / params.dt * node.volume);
            }
        }
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian of [`simple_region_function`].
pub fn simple_region_jacobian(
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
    let t_index = sys.var_index(region, Var::TLattice);
    let kind = sys.regions[region].kind;
    let material = sys.regions[region].material;
    let rank = comm.rank();

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let coeff = 0.5 * (edge_coefficient(sys, region, i1) + edge_coefficient(sys, region, i2));
        let g = coeff * edge.cv_area / edge.length;
        let cols = [o1, o2];
        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            jac.set_values(o1, &cols, &[-g, g], AssemblyMode::Add)?;
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            jac.set_values(o2, &cols, &[g, -g], AssemblyMode::Add)?;
        }

        if let Some(ti) = t_index {
            let gk = material.thermal_conductivity * edge.cv_area / edge.length;
            let tcols = [o1 + ti, o2 + ti];
            if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
                jac.set_values(o1 + ti, &tcols, &[-gk, gk], AssemblyMode::Add)?;
            }
            if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
                jac.set_values(o2 + ti, &tcols, &[gk, -gk], AssemblyMode::Add)?;
            }
            if kind == RegionKind::Metal {
                let gj = material.conductance * edge.cv_area / edge.length;
                let dv = x[o1] - x[o2];
                let dj = [gj * dv, -gj * dv];
                if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
                    jac.set_values(o1 + ti, &cols, &dj, AssemblyMode::Add)?;
                }
                if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
                    jac.set_values(o2 + ti, &cols, &dj, AssemblyMode::Add)?;
                }
            }
        }
    }

    if let Some(ti) = t_index {
        if params.time_dependent {
            let rho_c = material.density * material.heat_capacity;
            for (fvm, node) in graph.nodes.iter().enumerate() {
                if !sys.mesh.on_processor(node.node, rank) {
                    continue;
                }
                let o = sys.offset(region, fvm);
                jac.set_value(
                    o + ti,
                    o + ti,
                    -rho_c / params.dt * node.volume,
                    AssemblyMode::Add,
                )?;
            }
        }
    }

    *mode = AssemblyMode::Add;
    Ok(())
}

/// Residual of a semiconductor region at the Poisson level: dielectric
/// flux plus Boltzmann space charge.
pub fn semiconductor_poisson_function(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    x: &[f64],
    f: &mut SysVector,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_vec_add(f, mode);

    let graph = &sys.graphs[region];
    let material = sys.regions[region].material;
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let nie: f64 = material.nie(t);
    let rank = comm.rank();

    let mut iy = Vec::with_capacity(2 * graph.n_edges() + graph.n_nodes());
    let mut y = Vec::with_capacity(iy.capacity());

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let d1 = &sys.node_data[region][i1];
        let d2 = &sys.node_data[region][i2];
        let eps = 0.5 * (d1.eps + d2.eps);
        let flux = eps * edge.cv_area * (x[o2] - x[o1]) / edge.length;
        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            iy.push(o1);
            y.push(flux);
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            iy.push(o2);
            y.push(-flux);
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let d = &sys.node_data[region][fvm];
        let psi0 = psi_intrinsic(sys, region, fvm);
        let (n, p) = boltzmann_carriers(x[o], psi0, nie, vt);
        iy.push(o);
        y.push(Q * (p - n + d.net_doping()) * node.volume);
    }

    if !iy.is_empty() {
        f.set_values(&iy, &y, AssemblyMode::Add)?;
    }
    *mode = AssemblyMode::Add;
    Ok(())
}

/// Jacobian of [`semiconductor_poisson_function`].
pub fn semiconductor_poisson_jacobian(
    sys: &System,
    region: usize,
    comm: &dyn Communicator,
    x: &[f64],
    jac: &mut SysMatrix,
    mode: &mut AssemblyMode,
) -> Result<()> {
    ensure_mat_add(jac, mode);

    let graph = &sys.graphs[region];
    let material = sys.regions[region].material;
    let t = sys.t_external;
    let vt = thermal_voltage(t);
    let nie: f64 = material.nie(t);
    let rank = comm.rank();

    for edge in &graph.edges {
        let (i1, i2) = (edge.n1, edge.n2);
        let (o1, o2) = (sys.offset(region, i1), sys.offset(region, i2));
        let d1 = &sys.node_data[region][i1];
        let d2 = &sys.node_data[region][i2];
        let g = 0.5 * (d1.eps + d2.eps) * edge.cv_area / edge.length;
        let cols = [o1, o2];
        if sys.mesh.on_processor(graph.nodes[i1].node, rank) {
            jac.set_values(o1, &cols, &[-g, g], AssemblyMode::Add)?;
        }
        if sys.mesh.on_processor(graph.nodes[i2].node, rank) {
            jac.set_values(o2, &cols, &[g, -g], AssemblyMode::Add)?;
        }
    }

    for (fvm, node) in graph.nodes.iter().enumerate() {
        if !sys.mesh.on_processor(node.node, rank) {
            continue;
        }
        let o = sys.offset(region, fvm);
        let psi0 = psi_intrinsic(sys, region, fvm);
        let psi = Dual::var(x[o], 0);
        let (n, p) = boltzmann_carriers(psi, psi0, nie, vt);
        let charge = (p - n) * (Q * node.volume);
        jac.set_value(o, o, charge.d(0), AssemblyMode::Add)?;
    }

    *mode = AssemblyMode::Add;
    Ok(())
}
