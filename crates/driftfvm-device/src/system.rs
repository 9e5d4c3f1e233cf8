// crates/driftfvm-device/src/system.rs

//! The simulation system: regions over the mesh, per-node state arenas,
//! boundary objects and the frozen unknown layout.

use anyhow::{bail, Context, Result};
use nalgebra::Point3;
use tracing::info;

use driftfvm_material::Material;
use driftfvm_math::units::{thermal_voltage, EPS0, UM};
use driftfvm_mesh::{FvmGraph, Mesh};

use crate::bc::{classify_interface, BcType};
use crate::boundary::{BcParams, BdNode, Boundary};
use crate::circuit::{CircuitDrive, ExtCircuit};
use crate::layout::{DofMap, ModelLevel, Var};
use crate::node_data::NodeData;
use crate::region::{Region, RegionKind};

/// Fully assembled device: mesh + regions + state + boundaries + layout.
///
/// Regions, graphs and boundaries are immutable during a solve; node state
/// and circuit history change only on step acceptance.
#[derive(Debug)]
pub struct System {
    /// The mesh (read-only).
    pub mesh: Mesh,
    /// Typed regions, indexed by mesh subdomain id.
    pub regions: Vec<Region>,
    /// Per-region FVM graphs.
    pub graphs: Vec<FvmGraph>,
    /// Per-region, per-FVM-node state.
    pub node_data: Vec<Vec<NodeData>>,
    /// Boundary objects in declaration order.
    pub boundaries: Vec<Boundary>,
    /// Frozen unknown layout (valid after [`System::finalize`]).
    pub dofs: DofMap,
    /// Physical model level.
    pub level: ModelLevel,
    /// Device extent in z for 2D meshes [cm]; 1 for 1D/3D.
    pub z_width: f64,
    /// Ambient temperature [K].
    pub t_external: f64,
    /// Whether resistive metals keep their own interface kinds.
    pub resistive_metal_mode: bool,
    /// Use Fermi–Dirac statistics at Ohmic contacts.
    pub fermi: bool,
}

impl System {
    /// Build a system over `mesh` with one material per region id.
    ///
    /// # Errors
    /// Fails if a region id has no material or no elements.
    pub fn new(mesh: Mesh, materials: &[&'static Material], level: ModelLevel) -> Result<Self> {
        let n_regions = mesh.n_regions();
        if materials.len() != n_regions {
            bail!(
                "mesh has {n_regions} regions but {} materials were given",
                materials.len()
            );
        }
        let t_external = 300.0;
        let mut regions = Vec::with_capacity(n_regions);
        let mut graphs = Vec::with_capacity(n_regions);
        let mut node_data = Vec::with_capacity(n_regions);
        for (id, &material) in materials.iter().enumerate() {
            let kind = RegionKind::from_category(material.category);
            let graph = FvmGraph::build(&mesh, id)
                .with_context(|| format!("building FVM graph for region {id}"))?;
            let data: Vec<NodeData> = graph
                .nodes
                .iter()
                .map(|_| {
                    NodeData::new(
                        EPS0 * material.permittivity,
                        material.affinity,
                        t_external,
                    )
                })
                .collect();
            regions.push(Region { id, kind, material });
            graphs.push(graph);
            node_data.push(data);
        }

        let z_width = if mesh.dim == 2 { UM } else { 1.0 };
        Ok(Self {
            mesh,
            regions,
            graphs,
            node_data,
            boundaries: Vec::new(),
            dofs: DofMap {
                stride: Vec::new(),
                node_offset: Vec::new(),
                bc_offset: Vec::new(),
                n_dofs: 0,
            },
            level,
            z_width,
            t_external,
            resistive_metal_mode: false,
            fermi: false,
        })
    }

    /// Assign doping from position: the closure returns `(Na, Nd)` [cm⁻³].
    pub fn set_doping(&mut self, doping: impl Fn(&Point3<f64>) -> (f64, f64)) {
        for region in &self.regions {
            if region.kind != RegionKind::Semiconductor {
                continue;
            }
            let graph = &self.graphs[region.id];
            for (fvm, node) in graph.nodes.iter().enumerate() {
                let (na, nd) = doping(&self.mesh.points[node.node]);
                let d = &mut self.node_data[region.id][fvm];
                d.na = na;
                d.nd = nd;
            }
        }
    }

    /// Attach a boundary condition to a labelled mesh boundary.
    ///
    /// # Errors
    /// Fails if the label tags no mesh faces (inconsistent boundary tag).
    pub fn add_boundary(
        &mut self,
        label: &str,
        bc_type: BcType,
        ext_circuit: Option<ExtCircuit>,
    ) -> Result<usize> {
        let node_ids = self.mesh.nodes_on_boundary(label);
        if node_ids.is_empty() {
            bail!("boundary tag '{label}' matches no mesh faces");
        }
        let mut nodes = Vec::with_capacity(node_ids.len());
        for node in node_ids {
            let mut rnodes: Vec<(usize, usize)> = self
                .graphs
                .iter()
                .filter_map(|g| g.fvm_index(node).map(|fvm| (g.region, fvm)))
                .collect();
            rnodes.sort_by_key(|&(r, _)| (self.regions[r].kind.boundary_rank(), r));
            nodes.push(BdNode { node, rnodes });
        }
        let incident = self.mesh.regions_on_boundary(label);
        let regions = (incident.first().copied(), incident.get(1).copied());

        info!(label, bc = bc_type.name(), "initializing boundary");
        self.boundaries.push(Boundary {
            label: label.to_owned(),
            bc_type,
            params: BcParams::defaults(bc_type, self.t_external),
            ext_circuit,
            nodes,
            regions,
            inter_connect: Vec::new(),
            hub: None,
        });
        Ok(self.boundaries.len() - 1)
    }

    /// Attach a node-less boundary (interconnect hub, charge integral).
    pub fn add_virtual_boundary(
        &mut self,
        label: &str,
        bc_type: BcType,
        ext_circuit: Option<ExtCircuit>,
    ) -> usize {
        info!(label, bc = bc_type.name(), "initializing boundary");
        self.boundaries.push(Boundary {
            label: label.to_owned(),
            bc_type,
            params: BcParams::defaults(bc_type, self.t_external),
            ext_circuit,
            nodes: Vec::new(),
            regions: (None, None),
            inter_connect: Vec::new(),
            hub: None,
        });
        self.boundaries.len() - 1
    }

    /// Classify the interface behind `label` from its two incident region
    /// materials and attach the resulting boundary condition.
    ///
    /// # Errors
    /// Fails if the label does not sit between two regions, or the
    /// material pair cannot be classified.
    pub fn add_classified_interface(&mut self, label: &str) -> Result<usize> {
        let incident = self.mesh.regions_on_boundary(label);
        let (Some(&r1), Some(&r2)) = (incident.first(), incident.get(1)) else {
            bail!("boundary tag '{label}' does not separate two regions");
        };
        let bc_type = classify_interface(
            self.regions[r1].material.name,
            self.regions[r2].material.name,
            self.resistive_metal_mode,
        )
        .with_context(|| format!("classifying interface '{label}'"))?;
        self.add_boundary(label, bc_type, None)
    }

    /// Tie an electrode to an interconnect (or charge-integral) hub.
    pub fn connect_to_hub(&mut self, hub: usize, electrode: usize) {
        self.boundaries[hub].inter_connect.push(electrode);
        self.boundaries[electrode].hub = Some(hub);
        if let Some(ckt) = self.boundaries[electrode].ext_circuit.as_mut() {
            ckt.drive = CircuitDrive::InterConnect;
        }
    }

    /// Freeze the unknown layout. Call after all boundaries are attached.
    pub fn finalize(&mut self) {
        self.dofs = DofMap::build(&self.regions, &self.graphs, &self.boundaries, self.level);
    }

    /// Total unknown count.
    #[must_use]
    pub fn n_dofs(&self) -> usize {
        self.dofs.n_dofs
    }

    /// Global offset of `(region, fvm)`'s first unknown.
    #[must_use]
    pub fn offset(&self, region: usize, fvm: usize) -> usize {
        self.dofs.offset(region, fvm)
    }

    /// Block index of `var` in `region`, if the model carries it there.
    #[must_use]
    pub fn var_index(&self, region: usize, var: Var) -> Option<usize> {
        self.level.var_index(self.regions[region].kind, var)
    }

    /// Equilibrium initial guess for the region unknowns; electrode rows
    /// are seeded by the boundary `fill_value` hooks.
    #[must_use]
    pub fn initial_guess(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.dofs.n_dofs];
        let t = self.t_external;
        let vt = thermal_voltage(t);
        for region in &self.regions {
            let graph = &self.graphs[region.id];
            for fvm in 0..graph.n_nodes() {
                let d = &self.node_data[region.id][fvm];
                let base = self.offset(region.id, fvm);
                match region.kind {
                    RegionKind::Semiconductor => {
                        let m = region.material;
                        let nie: f64 = m.nie(t);
                        let nn = d.net_doping();
                        let (n0, p0) = equilibrium_carriers(nn, nie);
                        let eg: f64 = m.eg(t);
                        let nc: f64 = m.nc(t);
                        let nv: f64 = m.nv(t);
                        x[base] = vt * (nn / (2.0 * nie)).asinh()
                            - eg / 2.0
                            - vt / 2.0 * (nc / nv).ln()
                            - d.affinity;
                        if let Some(i) = self.var_index(region.id, Var::N) {
                            x[base + i] = n0;
                        }
                        if let Some(i) = self.var_index(region.id, Var::P) {
                            x[base + i] = p0;
                        }
                    }
                    _ => {
                        x[base] = -d.affinity;
                    }
                }
                if let Some(i) = self.var_index(region.id, Var::TLattice) {
                    x[base + i] = t;
                }
            }
        }
        x
    }

    /// Accept a converged solution into the node-state arenas.
    pub fn commit_solution(&mut self, x: &[f64]) {
        for region in &self.regions {
            let graph = &self.graphs[region.id];
            for fvm in 0..graph.n_nodes() {
                let base = self.offset(region.id, fvm);
                let psi = x[base];
                let n = self
                    .var_index(region.id, Var::N)
                    .map_or(0.0, |i| x[base + i]);
                let p = self
                    .var_index(region.id, Var::P)
                    .map_or(0.0, |i| x[base + i]);
                let t_l = self
                    .var_index(region.id, Var::TLattice)
                    .map_or(self.t_external, |i| x[base + i]);
                self.node_data[region.id][fvm].commit(psi, n, p, t_l);
            }
        }
        for (b, off) in self.boundaries.iter_mut().zip(&self.dofs.bc_offset) {
            if let (Some(ckt), Some(off)) = (b.ext_circuit.as_mut(), off) {
                ckt.potential_itering = x[*off];
            }
        }
    }
}

/// Charge-neutral carrier densities for net doping `nn` and intrinsic
/// density `nie`: majority from `(|N| + √(N² + 4n_ie²))/2`, minority from
/// mass action.
#[must_use]
pub fn equilibrium_carriers(nn: f64, nie: f64) -> (f64, f64) {
    if nn < 0.0 {
        let p = (-nn + (nn * nn + 4.0 * nie * nie).sqrt()) / 2.0;
        (nie * nie / p, p)
    } else {
        let n = (nn + (nn * nn + 4.0 * nie * nie).sqrt()) / 2.0;
        (n, nie * nie / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfvm_material::by_name;
    use driftfvm_mesh::builders::line_mesh;

    fn diode_system() -> System {
        let mesh = line_mesh(11, 1.0e-4, 1.0e-8, |_| 0).unwrap();
        let si = by_name("si").unwrap();
        let mut sys = System::new(mesh, &[si], ModelLevel::Ddm1).unwrap();
        sys.set_doping(|p| {
            if p.x < 0.5e-4 {
                (1.0e18, 0.0)
            } else {
                (0.0, 1.0e18)
            }
        });
        sys
    }

    #[test]
    fn layout_assigns_contiguous_blocks_with_electrode_tail() {
        let mut sys = diode_system();
        sys.add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
            .unwrap();
        sys.add_boundary("right", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
            .unwrap();
        sys.finalize();
        // 11 nodes x 3 vars + 2 electrode unknowns.
        assert_eq!(sys.n_dofs(), 35);
        assert_eq!(sys.dofs.bc_offset, vec![Some(33), Some(34)]);
        assert_eq!(sys.offset(0, 10), 30);
    }

    #[test]
    fn initial_guess_is_charge_neutral() {
        let mut sys = diode_system();
        sys.finalize();
        let x = sys.initial_guess();
        // n-side node: n ≈ Nd.
        let base = sys.offset(0, 10);
        assert!((x[base + 1] - 1.0e18).abs() < 1.0e12);
        // p-side node: p ≈ Na.
        let base = sys.offset(0, 0);
        assert!((x[base + 2] - 1.0e18).abs() < 1.0e12);
        // Built-in potential difference across the junction.
        let dv = x[sys.offset(0, 10)] - x[sys.offset(0, 0)];
        assert!(dv > 0.6 && dv < 1.2, "built-in {dv}");
    }

    #[test]
    fn unknown_boundary_tag_is_fatal() {
        let mut sys = diode_system();
        let err = sys
            .add_boundary("no_such_tag", BcType::NeumannBoundary, None)
            .unwrap_err();
        assert!(err.to_string().contains("no_such_tag"));
    }

    #[test]
    fn hub_connection_switches_drive() {
        let mut sys = diode_system();
        let a = sys
            .add_boundary("left", BcType::OhmicContact, Some(ExtCircuit::voltage(0.0)))
            .unwrap();
        let hub = sys.add_virtual_boundary("hub", BcType::InterConnect, Some(ExtCircuit::voltage(1.0)));
        sys.connect_to_hub(hub, a);
        assert_eq!(sys.boundaries[hub].inter_connect, vec![a]);
        assert_eq!(sys.boundaries[a].hub, Some(hub));
        assert_eq!(
            sys.boundaries[a].ext_circuit.unwrap().drive,
            CircuitDrive::InterConnect
        );
    }
}
