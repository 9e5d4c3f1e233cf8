// crates/driftfvm-device/src/node_data.rs

//! Per-FVM-node solution state and material-resolved scalars.

/// Solution history and resolved per-node parameters for one FVM node.
///
/// `psi`/`n`/`p`/`t_l` hold the last *accepted* solution; the `_last`
/// fields hold the step before that (for BDF2). Newton iterates live in
/// the global unknown vector, not here; state is mutated only at step
/// acceptance.
#[derive(Clone, Copy, Debug)]
pub struct NodeData {
    /// Electrostatic potential [V].
    pub psi: f64,
    /// Electron density [cm⁻³].
    pub n: f64,
    /// Hole density [cm⁻³].
    pub p: f64,
    /// Lattice temperature [K].
    pub t_l: f64,
    /// Potential at the previous accepted step.
    pub psi_last: f64,
    /// Potential two accepted steps back.
    pub psi_last_last: f64,
    /// Absolute permittivity [C/(V·cm)].
    pub eps: f64,
    /// Electron affinity [V].
    pub affinity: f64,
    /// Acceptor doping [cm⁻³].
    pub na: f64,
    /// Donor doping [cm⁻³].
    pub nd: f64,
}

impl NodeData {
    /// Fresh node state at ambient temperature.
    #[must_use]
    pub fn new(eps: f64, affinity: f64, t: f64) -> Self {
        Self {
            psi: 0.0,
            n: 0.0,
            p: 0.0,
            t_l: t,
            psi_last: 0.0,
            psi_last_last: 0.0,
            eps,
            affinity,
            na: 0.0,
            nd: 0.0,
        }
    }

    /// Net doping `Nd - Na` [cm⁻³].
    #[must_use]
    pub fn net_doping(&self) -> f64 {
        self.nd - self.na
    }

    /// Total doping `Nd + Na` [cm⁻³].
    #[must_use]
    pub fn total_doping(&self) -> f64 {
        self.nd + self.na
    }

    /// Accept a converged solution: shift the potential history and store
    /// the new state.
    pub fn commit(&mut self, psi: f64, n: f64, p: f64, t_l: f64) {
        self.psi_last_last = self.psi_last;
        self.psi_last = self.psi;
        self.psi = psi;
        self.n = n;
        self.p = p;
        self.t_l = t_l;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_shifts_potential_history() {
        let mut d = NodeData::new(1.0, 4.05, 300.0);
        d.commit(0.1, 1.0, 2.0, 300.0);
        d.commit(0.2, 3.0, 4.0, 301.0);
        assert_eq!(d.psi, 0.2);
        assert_eq!(d.psi_last, 0.1);
        assert_eq!(d.psi_last_last, 0.0);
        assert_eq!(d.t_l, 301.0);
    }
}
