// crates/driftfvm-material/src/model.rs

//! The material record and its evaluation methods.

use driftfvm_math::units::{KB, Q};
use driftfvm_math::Scalar;

/// Broad material category driving region typing and interface
/// classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialCategory {
    /// Carrier-transporting semiconductor.
    Semiconductor,
    /// Dielectric.
    Insulator,
    /// Perfect conductor (electrode).
    Conductor,
    /// Resistive metal.
    Resistance,
    /// Vacuum.
    Vacuum,
    /// Perfectly-matched layer.
    Pml,
}

/// Band-structure parameters (Varshni gap, effective densities of states).
#[derive(Clone, Copy, Debug)]
pub struct BandParams {
    /// Bandgap at 0 K [eV].
    pub eg0: f64,
    /// Varshni α [eV/K].
    pub eg_alpha: f64,
    /// Varshni β [K].
    pub eg_beta: f64,
    /// Conduction-band effective DOS at 300 K [cm⁻³].
    pub nc300: f64,
    /// Valence-band effective DOS at 300 K [cm⁻³].
    pub nv300: f64,
}

/// Caughey–Thomas-style analytic low-field mobility parameters.
#[derive(Clone, Copy, Debug)]
#[allow(missing_docs)]
pub struct MobilityParams {
    pub mun_min: f64,
    pub mun_max: f64,
    pub nrefn: f64,
    pub nun: f64,
    pub xin: f64,
    pub alphan: f64,
    pub mup_min: f64,
    pub mup_max: f64,
    pub nrefp: f64,
    pub nup: f64,
    pub xip: f64,
    pub alphap: f64,
}

/// Recombination parameters: SRH lifetimes, Auger coefficients, direct
/// (radiative) coefficient.
#[derive(Clone, Copy, Debug)]
#[allow(missing_docs)]
pub struct RecombParams {
    pub taun: f64,
    pub taup: f64,
    pub augn: f64,
    pub augp: f64,
    pub direct: f64,
}

/// One material: basic parameters plus the optional semiconductor tables.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    /// Canonical lower-case name.
    pub name: &'static str,
    /// Category used for region typing and interface classification.
    pub category: MaterialCategory,
    /// Relative dielectric permittivity.
    pub permittivity: f64,
    /// Electron affinity [eV]; for metals this is the workfunction.
    pub affinity: f64,
    /// Mass density [g/cm³].
    pub density: f64,
    /// Specific conductance [S/cm]; zero for non-metals.
    pub conductance: f64,
    /// Thermal conductivity [J/(s·cm·K)].
    pub thermal_conductivity: f64,
    /// Specific heat capacity [J/(g·K)].
    pub heat_capacity: f64,
    /// Band structure, present for semiconductors.
    pub band: Option<BandParams>,
    /// Mobility model, present for semiconductors.
    pub mobility: Option<MobilityParams>,
    /// Recombination model, present for semiconductors.
    pub recomb: Option<RecombParams>,
}

const T300: f64 = 300.0;

impl Material {
    fn band_params(&self) -> &BandParams {
        // Callers reach band quantities only on semiconductor regions;
        // region construction guarantees the table is present.
        #[allow(clippy::expect_used)]
        self.band
            .as_ref()
            .expect("band parameters queried on a non-semiconductor material")
    }

    /// Bandgap `Eg(T)` [eV].
    #[must_use]
    pub fn eg<S: Scalar>(&self, t: S) -> S {
        let b = self.band_params();
        -(t * t * b.eg_alpha) / (t + b.eg_beta) + b.eg0
    }

    /// Conduction-band effective density of states `Nc(T)` [cm⁻³].
    #[must_use]
    pub fn nc<S: Scalar>(&self, t: S) -> S {
        (t / T300).powf(1.5) * self.band_params().nc300
    }

    /// Valence-band effective density of states `Nv(T)` [cm⁻³].
    #[must_use]
    pub fn nv<S: Scalar>(&self, t: S) -> S {
        (t / T300).powf(1.5) * self.band_params().nv300
    }

    /// Effective intrinsic density `n_ie(T) = √(Nc·Nv)·exp(-Eg/2kT)` [cm⁻³].
    #[must_use]
    pub fn nie<S: Scalar>(&self, t: S) -> S {
        let kt_ev = t * (KB / Q); // kT in eV
        (self.nc(t) * self.nv(t)).sqrt() * (-self.eg(t) / (kt_ev * 2.0)).exp()
    }

    /// Electron low-field mobility [cm²/(V·s)] at total doping
    /// `Na + Nd` [cm⁻³].
    #[must_use]
    pub fn mu_n<S: Scalar>(&self, total_doping: f64, t: S) -> S {
        #[allow(clippy::expect_used)]
        let m = self
            .mobility
            .as_ref()
            .expect("mobility queried on a non-semiconductor material");
        let tn = t / T300;
        ((tn.powf(m.nun) * m.mun_max) - m.mun_min)
            / (tn.powf(m.xin) * (total_doping / m.nrefn).powf(m.alphan) + 1.0)
            + m.mun_min
    }

    /// Hole low-field mobility [cm²/(V·s)].
    #[must_use]
    pub fn mu_p<S: Scalar>(&self, total_doping: f64, t: S) -> S {
        #[allow(clippy::expect_used)]
        let m = self
            .mobility
            .as_ref()
            .expect("mobility queried on a non-semiconductor material");
        let tn = t / T300;
        ((tn.powf(m.nup) * m.mup_max) - m.mup_min)
            / (tn.powf(m.xip) * (total_doping / m.nrefp).powf(m.alphap) + 1.0)
            + m.mup_min
    }

    /// Net recombination rate `R(n, p)` [cm⁻³ s⁻¹]: SRH + Auger + direct.
    #[must_use]
    pub fn recombination<S: Scalar>(&self, n: S, p: S, nie: S) -> S {
        #[allow(clippy::expect_used)]
        let r = self
            .recomb
            .as_ref()
            .expect("recombination queried on a non-semiconductor material");
        let excess = n * p - nie * nie;
        let srh = excess / ((n + nie) * r.taup + (p + nie) * r.taun);
        let auger = (n * r.augn + p * r.augp) * excess;
        let direct = excess * r.direct;
        srh + auger + direct
    }
}

#[cfg(test)]
mod tests {
    use crate::db::by_name;
    use driftfvm_math::Dual;

    #[test]
    fn silicon_room_temperature_values() {
        let si = by_name("si").unwrap();
        let eg: f64 = si.eg(300.0);
        assert!((eg - 1.1245).abs() < 2e-3, "Eg={eg}");
        let nie: f64 = si.nie(300.0);
        assert!(nie > 5.0e9 && nie < 2.0e10, "nie={nie}");
    }

    #[test]
    fn mobility_degrades_with_doping() {
        let si = by_name("si").unwrap();
        let lo: f64 = si.mu_n(1.0e14, 300.0);
        let hi: f64 = si.mu_n(1.0e19, 300.0);
        assert!(lo > 1000.0 && lo < 1500.0, "low-doping mu_n={lo}");
        assert!(hi < 200.0, "high-doping mu_n={hi}");
        assert!(si.mu_p::<f64>(1.0e14, 300.0) < lo);
    }

    #[test]
    fn srh_vanishes_in_equilibrium() {
        let si = by_name("si").unwrap();
        let nie: f64 = si.nie(300.0);
        let (n, p) = (1.0e15, nie * nie / 1.0e15);
        let r: f64 = si.recombination(n, p, nie);
        assert!(r.abs() < 1.0e-3 * nie, "R={r}");
        // Excess carriers recombine.
        let r2: f64 = si.recombination(n * 10.0, p * 10.0, nie);
        assert!(r2 > 0.0);
    }

    #[test]
    fn band_quantities_are_differentiable() {
        let si = by_name("si").unwrap();
        let t = Dual::var(300.0, 0);
        let eg = si.eg(t);
        // dEg/dT < 0 around room temperature.
        assert!(eg.d(0) < 0.0);
        let eps = 1e-3;
        let fd = (si.eg::<f64>(300.0 + eps) - si.eg::<f64>(300.0 - eps)) / (2.0 * eps);
        assert!((eg.d(0) - fd).abs() < 1e-8);
    }
}
