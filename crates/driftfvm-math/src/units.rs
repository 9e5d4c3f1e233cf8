// crates/driftfvm-math/src/units.rs

//! Scaled physical-unit system.
//!
//! Internal quantities live in a centimetre-based SI hybrid: lengths in
//! cm, potentials in V, temperatures in K, time in s, charge in C, carrier
//! densities in cm⁻³. Every constant below is expressed in that system;
//! boundary descriptors convert to their display tokens (μm, cm⁻², …) at
//! the emit/parse boundary only.

/// One centimetre (the internal length unit).
pub const CM: f64 = 1.0;
/// One micrometre.
pub const UM: f64 = 1.0e-4 * CM;
/// One nanometre.
pub const NM: f64 = 1.0e-7 * CM;
/// One volt (the internal potential unit).
pub const V: f64 = 1.0;
/// One ampere.
pub const A: f64 = 1.0;
/// One coulomb.
pub const C: f64 = 1.0;
/// One kelvin.
pub const K: f64 = 1.0;
/// One second.
pub const S: f64 = 1.0;
/// One joule.
pub const J: f64 = C * V;

/// Elementary charge `q` [C].
pub const Q: f64 = 1.602_176_634e-19 * C;
/// One electron-volt [J].
pub const EV: f64 = Q * V;
/// Boltzmann constant `k_B` [J/K].
pub const KB: f64 = 1.380_649e-23 * J / K;
/// Vacuum permittivity `ε₀` [C/(V·cm)].
pub const EPS0: f64 = 8.854_187_817e-14 * C / V / CM;

/// Heat-transfer display unit `J/(s·cm²·K)`.
pub const HEAT_TRANSFER_UNIT: f64 = J / S / (CM * CM) / K;
/// Sheet-charge display unit `cm⁻²`.
pub const PER_CM2: f64 = 1.0 / (CM * CM);
/// Volume-density display unit `cm⁻³`.
pub const PER_CM3: f64 = 1.0 / (CM * CM * CM);

/// Thermal voltage `k_B·T/q` [V].
#[inline]
#[must_use]
pub fn thermal_voltage(t: f64) -> f64 {
    KB * t / Q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermal_voltage_at_room_temperature() {
        let vt = thermal_voltage(300.0 * K);
        assert!((vt - 0.025852).abs() < 1e-5);
    }

    #[test]
    fn micron_is_consistent() {
        assert!((UM * 1.0e4 - CM).abs() < 1e-15);
    }
}
