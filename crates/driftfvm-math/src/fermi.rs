// crates/driftfvm-math/src/fermi.rs

//! Fermi–Dirac integral of order one half, normalised so that
//! `F_{1/2}(η) → e^η` in the non-degenerate limit `η ≪ 0`.

use crate::ad::Scalar;

/// Fermi–Dirac integral `F_{1/2}(η)` (Bednarczyk–Bednarczyk form).
///
/// `F_{1/2}(η) ≈ 1 / (e^{-η} + (3√π/4)·ν^{-3/8})` with
/// `ν = η⁴ + 33.6·η·(1 - 0.68·e^{-0.17(η+1)²}) + 50`.
/// Relative error stays below 0.4% over the device-relevant range
/// `-10 ≤ η ≤ 20`, which is ample for a boundary-condition model.
#[inline]
#[must_use]
pub fn fermi_half<S: Scalar>(eta: S) -> S {
    let e1 = eta + 1.0;
    let nu = eta.powf(4.0) + eta * 33.6 * (-(-e1 * e1 * 0.17).exp() * 0.68 + 1.0) + 50.0;
    let denom = (-eta).exp() + nu.powf(-0.375) * (3.0 * std::f64::consts::PI.sqrt() / 4.0);
    S::from_f64(1.0) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad::Dual;

    #[test]
    fn nondegenerate_limit_is_boltzmann() {
        for &eta in &[-10.0, -6.0, -4.0] {
            let f = fermi_half(eta);
            let b = f64::exp(eta);
            assert!((f - b).abs() < 5e-3 * b, "eta={eta}: {f} vs {b}");
        }
    }

    #[test]
    fn is_monotone_increasing() {
        let mut last = fermi_half(-12.0_f64);
        let mut eta = -12.0;
        while eta < 15.0 {
            eta += 0.25;
            let f = fermi_half(eta);
            assert!(f > last, "non-monotone at eta={eta}");
            last = f;
        }
    }

    #[test]
    fn degenerate_limit_follows_eta_three_halves() {
        // F_{1/2}(η) → (4/3√π)·η^{3/2} for large η.
        let eta = 18.0;
        let asym = 4.0 / (3.0 * std::f64::consts::PI.sqrt()) * eta.powf(1.5);
        let f = fermi_half(eta);
        assert!((f - asym).abs() < 0.02 * asym);
    }

    #[test]
    fn dual_derivative_matches_finite_difference() {
        for &eta in &[-3.0, 0.0, 2.0, 8.0] {
            let eps = 1e-6;
            let fd = (fermi_half(eta + eps) - fermi_half(eta - eps)) / (2.0 * eps);
            let ad = fermi_half(Dual::var(eta, 0));
            assert!((ad.d(0) - fd).abs() < 1e-4 * (1.0 + fd.abs()), "eta={eta}");
        }
    }
}
