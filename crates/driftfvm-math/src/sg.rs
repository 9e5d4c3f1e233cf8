// crates/driftfvm-math/src/sg.rs

//! Scharfetter–Gummel edge forms: the exponentially-fitted carrier fluxes
//! and the flux-consistent midpoint densities used by hanging-node
//! interpolation.
//!
//! Conventions: nodes 1 and 2 span one FVM edge, `u = (ψ2 - ψ1)/Vt`.
//! The flux functions return the discrete divergence contribution for
//! node 1 (node 2 receives the negated value); the caller multiplies by
//! `μ·Vt·A_cv/L` and the carrier charge.

use crate::ad::Scalar;
use crate::bernoulli::bern;

/// Electron continuity contribution for node 1 of an edge:
/// `n2·B(u) - n1·B(-u)` with `u = (ψ2-ψ1)/Vt`.
///
/// Vanishes exactly when both endpoints satisfy the same Boltzmann
/// equilibrium `n ∝ exp(ψ/Vt)`.
#[inline]
#[must_use]
pub fn sg_flux_n<S: Scalar>(vt: S, v1: S, v2: S, n1: S, n2: S) -> S {
    let u = (v2 - v1) / vt;
    n2 * bern(u) - n1 * bern(-u)
}

/// Hole continuity contribution for node 1 of an edge:
/// `p2·B(-u) - p1·B(u)` (the sign-flipped argument of the electron form).
///
/// Vanishes exactly when both endpoints satisfy `p ∝ exp(-ψ/Vt)`.
#[inline]
#[must_use]
pub fn sg_flux_p<S: Scalar>(vt: S, v1: S, v2: S, p1: S, p2: S) -> S {
    let u = (v2 - v1) / vt;
    p2 * bern(-u) - p1 * bern(u)
}

/// Electron density at the edge midpoint consistent with the S–G flux.
///
/// Along the edge the exact constant-flux profile is
/// `n(ξ) = n1 + (n2-n1)·(e^{uξ}-1)/(e^u-1)`; at `ξ = 1/2` the weight
/// reduces to `1/(1+e^{u/2})`. In Boltzmann equilibrium this midpoint is
/// the geometric mean `√(n1·n2)`.
#[inline]
#[must_use]
pub fn nmid<S: Scalar>(vt: S, v1: S, v2: S, n1: S, n2: S) -> S {
    let u = (v2 - v1) / vt;
    n1 + (n2 - n1) / ((u * 0.5).exp() + 1.0)
}

/// Hole density at the edge midpoint consistent with the S–G flux
/// (mirror of [`nmid`] under `ψ → -ψ`).
#[inline]
#[must_use]
pub fn pmid<S: Scalar>(vt: S, v1: S, v2: S, p1: S, p2: S) -> S {
    let u = (v1 - v2) / vt;
    p1 + (p2 - p1) / ((u * 0.5).exp() + 1.0)
}
