// crates/driftfvm-math/src/ad.rs

//! Forward-mode automatic differentiation over a fixed directional width.
//!
//! Each local residual contribution seeds a handful of independent
//! variables (at most [`MAX_DIR`]) and evaluates the contribution once; the
//! gradient slots then hold exactly the Jacobian row entries for that
//! contribution. The dual is `Copy` and lives entirely on the stack, so it
//! is safe to use in per-edge hot loops.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Maximum number of simultaneous derivative directions.
///
/// The widest dependency in the workspace is the 9-variable hanging-node
/// interpolation `(ψ_H,n_H,p_H, ψ_a,n_a,p_a, ψ_b,n_b,p_b)`; 12 leaves slack
/// for the lattice-temperature variants.
pub const MAX_DIR: usize = 12;

/// A first-order dual number with up to [`MAX_DIR`] derivative slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dual {
    /// Function value.
    pub val: f64,
    /// Partial derivatives, one per seeded direction.
    pub dv: [f64; MAX_DIR],
}

impl Dual {
    /// A constant (zero gradient).
    #[inline]
    #[must_use]
    pub const fn constant(val: f64) -> Self {
        Self {
            val,
            dv: [0.0; MAX_DIR],
        }
    }

    /// An independent variable seeded with `d/d(dir) = 1`.
    #[inline]
    #[must_use]
    pub fn var(val: f64, dir: usize) -> Self {
        let mut d = Self::constant(val);
        d.dv[dir] = 1.0;
        d
    }

    /// Derivative with respect to direction `dir`.
    #[inline]
    #[must_use]
    pub fn d(&self, dir: usize) -> f64 {
        self.dv[dir]
    }

    /// The first `n` gradient entries, in seeding order.
    #[inline]
    #[must_use]
    pub fn grad(&self, n: usize) -> &[f64] {
        &self.dv[..n]
    }

    #[inline]
    fn map(self, val: f64, dval: f64) -> Self {
        let mut dv = self.dv;
        for g in &mut dv {
            *g *= dval;
        }
        Self { val, dv }
    }
}

/// Scalar abstraction so flux and material functions can be written once
/// and evaluated either on plain `f64` (residual) or on [`Dual`] (Jacobian).
pub trait Scalar:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
{
    /// Lift a plain number into the scalar type.
    fn from_f64(x: f64) -> Self;
    /// The underlying value (gradient discarded).
    fn value(&self) -> f64;
    /// Natural exponential.
    fn exp(self) -> Self;
    /// Natural logarithm.
    fn ln(self) -> Self;
    /// Square root.
    fn sqrt(self) -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// Inverse hyperbolic sine.
    fn asinh(self) -> Self;
    /// Power with a constant real exponent.
    fn powf(self, e: f64) -> Self;
}

impl Scalar for f64 {
    #[inline]
    fn from_f64(x: f64) -> Self {
        x
    }
    #[inline]
    fn value(&self) -> f64 {
        *self
    }
    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }
    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }
    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
    #[inline]
    fn asinh(self) -> Self {
        f64::asinh(self)
    }
    #[inline]
    fn powf(self, e: f64) -> Self {
        f64::powf(self, e)
    }
}

impl Scalar for Dual {
    #[inline]
    fn from_f64(x: f64) -> Self {
        Self::constant(x)
    }
    #[inline]
    fn value(&self) -> f64 {
        self.val
    }
    #[inline]
    fn exp(self) -> Self {
        let e = self.val.exp();
        self.map(e, e)
    }
    #[inline]
    fn ln(self) -> Self {
        self.map(self.val.ln(), 1.0 / self.val)
    }
    #[inline]
    fn sqrt(self) -> Self {
        let r = self.val.sqrt();
        self.map(r, 0.5 / r)
    }
    #[inline]
    fn abs(self) -> Self {
        if self.val < 0.0 {
            -self
        } else {
            self
        }
    }
    #[inline]
    fn asinh(self) -> Self {
        self.map(self.val.asinh(), 1.0 / (self.val * self.val + 1.0).sqrt())
    }
    #[inline]
    fn powf(self, e: f64) -> Self {
        self.map(self.val.powf(e), e * self.val.powf(e - 1.0))
    }
}

impl Add for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut dv = self.dv;
        for (g, r) in dv.iter_mut().zip(rhs.dv.iter()) {
            *g += r;
        }
        Self {
            val: self.val + rhs.val,
            dv,
        }
    }
}

impl Sub for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut dv = self.dv;
        for (g, r) in dv.iter_mut().zip(rhs.dv.iter()) {
            *g -= r;
        }
        Self {
            val: self.val - rhs.val,
            dv,
        }
    }
}

impl Mul for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut dv = [0.0; MAX_DIR];
        for (i, g) in dv.iter_mut().enumerate() {
            *g = self.dv[i] * rhs.val + rhs.dv[i] * self.val;
        }
        Self {
            val: self.val * rhs.val,
            dv,
        }
    }
}

impl Div for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.val;
        let val = self.val * inv;
        let mut dv = [0.0; MAX_DIR];
        for (i, g) in dv.iter_mut().enumerate() {
            *g = (self.dv[i] - val * rhs.dv[i]) * inv;
        }
        Self { val, dv }
    }
}

impl Neg for Dual {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        let mut dv = self.dv;
        for g in &mut dv {
            *g = -*g;
        }
        Self { val: -self.val, dv }
    }
}

impl AddAssign for Dual {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Dual {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Add<f64> for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self {
            val: self.val + rhs,
            dv: self.dv,
        }
    }
}

impl Sub<f64> for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self {
            val: self.val - rhs,
            dv: self.dv,
        }
    }
}

impl Mul<f64> for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.map(self.val * rhs, rhs)
    }
}

impl Div<f64> for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        self.map(self.val / rhs, 1.0 / rhs)
    }
}

impl Add<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn add(self, rhs: Dual) -> Dual {
        rhs + self
    }
}

impl Sub<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn sub(self, rhs: Dual) -> Dual {
        -rhs + self
    }
}

impl Mul<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn mul(self, rhs: Dual) -> Dual {
        rhs * self
    }
}

impl Div<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn div(self, rhs: Dual) -> Dual {
        Dual::constant(self) / rhs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-7;

    fn central<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
        (f(x + EPS) - f(x - EPS)) / (2.0 * EPS)
    }

    #[test]
    fn arithmetic_matches_finite_differences() {
        let f = |x: f64| (x * x + 3.0 * x) / (x - 0.5);
        let x = 2.0;
        let d = Dual::var(x, 0);
        let y = (d * d + d * 3.0) / (d - 0.5);
        assert!((y.val - f(x)).abs() < 1e-12);
        assert!((y.d(0) - central(f, x)).abs() < 1e-6);
    }

    #[test]
    fn transcendentals_match_finite_differences() {
        let x = 0.8;
        for (ad, plain) in [
            (Dual::var(x, 0).exp(), f64::exp as fn(f64) -> f64),
            (Dual::var(x, 0).ln(), f64::ln),
            (Dual::var(x, 0).sqrt(), f64::sqrt),
            (Dual::var(x, 0).asinh(), f64::asinh),
        ] {
            assert!((ad.val - plain(x)).abs() < 1e-12);
            assert!((ad.d(0) - central(plain, x)).abs() < 1e-6);
        }
    }

    #[test]
    fn independent_directions_do_not_mix() {
        let a = Dual::var(1.5, 0);
        let b = Dual::var(2.5, 1);
        let y = a * b;
        assert!((y.d(0) - 2.5).abs() < 1e-12);
        assert!((y.d(1) - 1.5).abs() < 1e-12);
        assert_eq!(y.d(2), 0.0);
    }
}
