//! Base-10 exponent tolerance configuration.
//!
//! Every iterative routine in the crate is configured with a [`Tolerance`]:
//! three exponents from which the absolute tolerance, relative tolerance and
//! iteration cap are derived.
//!
//! | Field          | Derived value              |
//! |----------------|----------------------------|
//! | `abs_exp`      | `abs_tol = 10^-abs_exp`    |
//! | `rel_exp`      | `rel_tol = 10^-rel_exp`    |
//! | `max_iter_exp` | `max_iter = ⌊10^max_iter_exp⌋` |
//!
//! An exponent of `+∞` switches the corresponding tolerance off (it becomes
//! exactly zero).

use crate::traits::FloatScalar;

/// Tolerance exponents for an iterative solve.
///
/// ```
/// use stepwise::Tolerance;
///
/// let tol = Tolerance::new(8.0_f64, f64::INFINITY, 2.0);
/// assert_eq!(tol.abs_tol(), 1e-8);
/// assert_eq!(tol.rel_tol(), 0.0);
/// assert_eq!(tol.max_iter(), 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance<T> {
    /// Negative base-10 logarithm of the absolute tolerance.
    pub abs_exp: T,
    /// Negative base-10 logarithm of the relative tolerance.
    pub rel_exp: T,
    /// Base-10 logarithm of the iteration cap.
    pub max_iter_exp: T,
}

impl<T: FloatScalar> Tolerance<T> {
    pub fn new(abs_exp: T, rel_exp: T, max_iter_exp: T) -> Self {
        Self {
            abs_exp,
            rel_exp,
            max_iter_exp,
        }
    }

    /// Absolute tolerance `10^-abs_exp`.
    #[inline]
    pub fn abs_tol(&self) -> T {
        pow10(-self.abs_exp)
    }

    /// Relative tolerance `10^-rel_exp`.
    #[inline]
    pub fn rel_tol(&self) -> T {
        pow10(-self.rel_exp)
    }

    /// Iteration cap `⌊10^max_iter_exp⌋`, saturating at `usize::MAX`.
    pub fn max_iter(&self) -> usize {
        let n = pow10(self.max_iter_exp).floor();
        if n.is_nan() || n <= T::zero() {
            0
        } else {
            n.to_usize().unwrap_or(usize::MAX)
        }
    }

    /// Convergence threshold `abs_tol + rel_tol·|scale|`.
    #[inline]
    pub fn threshold(&self, scale: T) -> T {
        self.abs_tol() + self.rel_tol() * scale.abs()
    }
}

impl Tolerance<f64> {
    /// Bisection defaults: `|b - a| < 2e-12`, 100 halvings.
    pub const BISECTION: Self = Self {
        abs_exp: 11.7,
        rel_exp: 15.0,
        max_iter_exp: 2.0,
    };

    /// Householder defaults: `|step| ≤ 1.48e-8`, no relative term, 50 iterations.
    pub const HOUSEHOLDER: Self = Self {
        abs_exp: 7.83,
        rel_exp: f64::INFINITY,
        max_iter_exp: 1.7,
    };

    /// Finite-difference defaults: relative `3.2e-8`, 10 refinement levels.
    pub const DERIVATIVE: Self = Self {
        abs_exp: 300.0,
        rel_exp: 7.5,
        max_iter_exp: 1.0,
    };
}

#[inline]
fn pow10<T: FloatScalar>(e: T) -> T {
    T::lit(10.0).powf(e)
}
