//! Scalar root finding, minimization and inversion of monotone functions.
//!
//! Every solver works on a single real variable and is configured with a
//! [`Tolerance`](crate::Tolerance). Solvers that look for `f(x) = target`
//! take the target explicitly; the residual `f(x) - target` is what they
//! drive to zero and what [`RootResult::fx`] reports.
//!
//! # Root finding
//!
//! - [`bisection`]: bracketed, needs a sign change of `f - target`
//! - [`newton`], [`halley`]: classical first- and second-order iteration
//! - [`householder`]: order chosen by the number of derivatives supplied;
//!   order 1 and 2 dispatch to Newton and Halley, higher orders use
//!   [`householder_general`] (Faà di Bruno with partial Bell polynomials)
//!
//! # Minimization
//!
//! - [`bracket_minimum`] / [`bracket_from_points`]: downhill search for a
//!   triple `a < b < c` with `f(b)` below both ends
//! - [`minimize`]: Brent's golden-section / parabolic search over a bracket
//! - [`minimize_from`]: both phases in one call
//!
//! # Inverse functions
//!
//! [`MonotoneInverse`] solves `f(x) = y` for a strictly monotone `f` on a
//! (possibly unbounded, possibly open) [`Domain`] by minimizing
//! `(f(x) - y)²` with Brent's method.
//!
//! ```
//! use stepwise::optim::{newton, halley};
//! use stepwise::Tolerance;
//!
//! let tol = Tolerance::HOUSEHOLDER;
//! let f = |x: f64| x.cos() - x;
//! let n = newton(f, |x| -x.sin() - 1.0, 0.0, 0.5, &tol).unwrap();
//! let h = halley(f, |x| -x.sin() - 1.0, |x| -x.cos(), 0.0, 0.5, &tol).unwrap();
//! assert!((n.x - 0.7390851332151607).abs() < 1e-12);
//! assert!(h.iterations < n.iterations);
//! ```

mod brent;
mod householder;
mod inverse;
mod root;

#[cfg(test)]
mod tests;

pub use brent::{
    bracket_from_points, bracket_minimum, minimize, minimize_from, BracketSettings, BrentSettings,
};
pub use householder::{householder, householder_general};
pub use inverse::{Domain, MonotoneInverse};
pub use root::{bisection, halley, newton};

use thiserror::Error;

use crate::traits::FloatScalar;

/// Errors from the root finders and minimizers.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptimError {
    /// `f(a) - target` and `f(b) - target` do not have strictly opposite signs.
    #[error("no sign change between f({a}) = {fa} and f({b}) = {fb}")]
    BracketInvalid { a: f64, fa: f64, b: f64, fb: f64 },
    /// The Newton/Halley/Householder denominator vanished.
    #[error("derivative was zero at x = {x}")]
    DerivativeZero { x: f64 },
    /// Iteration cap reached before the tolerance was met.
    #[error("failed to converge after {iterations} iterations (best {best})")]
    MaxIterations { iterations: usize, best: f64 },
    /// A function or derivative value became NaN or infinite.
    #[error("non-finite value at x = {x}")]
    NotFinite { x: f64 },
    /// Downhill search ran out of iterations without enclosing a minimum.
    #[error("no minimum bracket found after {iterations} iterations (last {bracket:?})")]
    NoMinimumBracket { iterations: usize, bracket: Bracket<f64> },
    /// The search ended, or the caller passed, a triple that does not bracket a minimum.
    #[error("invalid minimum bracket {bracket:?}")]
    InvalidBracket { bracket: Bracket<f64> },
    /// Initial bracket points must number 0, 2 or 3.
    #[error("bracketing needs 0, 2 or 3 initial points, got {0}")]
    InitialPoints(usize),
    /// Equal values at both reference points of the domain.
    #[error("function is not strictly monotonic between {a} and {b}")]
    NotMonotonic { a: f64, b: f64 },
    /// Target below the reachable range.
    #[error("target {target} is below the lower limit {limit} of the range")]
    BelowRange { target: f64, limit: f64 },
    /// Target above the reachable range.
    #[error("target {target} is above the upper limit {limit} of the range")]
    AboveRange { target: f64, limit: f64 },
    /// Householder iteration called without derivatives.
    #[error("at least one derivative is required")]
    MissingDerivative,
}

/// Result of a scalar root-finding algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RootResult<T> {
    /// Approximate root.
    pub x: T,
    /// Residual at the root: `f(x) - target`.
    pub fx: T,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of function and derivative evaluations.
    pub evals: usize,
}

/// Result of a scalar minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinimizeResult<T> {
    /// Approximate minimizer.
    pub x: T,
    /// Function value at the minimizer.
    pub fx: T,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Number of function evaluations.
    pub evals: usize,
}

/// Three abscissae with their function values, `xb` between `xa` and `xc`.
///
/// A valid minimum bracket has `xb` strictly between the ends and `fb`
/// strictly below one end while not above the other.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bracket<T> {
    pub xa: T,
    pub fa: T,
    pub xb: T,
    pub fb: T,
    pub xc: T,
    pub fc: T,
}

impl<T: FloatScalar> Bracket<T> {
    /// Whether the triple encloses a local minimum.
    pub fn is_valid(&self) -> bool {
        let Bracket {
            xa,
            fa,
            xb,
            fb,
            xc,
            fc,
        } = *self;
        let lowest = (fb < fc && fb <= fa) || (fb < fa && fb <= fc);
        let ordered = (xa < xb && xb < xc) || (xc < xb && xb < xa);
        let finite = xa.is_finite() && xb.is_finite() && xc.is_finite();
        lowest && ordered && finite
    }

    pub fn to_f64(&self) -> Bracket<f64> {
        Bracket {
            xa: self.xa.as_f64(),
            fa: self.fa.as_f64(),
            xb: self.xb.as_f64(),
            fb: self.fb.as_f64(),
            xc: self.xc.as_f64(),
            fc: self.fc.as_f64(),
        }
    }
}
