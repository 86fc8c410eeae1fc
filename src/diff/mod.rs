//! Numerical differentiation of scalar functions.
//!
//! # Adaptive finite differences
//!
//! [`Derivative`] estimates `f'(x)` with a high-order stencil whose offsets
//! shrink geometrically by `step_factor` at each refinement level. Stencil
//! weights come from row 1 of the inverse Vandermonde matrix of the stencil
//! nodes and are computed once per estimator. Function values are kept in a
//! table indexed by refinement level, so after the first level each
//! refinement costs two evaluations.
//!
//! | Direction  | Nodes (units of the current step)          |
//! |------------|--------------------------------------------|
//! | `Center`   | `0, ±1, ±1/c, …, ±1/c^(n-1)`               |
//! | `Forward`  | `0, 1, 1/√c, …, 1/√c^(2n-1)`               |
//! | `Backward` | forward nodes, sampled on the negative side |
//!
//! with `n = (order + 1) / 2` terms.
//!
//! # Binomial differences
//!
//! [`binomial_derivative`] computes an integer-order derivative from the
//! backward binomial difference `Σ_j (-1)^j C(m, j) f(x - j·h) / h^m`.
//!
//! # Fractional derivatives
//!
//! [`fractional_derivative`] differentiates to any real order, in the
//! Riemann-Liouville or Caputo sense ([`FractionalKind`]), by applying
//! [`binomial_derivative`] to a
//! [`riemann_liouville_integral`](crate::quad::riemann_liouville_integral).
//!
//! # Termination
//!
//! Both estimators stop when successive estimates agree to
//! `abs_tol + rel_tol·|estimate|`, and fail when the difference between
//! estimates grows tenfold or a value becomes non-finite.
//!
//! # Example
//!
//! ```
//! use stepwise::diff::{Derivative, DerivativeSettings};
//!
//! let d = Derivative::new(|x: f64| x.sin(), DerivativeSettings::default()).unwrap();
//! let est = d.at(1.0).unwrap();
//! assert!((est.value - 1.0_f64.cos()).abs() < 1e-9);
//! ```

mod binomial;
mod finite_difference;
mod fractional;


pub use binomial::{binomial_derivative, BinomialSettings};
pub use finite_difference::{derivative, Derivative, DerivativeSettings};
pub use fractional::{fractional_derivative, FractionalKind, FractionalSettings};

use thiserror::Error;

use crate::quad::QuadError;

/// Side of `x` sampled by the stencil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[default]
    Center,
    Forward,
    Backward,
}

/// A converged derivative estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivativeEstimate<T> {
    /// Derivative estimate.
    pub value: T,
    /// `|value - previous estimate|`.
    pub error: T,
    /// Refinement levels performed.
    pub iterations: usize,
    /// Function evaluations.
    pub evals: usize,
    /// Step used for the final level.
    pub step: T,
}

/// Errors from the derivative estimators.
///
/// Every iteration failure carries `best`, the estimate the caller would
/// have received from the last trustworthy level.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiffError {
    /// The input or an estimate became NaN or infinite.
    #[error("non-finite value while differentiating at x = {x}")]
    NotFinite { x: f64, best: f64 },
    /// Successive estimates started to diverge.
    #[error("estimate diverging: error {error:e} exceeds 10x previous {last_error:e} (best {best})")]
    ErrorIncrease { best: f64, error: f64, last_error: f64 },
    /// Refinement cap reached before the tolerance was met.
    #[error("no convergence after {iterations} refinements (best {best}, error {error:e})")]
    MaxIterations { iterations: usize, best: f64, error: f64 },
    /// Order, step or factor unusable.
    #[error("invalid derivative settings: {0}")]
    InvalidSettings(String),
    /// Fractional derivatives need `x` above the integral's lower terminal.
    #[error("x = {x} is not above the base point {base}")]
    BelowBase { x: f64, base: f64 },
    /// The fractional integral failed.
    #[error(transparent)]
    Quadrature(#[from] QuadError),
}

impl DiffError {
    /// Best available estimate, if the failure happened mid-iteration.
    pub fn best(&self) -> Option<f64> {
        match *self {
            DiffError::NotFinite { best, .. }
            | DiffError::ErrorIncrease { best, .. }
            | DiffError::MaxIterations { best, .. } => Some(best),
            DiffError::Quadrature(ref e) => e.best(),
            DiffError::InvalidSettings(_) | DiffError::BelowBase { .. } => None,
        }
    }
}
