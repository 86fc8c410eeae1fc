//! Definite integration of scalar functions.
//!
//! # Gauss-Kronrod
//!
//! [`gauss_kronrod`] applies an `n`-point Gauss-Legendre rule and its
//! `2n+1`-point Kronrod extension to the same interval. The Kronrod value is
//! the estimate, `|K - G|` the error, and an interval whose error misses the
//! tolerance is bisected. The rules from G7/K15 up to G30/K61 are tabulated
//! ([`KronrodRule`]). [`gauss_legendre`] evaluates the Gauss rule alone,
//! without error control.
//!
//! Infinite limits are mapped onto a finite interval first:
//!
//! | Limits      | Substitution            | Integrated over |
//! |-------------|-------------------------|-----------------|
//! | `(-∞, ∞)`   | `x = t / (1 - t²)`      | `[-1, 1]`       |
//! | `[a, ∞)`    | `x = a + t / (1 - t)`   | `[0, 1]`        |
//! | `(-∞, b]`   | `x = b - (1 - t) / t`   | `[0, 1]`        |
//!
//! Reversed limits flip the sign; equal limits give zero without sampling.
//!
//! # Newton-Cotes
//!
//! Sample-based rules over `(x, f(x))` pairs with strictly increasing `x`:
//! [`trapezoidal`], irregular-spacing [`simpson`], composite closed
//! [`newton_cotes`] of any degree (weights from the inverse Vandermonde
//! matrix of each block's nodes), and [`romberg`] extrapolation over
//! `2^k + 1` evenly spaced samples. [`evenly_spaced`] produces such samples.
//!
//! # Fractional integrals
//!
//! [`riemann_liouville_integral`] evaluates
//! `I^α f(x) = 1/Γ(α) ∫_base^x f(t)·(x - t)^(α-1) dt` for any real `α > 0`.
//!
//! ```
//! use stepwise::quad::{gauss_kronrod, QuadSettings};
//!
//! let r = gauss_kronrod(|t: f64| (-t * t).exp(), 0.0, f64::INFINITY, &QuadSettings::default()).unwrap();
//! assert!((r.value - core::f64::consts::PI.sqrt() / 2.0).abs() < 1e-14);
//! ```

mod gauss_kronrod;
mod newton_cotes;
mod riemann_liouville;
mod tables;

#[cfg(test)]
mod tests;

pub use gauss_kronrod::{gauss_kronrod, gauss_legendre};
pub use newton_cotes::{evenly_spaced, newton_cotes, romberg, romberg_table, simpson, trapezoidal};
pub use riemann_liouville::riemann_liouville_integral;

use thiserror::Error;

use crate::tolerance::Tolerance;

use tables::RuleTable;

/// Errors from the quadrature routines.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuadError {
    /// A limit is NaN.
    #[error("invalid integration limits [{a}, {b}]")]
    InvalidLimits { a: f64, b: f64 },
    /// The integrand produced NaN or infinity.
    #[error("integral over [{a}, {b}] is not finite")]
    NotFinite { a: f64, b: f64 },
    /// Bisection depth exhausted with some interval still above tolerance.
    #[error("subdivision depth {depth} exhausted (best {best}, error {error:e})")]
    MaxDepth { depth: usize, best: f64, error: f64 },
    /// Not enough samples for the rule.
    #[error("need at least {need} samples, got {got}")]
    TooFewSamples { got: usize, need: usize },
    /// Sample abscissae not strictly increasing at `index`.
    #[error("sample abscissae must be strictly increasing (index {index})")]
    UnorderedSamples { index: usize },
    /// Romberg needs evenly spaced samples.
    #[error("samples are not evenly spaced (index {index})")]
    UnevenSamples { index: usize },
    /// Romberg needs `2^k + 1` samples.
    #[error("romberg needs 2^k + 1 samples, got {0}")]
    RombergSampleCount(usize),
    /// Newton-Cotes degree must be at least one.
    #[error("newton-cotes degree must be at least 1")]
    ZeroDegree,
    /// Fractional integration order must be finite and positive.
    #[error("integration order must be finite and positive, got {0}")]
    InvalidOrder(f64),
}

impl QuadError {
    /// Best available estimate, if the failure happened after integrating.
    pub fn best(&self) -> Option<f64> {
        match *self {
            QuadError::MaxDepth { best, .. } => Some(best),
            _ => None,
        }
    }
}

/// A converged adaptive quadrature.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadResult<T> {
    /// Integral estimate.
    pub value: T,
    /// Sum of the per-interval `|K - G|` estimates.
    pub error: T,
    /// Estimate of `∫|f|` on the same intervals.
    pub l1_norm: T,
    /// Integrand evaluations.
    pub evals: usize,
}

/// Tabulated Gauss-Legendre / Kronrod pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KronrodRule {
    G7K15,
    #[default]
    G10K21,
    G15K31,
    G20K41,
    G25K51,
    G30K61,
}

impl KronrodRule {
    /// Points of the Gauss rule.
    pub fn gauss_points(self) -> usize {
        match self {
            KronrodRule::G7K15 => 7,
            KronrodRule::G10K21 => 10,
            KronrodRule::G15K31 => 15,
            KronrodRule::G20K41 => 20,
            KronrodRule::G25K51 => 25,
            KronrodRule::G30K61 => 30,
        }
    }

    /// Points of the Kronrod extension, `2n + 1`.
    pub fn kronrod_points(self) -> usize {
        2 * self.gauss_points() + 1
    }

    fn table(self) -> &'static RuleTable {
        match self {
            KronrodRule::G7K15 => &tables::G7K15,
            KronrodRule::G10K21 => &tables::G10K21,
            KronrodRule::G15K31 => &tables::G15K31,
            KronrodRule::G20K41 => &tables::G20K41,
            KronrodRule::G25K51 => &tables::G25K51,
            KronrodRule::G30K61 => &tables::G30K61,
        }
    }
}

/// Settings for [`gauss_kronrod`] and [`riemann_liouville_integral`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuadSettings<T> {
    /// `abs_tol + rel_tol·|estimate|` is the target error over the whole
    /// interval, halved at each bisection; an interval also stops once its
    /// own error is within `rel_tol` of its estimate. `max_iter` is the
    /// bisection depth (default: rel 10^-14, no absolute term, depth 15).
    pub tolerance: Tolerance<T>,
    /// Gauss/Kronrod pair (default: G10/K21).
    pub rule: KronrodRule,
}

impl Default for QuadSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(f64::INFINITY, 14.0, 1.18),
            rule: KronrodRule::default(),
        }
    }
}
