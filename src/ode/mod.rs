//! Adaptive explicit Runge-Kutta integration with dense output.
//!
//! [`RungeKutta`] integrates `dy/dt = f(t, y)` for a state vector `y` from
//! `t0` towards `t_end` (either direction), one accepted step at a time.
//! The method is a type parameter implementing [`ButcherTableau`]:
//!
//! | Method   | Stages | Order | Error estimate | Interpolant |
//! |----------|--------|-------|----------------|-------------|
//! | [`RK23`] |      3 | 3     | 2nd order      | cubic       |
//! | [`RK45`] |      6 | 5     | 4th order      | quartic     |
//!
//! Both are FSAL: the derivative at the new point is the first stage of the
//! next step and also enters the error estimate.
//!
//! # Step control
//!
//! The local error is scaled per component by
//! `abs_tol + rel_tol·max(|y_old|, |y_new|)` and reduced to an RMS norm.
//! A step is accepted when the norm is below 1; the next step is scaled by
//! `safety·err^(-1/(ERROR_ORDER + 1))`, clamped to `[min_factor, max_factor]`
//! (and to at most 1 right after a rejection). Steps shorter than ten ulps of
//! `t` end the integration with [`OdeState::StepTooSmall`].
//!
//! # Dense output
//!
//! Every accepted step stores a [`DenseSegment`], so the solution can be
//! evaluated anywhere in the integrated interval with
//! [`evaluate`](RungeKutta::evaluate).
//!
//! # Example
//!
//! ```
//! use stepwise::ode::{solve_ivp, OdeSettings, OdeState, RK45};
//!
//! // harmonic oscillator y'' = -y as [y, y']
//! let settings = OdeSettings {
//!     tolerance: stepwise::Tolerance::new(10.0, 10.0, 5.0),
//!     ..OdeSettings::default()
//! };
//! let tau = 2.0 * std::f64::consts::PI;
//! let sol = solve_ivp::<RK45, _, _>(|_t, y: &[f64]| vec![y[1], -y[0]], 0.0, &[1.0, 0.0], tau, settings).unwrap();
//! assert_eq!(sol.state(), OdeState::Succeeded);
//! let y = sol.current_state();
//! assert!((y[0] - 1.0).abs() < 1e-7 && y[1].abs() < 1e-7);
//! let quarter = sol.evaluate(tau / 4.0).unwrap();
//! assert!(quarter[0].abs() < 1e-6);
//! ```

mod adaptive;
mod tableau;

#[cfg(test)]
mod tests;

pub use adaptive::{solve_ivp, BogackiShampine, DormandPrince, OdeSettings, RungeKutta};
pub use tableau::{ButcherTableau, RK23, RK45};

use thiserror::Error;

use crate::dynmatrix::DynMatrix;
use crate::traits::FloatScalar;

/// Integrator state after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OdeState {
    /// More steps needed to reach the end point.
    Processing,
    /// The end point was reached.
    Succeeded,
    /// The step size fell below the floating-point floor at the current point.
    StepTooSmall,
    /// The error estimate or the new state became NaN or infinite.
    NotFinite,
    /// Accepted plus rejected steps reached the configured cap.
    MaxStepsExceeded,
}

impl OdeState {
    /// `false` only for [`OdeState::Processing`].
    pub fn is_terminal(self) -> bool {
        self != OdeState::Processing
    }
}

/// Misuse of the integrator.
///
/// Numerical failures are not errors; they end the integration in a
/// terminal [`OdeState`].
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OdeError {
    /// `step` or `run` called after the integration ended.
    #[error("integration already finished in state {0:?}")]
    Terminated(OdeState),
    /// The right-hand side returned a vector of the wrong length.
    #[error("right-hand side returned {got} values for a state of length {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Dense output queried outside the integrated interval.
    #[error("t = {t} is outside the integrated interval [{lower}, {upper}]")]
    OutOfBounds { t: f64, lower: f64, upper: f64 },
}

/// Counters accumulated over an integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdeStats {
    /// Right-hand side evaluations.
    pub evals: usize,
    /// Accepted steps.
    pub accepted: usize,
    /// Rejected step attempts.
    pub rejected: usize,
}

/// Interpolating polynomial over one accepted step `[t_old, t_old + h]`.
///
/// `y(t) = y_old + h·Q·[θ, θ², ..., θ^D]` with `θ = (t - t_old)/h`, where
/// `Q = K·P` is computed from the step's stage table when the step is
/// accepted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DenseSegment<T> {
    t_old: T,
    h: T,
    y_old: Vec<T>,
    q: DynMatrix<T>,
}

impl<T: FloatScalar> DenseSegment<T> {
    pub(crate) fn new(t_old: T, h: T, y_old: Vec<T>, q: DynMatrix<T>) -> Self {
        Self { t_old, h, y_old, q }
    }

    /// Start of the step.
    pub fn start(&self) -> T {
        self.t_old
    }

    /// End of the step.
    pub fn end(&self) -> T {
        self.t_old + self.h
    }

    /// Signed step length.
    pub fn step(&self) -> T {
        self.h
    }

    pub fn contains(&self, t: T) -> bool {
        let (a, b) = (self.start(), self.end());
        a.min(b) <= t && t <= a.max(b)
    }

    /// Value of the interpolant at `t`. Not checked against the segment's
    /// interval; outside it the polynomial is extrapolated.
    pub fn evaluate(&self, t: T) -> Vec<T> {
        let theta = (t - self.t_old) / self.h;
        let mut p = Vec::with_capacity(self.q.ncols());
        let mut power = T::one();
        for _ in 0..self.q.ncols() {
            power = power * theta;
            p.push(power);
        }
        let dy = self.q.mul_vec(&p);
        self.y_old
            .iter()
            .zip(dy)
            .map(|(&y, d)| y + self.h * d)
            .collect()
    }
}
