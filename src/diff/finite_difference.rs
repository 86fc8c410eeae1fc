use tracing::{debug, warn};

use crate::iteration::{refine, IterState, Refinement, RefinementReport};
use crate::linalg::inverse_vandermonde;
use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::{DerivativeEstimate, DiffError, Direction};

/// Settings for [`Derivative`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivativeSettings<T> {
    /// Convergence tolerances and refinement cap (default: rel 10^-7.5, 10 levels).
    pub tolerance: Tolerance<T>,
    /// Accuracy order of the stencil; `(order + 1) / 2` terms per side (default: 8).
    pub order: usize,
    /// Largest stencil offset at the first level (default: 0.5).
    pub initial_step: T,
    /// Factor `c > 1` dividing the step at every level (default: 2).
    pub step_factor: T,
    /// Stencil placement (default: [`Direction::Center`]).
    pub direction: Direction,
}

impl Default for DerivativeSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DERIVATIVE,
            order: 8,
            initial_step: 0.5,
            step_factor: 2.0,
            direction: Direction::Center,
        }
    }
}

impl Default for DerivativeSettings<f32> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(37.0, 3.5, 1.0),
            order: 8,
            initial_step: 0.5,
            step_factor: 2.0,
            direction: Direction::Center,
        }
    }
}

impl<T: FloatScalar> DerivativeSettings<T> {
    fn validate(&self) -> Result<(), DiffError> {
        if self.order == 0 {
            return Err(DiffError::InvalidSettings("order must be at least 1".into()));
        }
        if !(self.step_factor > T::one()) || !self.step_factor.is_finite() {
            return Err(DiffError::InvalidSettings("step factor must be finite and > 1".into()));
        }
        if !(self.initial_step > T::zero()) || !self.initial_step.is_finite() {
            return Err(DiffError::InvalidSettings("initial step must be finite and > 0".into()));
        }
        Ok(())
    }

    fn terms(&self) -> usize {
        (self.order + 1) / 2
    }
}

/// Successive-estimate bookkeeping shared by the refinement estimators.
#[derive(Debug, Clone, Copy)]
pub(super) struct Convergence<T> {
    pub output: T,
    pub last_output: T,
    pub error: T,
    pub last_error: T,
}

impl<T: FloatScalar> Convergence<T> {
    pub fn new() -> Self {
        Self {
            output: T::nan(),
            last_output: T::nan(),
            error: T::nan(),
            last_error: T::nan(),
        }
    }

    pub fn push(&mut self, estimate: T) {
        self.last_output = self.output;
        self.output = estimate;
        self.last_error = self.error;
        self.error = (self.output - self.last_output).abs();
    }

    pub fn check(&self, levels: usize, x: T, tol: &Tolerance<T>) -> IterState {
        if levels >= 1 && !(x.is_finite() && self.output.is_finite()) {
            return IterState::ValueError;
        }
        if levels > 1 {
            if self.error < tol.threshold(self.output) {
                return IterState::Finished;
            }
            // NaN last_error never triggers
            if self.error > self.last_error * T::lit(10.0) {
                return IterState::ErrorIncrease;
            }
        }
        IterState::InProgress
    }

    /// Estimate a caller should use for a run that ended in `state`.
    pub fn best(&self, state: IterState) -> T {
        match state {
            IterState::Finished | IterState::InProgress => self.output,
            IterState::ValueError | IterState::ErrorIncrease => self.last_output,
        }
    }

    pub fn into_result(
        self,
        x: T,
        report: RefinementReport,
        step: T,
    ) -> Result<DerivativeEstimate<T>, DiffError> {
        let best = self.best(report.state).as_f64();
        match report.state {
            IterState::Finished => Ok(DerivativeEstimate {
                value: self.output,
                error: self.error,
                iterations: report.iterations,
                evals: report.evals,
                step,
            }),
            IterState::ValueError => Err(DiffError::NotFinite { x: x.as_f64(), best }),
            IterState::ErrorIncrease => Err(DiffError::ErrorIncrease {
                best,
                error: self.error.as_f64(),
                last_error: self.last_error.as_f64(),
            }),
            IterState::InProgress => Err(DiffError::MaxIterations {
                iterations: report.iterations,
                best,
                error: self.error.as_f64(),
            }),
        }
    }
}

/// Stencil nodes in units of the current step, in weight order.
fn stencil_nodes<T: FloatScalar>(direction: Direction, terms: usize, factor: T) -> Vec<T> {
    let n = terms as i32;
    match direction {
        Direction::Center => (-n..=n)
            .map(|i| {
                if i == 0 {
                    T::zero()
                } else {
                    let mag = T::one() / factor.powi(i.abs() - 1);
                    if i < 0 {
                        -mag
                    } else {
                        mag
                    }
                }
            })
            .collect(),
        Direction::Forward | Direction::Backward => {
            let d = factor.sqrt();
            (0..=2 * n)
                .map(|i| if i == 0 { T::zero() } else { T::one() / d.powi(i - 1) })
                .collect()
        }
    }
}

/// Refinement state for one evaluation point.
///
/// `plus[m]` and `minus[m]` hold `f` at the m-th offset on each side of `x`,
/// where offsets shrink by `c` (central) or `√c` (one-sided) per index. Level
/// `k` reads a window of these tables starting at `k` (central) or `2k`
/// (one-sided).
struct Stencil<'w, T> {
    x: T,
    step: T,
    last_step: T,
    factor: T,
    direction: Direction,
    terms: usize,
    weights: &'w [T],
    level: usize,
    center: T,
    plus: Vec<T>,
    minus: Vec<T>,
    conv: Convergence<T>,
    tol: Tolerance<T>,
}

impl<T: FloatScalar> Stencil<'_, T> {
    fn side(&self) -> T {
        if self.direction == Direction::Backward {
            -T::one()
        } else {
            T::one()
        }
    }

    fn combine(&self) -> T {
        let n = self.terms;
        let k = self.level;
        let w = self.weights;
        match self.direction {
            Direction::Center => {
                let mut s = w[n] * self.center;
                for i in 1..=n {
                    s = s + w[n + i] * self.plus[k + i - 1] + w[n - i] * self.minus[k + i - 1];
                }
                s
            }
            Direction::Forward | Direction::Backward => {
                let mut s = w[0] * self.center;
                for j in 0..2 * n {
                    s = s + w[j + 1] * self.plus[2 * k + j];
                }
                s
            }
        }
    }
}

impl<T: FloatScalar> Refinement<T> for Stencil<'_, T> {
    fn sample_points(&self) -> Vec<T> {
        let n = self.terms;
        let x = self.x;
        let h = self.step;
        let innermost = h / self.factor.powi(n as i32 - 1);
        match self.direction {
            Direction::Center if self.level == 0 => {
                let offsets: Vec<T> = (0..n).map(|m| h / self.factor.powi(m as i32)).collect();
                let mut pts = Vec::with_capacity(2 * n + 1);
                pts.push(x);
                pts.extend(offsets.iter().map(|&o| x + o));
                pts.extend(offsets.iter().map(|&o| x - o));
                pts
            }
            Direction::Center => vec![x + innermost, x - innermost],
            Direction::Forward | Direction::Backward => {
                let s = self.side();
                let d = self.factor.sqrt();
                if self.level == 0 {
                    let mut pts = Vec::with_capacity(2 * n + 1);
                    pts.push(x);
                    pts.extend((0..2 * n).map(|j| x + s * h / d.powi(j as i32)));
                    pts
                } else {
                    vec![x + s * innermost, x + s * innermost / d]
                }
            }
        }
    }

    fn absorb(&mut self, values: &[T]) {
        let n = self.terms;
        if self.level == 0 {
            self.center = values[0];
            match self.direction {
                Direction::Center => {
                    self.plus.extend_from_slice(&values[1..=n]);
                    self.minus.extend_from_slice(&values[n + 1..]);
                }
                Direction::Forward | Direction::Backward => {
                    self.plus.extend_from_slice(&values[1..]);
                }
            }
        } else {
            match self.direction {
                Direction::Center => {
                    self.plus.push(values[0]);
                    self.minus.push(values[1]);
                }
                Direction::Forward | Direction::Backward => {
                    self.plus.extend_from_slice(values);
                }
            }
        }

        let estimate = self.combine() / (self.side() * self.step);
        self.conv.push(estimate);
        self.last_step = self.step;
        self.step = self.step / self.factor;
        self.level += 1;
    }

    fn check(&self, levels: usize) -> IterState {
        self.conv.check(levels, self.x, &self.tol)
    }
}

/// Adaptive finite-difference estimator of `f'`.
///
/// Stencil weights are computed once in [`new`](Derivative::new) and reused
/// for every point and refinement level. Evaluation takes `&self` and keeps
/// no state between calls, so repeated queries return identical results.
///
/// ```
/// use stepwise::diff::{Derivative, DerivativeSettings, Direction};
///
/// let settings = DerivativeSettings { direction: Direction::Forward, ..Default::default() };
/// let d = Derivative::new(|x: f64| x.exp(), settings).unwrap();
/// assert!((d.estimate(0.0) - 1.0).abs() < 1e-8);
/// ```
pub struct Derivative<T, F> {
    f: F,
    settings: DerivativeSettings<T>,
    weights: Vec<T>,
}

impl<T: FloatScalar, F: Fn(T) -> T> Derivative<T, F> {
    /// Build an estimator, computing its stencil weights.
    ///
    /// # Errors
    ///
    /// [`DiffError::InvalidSettings`] for a zero order, a step factor not
    /// above one, or a non-positive initial step.
    pub fn new(f: F, settings: DerivativeSettings<T>) -> Result<Self, DiffError> {
        settings.validate()?;
        let nodes = stencil_nodes(settings.direction, settings.terms(), settings.step_factor);
        let weights = inverse_vandermonde(&nodes).row(1);
        Ok(Self {
            f,
            settings,
            weights,
        })
    }

    pub fn settings(&self) -> &DerivativeSettings<T> {
        &self.settings
    }

    /// First-derivative stencil weights, in node order.
    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    fn run(&self, x: T) -> (Convergence<T>, RefinementReport, T) {
        let s = &self.settings;
        let mut stencil = Stencil {
            x,
            step: s.initial_step,
            last_step: s.initial_step,
            factor: s.step_factor,
            direction: s.direction,
            terms: s.terms(),
            weights: &self.weights,
            level: 0,
            center: T::nan(),
            plus: Vec::new(),
            minus: Vec::new(),
            conv: Convergence::new(),
            tol: s.tolerance,
        };
        let report = refine(&mut stencil, &self.f, s.tolerance.max_iter());
        (stencil.conv, report, stencil.last_step)
    }

    /// Estimate `f'(x)`.
    ///
    /// # Errors
    ///
    /// - [`DiffError::NotFinite`] if `x` or an estimate is NaN or infinite
    /// - [`DiffError::ErrorIncrease`] if successive estimates diverge
    /// - [`DiffError::MaxIterations`] if the refinement cap is reached
    pub fn at(&self, x: T) -> Result<DerivativeEstimate<T>, DiffError> {
        let (conv, report, step) = self.run(x);
        let result = conv.into_result(x, report, step);
        match &result {
            Ok(est) => debug!(
                x = x.as_f64(),
                value = est.value.as_f64(),
                iterations = est.iterations,
                evals = est.evals,
                "finite-difference derivative converged"
            ),
            Err(e) => warn!(x = x.as_f64(), error = %e, "finite-difference derivative failed"),
        }
        result
    }

    /// Best available estimate of `f'(x)`, ignoring failures.
    ///
    /// Returns the converged value, or on failure the estimate from the last
    /// level before things went wrong. Suitable as a derivative closure for
    /// the root finders.
    pub fn estimate(&self, x: T) -> T {
        let (conv, report, _) = self.run(x);
        conv.best(report.state)
    }
}

/// One-shot [`Derivative::at`].
///
/// ```
/// use stepwise::diff::{derivative, DerivativeSettings};
/// let d = derivative(|x: f64| x * x * x, 2.0, &DerivativeSettings::default()).unwrap();
/// assert!((d.value - 12.0).abs() < 1e-9);
/// ```
pub fn derivative<T: FloatScalar>(
    f: impl Fn(T) -> T,
    x: T,
    settings: &DerivativeSettings<T>,
) -> Result<DerivativeEstimate<T>, DiffError> {
    Derivative::new(f, *settings)?.at(x)
}
