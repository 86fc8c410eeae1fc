use tracing::{debug, warn};

use crate::iteration::{refine, IterState, Refinement};
use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::finite_difference::Convergence;
use super::{DerivativeEstimate, DiffError};

/// Settings for [`binomial_derivative`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinomialSettings<T> {
    /// Convergence tolerances and refinement cap (default: rel 10^-7.5, 1000 levels).
    pub tolerance: Tolerance<T>,
    /// Negative base-10 logarithm of the first step (default: 3, i.e. `h = 1e-3`).
    pub initial_step_exp: T,
    /// Factor dividing the step at every level (default: 10).
    pub step_factor: T,
}

impl Default for BinomialSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(300.0, 7.5, 3.0),
            initial_step_exp: 3.0,
            step_factor: 10.0,
        }
    }
}

/// Backward binomial difference of integer order `m`:
///
/// ```text
/// Δ^m f(x) / h^m = Σ_(j=0)^m w_j · f(x - j·h) / h^m,   w_0 = 1,  w_j = w_(j-1)·(1 - (m+1)/j)
/// ```
struct BinomialDifference<T> {
    x: T,
    step: T,
    last_step: T,
    factor: T,
    order: usize,
    weights: Vec<T>,
    conv: Convergence<T>,
    tol: Tolerance<T>,
}

fn binomial_weights<T: FloatScalar>(order: usize) -> Vec<T> {
    let m1 = T::lit(order as f64 + 1.0);
    let mut w = Vec::with_capacity(order + 1);
    w.push(T::one());
    for j in 1..=order {
        let prev = w[j - 1];
        w.push(prev * (T::one() - m1 / T::lit(j as f64)));
    }
    w
}

impl<T: FloatScalar> Refinement<T> for BinomialDifference<T> {
    fn sample_points(&self) -> Vec<T> {
        (0..=self.order)
            .map(|j| self.x - T::lit(j as f64) * self.step)
            .collect()
    }

    fn absorb(&mut self, values: &[T]) {
        let sum = self
            .weights
            .iter()
            .zip(values)
            .fold(T::zero(), |acc, (&w, &f)| acc + w * f);
        self.conv.push(sum / self.step.powi(self.order as i32));
        self.last_step = self.step;
        self.step = self.step / self.factor;
    }

    fn check(&self, levels: usize) -> IterState {
        self.conv.check(levels, self.x, &self.tol)
    }
}

/// Integer-order derivative `f^(order)(x)` from backward binomial differences.
///
/// The step starts at `10^-initial_step_exp` and is divided by `step_factor`
/// each level until successive estimates agree. Order 0 returns `f(x)`.
///
/// The difference is only first-order accurate, so expect roughly
/// `sqrt(ε)`-level precision for smooth functions.
///
/// ```
/// use stepwise::diff::{binomial_derivative, BinomialSettings};
/// // the second difference of x² is exact at any step
/// let settings = BinomialSettings { initial_step_exp: 1.0, ..Default::default() };
/// let d = binomial_derivative(|x: f64| x * x, 1.5, 2, &settings).unwrap();
/// assert!((d.value - 2.0).abs() < 1e-9);
/// ```
pub fn binomial_derivative<T: FloatScalar>(
    f: impl Fn(T) -> T,
    x: T,
    order: usize,
    settings: &BinomialSettings<T>,
) -> Result<DerivativeEstimate<T>, DiffError> {
    if !(settings.step_factor > T::one()) || !settings.step_factor.is_finite() {
        return Err(DiffError::InvalidSettings("step factor must be finite and > 1".into()));
    }
    if order == 0 {
        let value = f(x);
        return Ok(DerivativeEstimate {
            value,
            error: T::zero(),
            iterations: 0,
            evals: 1,
            step: T::zero(),
        });
    }

    let step = T::lit(10.0).powf(-settings.initial_step_exp);
    let mut diff = BinomialDifference {
        x,
        step,
        last_step: step,
        factor: settings.step_factor,
        order,
        weights: binomial_weights(order),
        conv: Convergence::new(),
        tol: settings.tolerance,
    };
    let report = refine(&mut diff, f, settings.tolerance.max_iter());
    let result = diff.conv.into_result(x, report, diff.last_step);
    match &result {
        Ok(est) => debug!(
            x = x.as_f64(),
            order,
            value = est.value.as_f64(),
            iterations = est.iterations,
            "binomial derivative converged"
        ),
        Err(e) => warn!(x = x.as_f64(), order, error = %e, "binomial derivative failed"),
    }
    result
}
