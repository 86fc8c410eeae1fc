//! Refinement protocol shared by the finite-difference estimators.
//!
//! A refinement estimator is a plain state struct advanced level by level:
//! the driver asks it where to sample, evaluates the caller's function there,
//! hands the values back, and then asks whether the estimate is done.
//! The estimator never calls the function itself, so its state transitions
//! are deterministic given the sampled values.

use tracing::trace;

/// Outcome of a refinement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IterState {
    /// Keep refining.
    InProgress,
    /// Tolerance met.
    Finished,
    /// Input or estimate became non-finite.
    ValueError,
    /// Successive differences grew by more than a factor of ten.
    ErrorIncrease,
}

/// One refinement-style estimator.
pub trait Refinement<T> {
    /// Abscissae to evaluate for the next level.
    fn sample_points(&self) -> Vec<T>;

    /// Fold the function values at [`sample_points`](Refinement::sample_points)
    /// into the estimate and advance one level.
    fn absorb(&mut self, values: &[T]);

    /// State after `levels` completed refinements.
    fn check(&self, levels: usize) -> IterState;
}

/// Counters returned by [`refine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinementReport {
    pub state: IterState,
    pub iterations: usize,
    pub evals: usize,
}

/// Drive `estimator` until it leaves [`IterState::InProgress`] or `max_iter`
/// levels have been absorbed.
///
/// A report still `InProgress` means the cap was hit.
pub fn refine<T: Copy, R: Refinement<T>>(
    estimator: &mut R,
    mut f: impl FnMut(T) -> T,
    max_iter: usize,
) -> RefinementReport {
    let mut iterations = 0usize;
    let mut evals = 0usize;
    let mut state = estimator.check(0);

    while state == IterState::InProgress && iterations < max_iter {
        let xs = estimator.sample_points();
        let values: Vec<T> = xs.iter().map(|&x| f(x)).collect();
        evals += values.len();
        estimator.absorb(&values);
        iterations += 1;
        state = estimator.check(iterations);
        trace!(level = iterations, evals, ?state, "refinement level");
    }

    RefinementReport {
        state,
        iterations,
        evals,
    }
}
