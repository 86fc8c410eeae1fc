use tracing::{debug, trace, warn};

use crate::linalg::{bell_triangular, factorial};
use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::root::{halley, newton};
use super::{OptimError, RootResult};

/// Householder iteration of order `derivatives.len()` for `f(x) = target`.
///
/// `derivatives[k]` is the `(k+1)`-th derivative of `f`. One derivative
/// gives [`newton`], two give [`halley`], and three or more use
/// [`householder_general`].
///
/// Derivatives can come from [`crate::diff`] when no closed form exists:
///
/// ```
/// use stepwise::diff::{Derivative, DerivativeSettings};
/// use stepwise::optim::householder;
/// use stepwise::Tolerance;
///
/// let f = |x: f64| x.exp() - 2.0 * x;
/// let df = Derivative::new(f, DerivativeSettings::default()).unwrap();
/// let d1: &dyn Fn(f64) -> f64 = &|x| df.estimate(x);
/// let r = householder(f, &[d1], 3.0, 2.0, &Tolerance::HOUSEHOLDER).unwrap();
/// assert!((r.x.exp() - 2.0 * r.x - 3.0).abs() < 1e-8);
/// ```
///
/// # Errors
///
/// [`OptimError::MissingDerivative`] for an empty slice, otherwise those of
/// the dispatched method.
pub fn householder<T: FloatScalar>(
    f: impl FnMut(T) -> T,
    derivatives: &[&dyn Fn(T) -> T],
    target: T,
    x0: T,
    tol: &Tolerance<T>,
) -> Result<RootResult<T>, OptimError> {
    match derivatives {
        [] => Err(OptimError::MissingDerivative),
        [df] => newton(f, df, target, x0, tol),
        [df, d2f] => halley(f, df, d2f, target, x0, tol),
        _ => householder_general(f, derivatives, target, x0, tol),
    }
}

/// Householder iteration of arbitrary order `n = derivatives.len()`.
///
/// With `g = f - target`, the step is `n·(1/g)^(n-1) / (1/g)^(n)`; the
/// derivatives of `1/g` come from Faà di Bruno's formula
///
/// ```text
/// (1/g)^(m) = Σ_(k=1)^m (-1)^k k! B[m][k] / g^(k+1)
/// ```
///
/// over the partial Bell polynomials of `g', ..., g^(n)`. Both sums are
/// multiplied through by `g^(n+1)` before dividing, which leaves the ratio
/// unchanged and keeps it finite near the root.
///
/// ```
/// use stepwise::optim::householder_general;
/// use stepwise::Tolerance;
///
/// let f = |x: f64| x.cos() - x;
/// let d: [&dyn Fn(f64) -> f64; 3] = [&|x| -x.sin() - 1.0, &|x| -x.cos(), &|x| x.sin()];
/// let r = householder_general(f, &d, 0.0, 0.5, &Tolerance::HOUSEHOLDER).unwrap();
/// assert!((r.x - 0.7390851332151607).abs() < 1e-12);
/// ```
pub fn householder_general<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    derivatives: &[&dyn Fn(T) -> T],
    target: T,
    x0: T,
    tol: &Tolerance<T>,
) -> Result<RootResult<T>, OptimError> {
    let n = derivatives.len();
    if n == 0 {
        return Err(OptimError::MissingDerivative);
    }

    let mut x = x0;
    let mut evals = 0usize;
    let max_iter = tol.max_iter();
    let mut d = vec![T::zero(); n];

    for iter in 1..=max_iter {
        let g = f(x) - target;
        evals += 1;
        if g == T::zero() {
            return Ok(RootResult {
                x,
                fx: g,
                iterations: iter - 1,
                evals,
            });
        }

        for (slot, df) in d.iter_mut().zip(derivatives) {
            *slot = df(x);
        }
        evals += n;
        let bell = bell_triangular(&d);

        let num = if n == 1 {
            g
        } else {
            faa_di_bruno_scaled(g, n - 1, n, |k| bell[(n - 1, k)])
        };
        let den = faa_di_bruno_scaled(g, n, n, |k| bell[(n, k)]);
        if den == T::zero() {
            return Err(OptimError::DerivativeZero { x: x.as_f64() });
        }

        let step = -T::lit(n as f64) * num / den;
        if !step.is_finite() {
            return Err(OptimError::NotFinite { x: x.as_f64() });
        }
        let x_new = x - step;
        trace!(iter, x = x.as_f64(), step = step.as_f64(), "householder step");

        if step.abs() <= tol.threshold(x) {
            let fx = f(x_new) - target;
            evals += 1;
            debug!(order = n, x = x_new.as_f64(), iterations = iter, evals, "householder converged");
            return Ok(RootResult {
                x: x_new,
                fx,
                iterations: iter,
                evals,
            });
        }
        x = x_new;
    }

    warn!(order = n, best = x.as_f64(), max_iter, "householder did not converge");
    Err(OptimError::MaxIterations {
        iterations: max_iter,
        best: x.as_f64(),
    })
}

/// `g^(n+1) · Σ_(k=1)^m (-1)^k k! B[m][k] / g^(k+1)`.
fn faa_di_bruno_scaled<T: FloatScalar>(g: T, m: usize, n: usize, bell: impl Fn(usize) -> T) -> T {
    (1..=m).fold(T::zero(), |acc, k| {
        let sign = if k % 2 == 1 { -T::one() } else { T::one() };
        acc + sign * factorial::<T>(k) * bell(k) * g.powi((n - k) as i32)
    })
}
