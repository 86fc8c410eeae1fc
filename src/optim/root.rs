use tracing::{debug, warn};

use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::{OptimError, RootResult};

/// Bisection for `f(x) = target` on `[a, b]`.
///
/// The endpoints may be given in either order. Halving stops when the
/// midpoint coincides with an endpoint, the residual at the midpoint is
/// exactly zero, or the bracket width drops below
/// `abs_tol + rel_tol·|mid|`.
///
/// # Errors
///
/// Returns [`OptimError::BracketInvalid`] if the residuals at `a` and `b` do
/// not have strictly opposite signs, and [`OptimError::MaxIterations`] when
/// `tol.max_iter()` halvings are not enough.
///
/// # Example
///
/// ```
/// use stepwise::optim::bisection;
/// use stepwise::Tolerance;
///
/// let r = bisection(|x: f64| x * x, 2.0, 0.0, 2.0, &Tolerance::BISECTION).unwrap();
/// assert!((r.x - core::f64::consts::SQRT_2).abs() < 1e-11);
/// ```
pub fn bisection<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    target: T,
    a: T,
    b: T,
    tol: &Tolerance<T>,
) -> Result<RootResult<T>, OptimError> {
    let (mut xmin, mut xmax) = if a <= b { (a, b) } else { (b, a) };
    let mut g = |x: T| f(x) - target;
    let mut fmin = g(xmin);
    let fmax = g(xmax);
    let mut evals = 2usize;

    if fmin == T::zero() {
        return Ok(RootResult {
            x: xmin,
            fx: fmin,
            iterations: 0,
            evals,
        });
    }
    if fmax == T::zero() {
        return Ok(RootResult {
            x: xmax,
            fx: fmax,
            iterations: 0,
            evals,
        });
    }
    if !(fmin.signum() * fmax.signum() < T::zero()) {
        return Err(OptimError::BracketInvalid {
            a: xmin.as_f64(),
            fa: fmin.as_f64(),
            b: xmax.as_f64(),
            fb: fmax.as_f64(),
        });
    }

    let max_iter = tol.max_iter();
    let mut xmid = xmin;
    for iter in 1..=max_iter {
        xmid = (xmin + xmax) / T::lit(2.0);
        let fmid = g(xmid);
        evals += 1;

        if xmid == xmin
            || xmid == xmax
            || fmid == T::zero()
            || (xmax - xmin).abs() < tol.threshold(xmid)
        {
            debug!(x = xmid.as_f64(), iterations = iter, evals, "bisection converged");
            return Ok(RootResult {
                x: xmid,
                fx: fmid,
                iterations: iter,
                evals,
            });
        }

        if fmid.signum() * fmin.signum() < T::zero() {
            xmax = xmid;
        } else {
            xmin = xmid;
            fmin = fmid;
        }
    }

    warn!(best = xmid.as_f64(), max_iter, "bisection did not converge");
    Err(OptimError::MaxIterations {
        iterations: max_iter,
        best: xmid.as_f64(),
    })
}

/// Newton's method for `f(x) = target`.
///
/// Uses `x_(n+1) = x_n - g/g'` with `g = f - target` and stops once
/// `|step| ≤ abs_tol + rel_tol·|x_n|`.
///
/// # Errors
///
/// [`OptimError::DerivativeZero`] when `f'(x_n) = 0`,
/// [`OptimError::NotFinite`] when the step is NaN or infinite, and
/// [`OptimError::MaxIterations`] when the cap is reached.
pub fn newton<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    mut df: impl FnMut(T) -> T,
    target: T,
    x0: T,
    tol: &Tolerance<T>,
) -> Result<RootResult<T>, OptimError> {
    let mut x = x0;
    let mut evals = 0usize;
    let max_iter = tol.max_iter();

    for iter in 1..=max_iter {
        let fx = f(x) - target;
        evals += 1;
        if fx == T::zero() {
            return Ok(RootResult {
                x,
                fx,
                iterations: iter - 1,
                evals,
            });
        }

        let dfx = df(x);
        evals += 1;
        if dfx == T::zero() {
            return Err(OptimError::DerivativeZero { x: x.as_f64() });
        }

        let step = fx / dfx;
        if !step.is_finite() {
            return Err(OptimError::NotFinite { x: x.as_f64() });
        }
        let x_new = x - step;

        if step.abs() <= tol.threshold(x) {
            let fx = f(x_new) - target;
            evals += 1;
            debug!(x = x_new.as_f64(), iterations = iter, evals, "newton converged");
            return Ok(RootResult {
                x: x_new,
                fx,
                iterations: iter,
                evals,
            });
        }
        x = x_new;
    }

    warn!(best = x.as_f64(), max_iter, "newton did not converge");
    Err(OptimError::MaxIterations {
        iterations: max_iter,
        best: x.as_f64(),
    })
}

/// Halley's method for `f(x) = target`.
///
/// Step `g·g' / (g'² - g·g''/2)`; cubic convergence near simple roots.
/// Errors as for [`newton`].
pub fn halley<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    mut df: impl FnMut(T) -> T,
    mut d2f: impl FnMut(T) -> T,
    target: T,
    x0: T,
    tol: &Tolerance<T>,
) -> Result<RootResult<T>, OptimError> {
    let mut x = x0;
    let mut evals = 0usize;
    let max_iter = tol.max_iter();

    for iter in 1..=max_iter {
        let fx = f(x) - target;
        evals += 1;
        if fx == T::zero() {
            return Ok(RootResult {
                x,
                fx,
                iterations: iter - 1,
                evals,
            });
        }

        let d1 = df(x);
        let d2 = d2f(x);
        evals += 2;
        let gn0 = fx * d1;
        let gn1 = d1 * d1 - fx * d2 / T::lit(2.0);
        if gn1 == T::zero() {
            return Err(OptimError::DerivativeZero { x: x.as_f64() });
        }

        let step = gn0 / gn1;
        if !step.is_finite() {
            return Err(OptimError::NotFinite { x: x.as_f64() });
        }
        let x_new = x - step;

        if step.abs() <= tol.threshold(x) {
            let fx = f(x_new) - target;
            evals += 1;
            debug!(x = x_new.as_f64(), iterations = iter, evals, "halley converged");
            return Ok(RootResult {
                x: x_new,
                fx,
                iterations: iter,
                evals,
            });
        }
        x = x_new;
    }

    warn!(best = x.as_f64(), max_iter, "halley did not converge");
    Err(OptimError::MaxIterations {
        iterations: max_iter,
        best: x.as_f64(),
    })
}
