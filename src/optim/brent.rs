use tracing::{debug, trace, warn};

use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::{Bracket, MinimizeResult, OptimError};

/// Golden ratio `φ`, the default downhill expansion factor.
const GOLD: f64 = 1.618_033_988_749_895;
/// `2 - φ`, the golden-section fraction.
const GOLDEN_SECTION: f64 = 0.381_966_011_250_105_1;

/// Settings for [`bracket_minimum`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BracketSettings<T> {
    /// `abs_tol` guards the parabolic denominator; `max_iter` caps the
    /// downhill steps. The relative part is unused.
    pub tolerance: Tolerance<T>,
    /// Largest parabolic extrapolation, in units of the last interval.
    pub grow_limit: T,
}

impl Default for BracketSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(21.0, f64::INFINITY, 3.0),
            grow_limit: 110.0,
        }
    }
}

/// Settings for [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrentSettings<T> {
    /// `rel_tol·|x| + abs_tol` is the smallest step distinguished from `x`;
    /// `max_iter` caps the iterations (default: rel 10^-7.83, abs 10^-11, 501).
    pub tolerance: Tolerance<T>,
}

impl Default for BrentSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(11.0, 7.83, 2.7),
        }
    }
}

/// Downhill search from `xa`, `xb` for a triple enclosing a minimum.
///
/// Proposes each new point by parabolic extrapolation through the last
/// three, bounded by `grow_limit` intervals, and falls back to golden-ratio
/// expansion when the parabola is useless. Returns after three function
/// evaluations plus one or two per step.
///
/// # Errors
///
/// [`OptimError::NoMinimumBracket`] when the iteration cap is hit, and
/// [`OptimError::InvalidBracket`] when the search ends on a triple that does
/// not satisfy [`Bracket::is_valid`] (e.g. the function keeps decreasing
/// into a non-finite abscissa). Both carry the last triple.
///
/// ```
/// use stepwise::optim::{bracket_minimum, BracketSettings};
///
/// let b = bracket_minimum(|x: f64| (x - 2.0).powi(2), 0.0, 1.0, &BracketSettings::default()).unwrap();
/// assert!(b.xa < 2.0 && 2.0 < b.xc && b.is_valid());
/// ```
pub fn bracket_minimum<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    xa: T,
    xb: T,
    settings: &BracketSettings<T>,
) -> Result<Bracket<T>, OptimError> {
    let gold = T::lit(GOLD);
    let two = T::lit(2.0);
    let very_small = settings.tolerance.abs_tol();
    let grow_limit = settings.grow_limit;
    let max_iter = settings.tolerance.max_iter();

    let (mut xa, mut xb) = (xa, xb);
    let (mut fa, mut fb) = (f(xa), f(xb));
    // walk downhill from a to b
    if fa < fb {
        core::mem::swap(&mut xa, &mut xb);
        core::mem::swap(&mut fa, &mut fb);
    }
    let mut xc = xb + gold * (xb - xa);
    let mut fc = f(xc);

    let mut iter = 0usize;
    while fc < fb {
        let tmp1 = (xb - xa) * (fb - fc);
        let tmp2 = (xb - xc) * (fb - fa);
        let val = tmp2 - tmp1;
        let denom = if val.abs() < very_small {
            two * very_small
        } else {
            two * val
        };
        let mut w = xb - ((xb - xc) * tmp2 - (xb - xa) * tmp1) / denom;
        let wlim = xb + grow_limit * (xc - xb);

        if iter >= max_iter {
            let bracket = Bracket { xa, fa, xb, fb, xc, fc };
            warn!(iterations = iter, "minimum bracket search exhausted");
            return Err(OptimError::NoMinimumBracket {
                iterations: iter,
                bracket: bracket.to_f64(),
            });
        }
        iter += 1;

        let fw;
        if (w - xc) * (xb - w) > T::zero() {
            // parabolic point between b and c
            let fwp = f(w);
            if fwp < fc {
                xa = xb;
                fa = fb;
                xb = w;
                fb = fwp;
                break;
            } else if fwp > fb {
                xc = w;
                fc = fwp;
                break;
            }
            w = xc + gold * (xc - xb);
            fw = f(w);
        } else if (w - wlim) * (wlim - xc) >= T::zero() {
            w = wlim;
            fw = f(w);
        } else if (w - wlim) * (xc - w) > T::zero() {
            // between c and the growth limit
            let fwp = f(w);
            if fwp < fc {
                xb = xc;
                xc = w;
                w = xc + gold * (xc - xb);
                fb = fc;
                fc = fwp;
                fw = f(w);
            } else {
                fw = fwp;
            }
        } else {
            w = xc + gold * (xc - xb);
            fw = f(w);
        }

        xa = xb;
        xb = xc;
        xc = w;
        fa = fb;
        fb = fc;
        fc = fw;
        trace!(iter, xa = xa.as_f64(), xb = xb.as_f64(), xc = xc.as_f64(), "bracket step");
    }

    let bracket = Bracket { xa, fa, xb, fb, xc, fc };
    if !bracket.is_valid() {
        warn!(bracket = ?bracket.to_f64(), "bracket search ended on an invalid triple");
        return Err(OptimError::InvalidBracket {
            bracket: bracket.to_f64(),
        });
    }
    Ok(bracket)
}

/// Build a minimum bracket from 0, 2 or 3 starting points.
///
/// - no points: [`bracket_minimum`] from `0` and `1`
/// - two points: [`bracket_minimum`] from them
/// - three points: sorted and evaluated, then validated as given
///
/// # Errors
///
/// [`OptimError::InitialPoints`] for any other count,
/// [`OptimError::InvalidBracket`] when three points do not enclose a
/// minimum, and the errors of [`bracket_minimum`].
pub fn bracket_from_points<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    points: &[T],
    settings: &BracketSettings<T>,
) -> Result<Bracket<T>, OptimError> {
    match *points {
        [] => bracket_minimum(f, T::zero(), T::one(), settings),
        [a, b] => bracket_minimum(f, a, b, settings),
        [a, b, c] => {
            let mut p = [a, b, c];
            p.sort_by(|x, y| x.partial_cmp(y).unwrap_or(core::cmp::Ordering::Equal));
            let bracket = Bracket {
                xa: p[0],
                fa: f(p[0]),
                xb: p[1],
                fb: f(p[1]),
                xc: p[2],
                fc: f(p[2]),
            };
            if bracket.is_valid() {
                Ok(bracket)
            } else {
                Err(OptimError::InvalidBracket {
                    bracket: bracket.to_f64(),
                })
            }
        }
        _ => Err(OptimError::InitialPoints(points.len())),
    }
}

/// Brent's method for a local minimum inside `bracket`.
///
/// Keeps the best point `x`, the second best `w` and the previous `w` as
/// `v`. Each iteration tries a parabola through them and accepts its vertex
/// only if it falls inside `(a, b)` and moves less than half the step before
/// last; otherwise it takes a golden-section step into the larger half.
/// Stops when `|x - mid| ≤ 2·tol - (b - a)/2` with
/// `tol = rel_tol·|x| + abs_tol`.
///
/// # Errors
///
/// [`OptimError::InvalidBracket`] if `bracket` does not enclose a minimum,
/// [`OptimError::MaxIterations`] (carrying the best `x`) at the cap.
///
/// # Example
///
/// ```
/// use stepwise::optim::{bracket_minimum, minimize, BracketSettings, BrentSettings};
///
/// let f = |x: f64| (x * x - 2.0).powi(2);
/// let b = bracket_minimum(f, 0.0, 1.0, &BracketSettings::default()).unwrap();
/// let m = minimize(f, &b, &BrentSettings::default()).unwrap();
/// assert!((m.x - 2.0_f64.sqrt()).abs() < 1e-7);
/// ```
pub fn minimize<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    bracket: &Bracket<T>,
    settings: &BrentSettings<T>,
) -> Result<MinimizeResult<T>, OptimError> {
    if !bracket.is_valid() {
        return Err(OptimError::InvalidBracket {
            bracket: bracket.to_f64(),
        });
    }

    let tol = &settings.tolerance;
    let cg = T::lit(GOLDEN_SECTION);
    let two = T::lit(2.0);
    let max_iter = tol.max_iter();

    let mut x = bracket.xb;
    let mut fx = bracket.fb;
    let (mut w, mut v) = (x, x);
    let (mut fw, mut fv) = (fx, fx);
    // last and next-to-last step
    let mut delta = T::zero();
    let mut delta2 = T::zero();
    let mut a = bracket.xa.min(bracket.xc);
    let mut b = bracket.xa.max(bracket.xc);
    let mut evals = 0usize;

    for iter in 0..max_iter {
        let mid = (a + b) / two;
        let tol1 = tol.threshold(x);
        let tol2 = two * tol1;
        if (x - mid).abs() <= tol2 - (b - a) / two {
            debug!(x = x.as_f64(), fx = fx.as_f64(), iterations = iter, evals, "brent converged");
            return Ok(MinimizeResult {
                x,
                fx,
                iterations: iter,
                evals,
            });
        }

        if delta2.abs() > tol1 {
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = two * (q - r);
            if q > T::zero() {
                p = -p;
            }
            q = q.abs();
            let td = delta2;
            delta2 = delta;
            if p.abs() >= (q * td / two).abs() || p <= q * (a - x) || p >= q * (b - x) {
                delta2 = if x >= mid { a - x } else { b - x };
                delta = cg * delta2;
            } else {
                delta = p / q;
                let u = x + delta;
                if u - a < tol2 || b - u < tol2 {
                    delta = if mid - x < T::zero() { -tol1.abs() } else { tol1.abs() };
                }
            }
        } else {
            delta2 = if x >= mid { a - x } else { b - x };
            delta = cg * delta2;
        }

        let u = if delta.abs() >= tol1 {
            x + delta
        } else if delta > T::zero() {
            x + tol1.abs()
        } else {
            x - tol1.abs()
        };
        let fu = f(u);
        evals += 1;

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    warn!(best = x.as_f64(), max_iter, "brent did not converge");
    Err(OptimError::MaxIterations {
        iterations: max_iter,
        best: x.as_f64(),
    })
}

/// [`bracket_from_points`] followed by [`minimize`]; `evals` counts both phases.
///
/// ```
/// use stepwise::optim::{minimize_from, BracketSettings, BrentSettings};
///
/// let m = minimize_from(
///     |x: f64| x.cos(),
///     &[3.0, 3.5],
///     &BracketSettings::default(),
///     &BrentSettings::default(),
/// )
/// .unwrap();
/// assert!((m.x - core::f64::consts::PI).abs() < 1e-7);
/// ```
pub fn minimize_from<T: FloatScalar>(
    mut f: impl FnMut(T) -> T,
    points: &[T],
    bracket_settings: &BracketSettings<T>,
    settings: &BrentSettings<T>,
) -> Result<MinimizeResult<T>, OptimError> {
    let mut evals = 0usize;
    let mut counted = |x: T| {
        evals += 1;
        f(x)
    };
    let bracket = bracket_from_points(&mut counted, points, bracket_settings)?;
    let result = minimize(&mut counted, &bracket, settings)?;
    Ok(MinimizeResult { evals, ..result })
}
