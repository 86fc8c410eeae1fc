use tracing::{debug, warn};

use crate::traits::FloatScalar;

use super::brent::{bracket_from_points, minimize, BracketSettings, BrentSettings};
use super::OptimError;

/// Interval on which a [`MonotoneInverse`] inverts its function.
///
/// Either end may be infinite and either end may be open. Open ends are
/// never sampled; the function is treated as unbounded there.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain<T> {
    lower: T,
    upper: T,
    lower_open: bool,
    upper_open: bool,
}

impl<T: FloatScalar> Domain<T> {
    /// Domain with explicit openness; the ends are swapped (together with
    /// their flags) when `lower > upper`.
    pub fn new(lower: T, upper: T, lower_open: bool, upper_open: bool) -> Self {
        if lower > upper {
            Self {
                lower: upper,
                upper: lower,
                lower_open: upper_open,
                upper_open: lower_open,
            }
        } else {
            Self {
                lower,
                upper,
                lower_open,
                upper_open,
            }
        }
    }

    /// `[lower, upper]`
    pub fn closed(lower: T, upper: T) -> Self {
        Self::new(lower, upper, false, false)
    }

    /// `(lower, upper)`
    pub fn open(lower: T, upper: T) -> Self {
        Self::new(lower, upper, true, true)
    }

    /// `(-∞, +∞)`
    pub fn real_line() -> Self {
        Self::new(T::neg_infinity(), T::infinity(), true, true)
    }

    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn is_lower_open(&self) -> bool {
        self.lower_open
    }

    pub fn is_upper_open(&self) -> bool {
        self.upper_open
    }

    /// Two interior points used to detect the trend and start the search.
    fn reference_points(&self) -> (T, T) {
        let one = T::one();
        let two = T::lit(2.0);
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => {
                let quarter = (self.upper - self.lower) / T::lit(4.0);
                (self.lower + quarter, self.upper - quarter)
            }
            (true, false) => (self.lower + one, self.lower + two),
            (false, true) => (self.upper - two, self.upper - one),
            (false, false) => (T::zero(), one),
        }
    }

    fn below(&self, x: T) -> bool {
        self.lower.is_finite() && (x < self.lower || (x == self.lower && self.lower_open))
    }

    fn above(&self, x: T) -> bool {
        self.upper.is_finite() && (x > self.upper || (x == self.upper && self.upper_open))
    }
}

/// Inverse of a strictly monotone function.
///
/// [`solve`](MonotoneInverse::solve) finds `x` in the domain with
/// `f(x) = target`. The trend (increasing or decreasing) is sampled at two
/// interior reference points on every call. Targets outside the reachable
/// range are rejected up front; the range is the declared one, completed
/// from `f` at finite domain ends where the declared range is unbounded.
///
/// The root is found by minimizing `(F(x) - target)²` with Brent's method,
/// where `F` equals `f` inside the domain and `∓∞` (by trend) outside it.
/// Expect about `sqrt(ε)` relative accuracy in `x`. A minimizer whose
/// residual `|f(x) - target|` exceeds `sqrt(rel_tol)·max(1, |target|)` is
/// reported as a failure, which happens when the root lies below Brent's
/// absolute tolerance.
///
/// ```
/// use stepwise::optim::{Domain, MonotoneInverse};
///
/// let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(0.0, core::f64::consts::PI));
/// let x = acos.solve(0.5).unwrap();
/// assert!((x - core::f64::consts::FRAC_PI_3).abs() < 1e-7);
/// assert!(acos.solve(1.5).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MonotoneInverse<T, F> {
    f: F,
    domain: Domain<T>,
    range: (T, T),
    bracket: BracketSettings<T>,
    brent: BrentSettings<T>,
}

impl<F: Fn(f64) -> f64> MonotoneInverse<f64, F> {
    /// Inverse over `domain` with the default Brent settings and an
    /// unbounded declared range.
    pub fn new(f: F, domain: Domain<f64>) -> Self {
        Self::with_settings(f, domain, BracketSettings::default(), BrentSettings::default())
    }
}

impl<T: FloatScalar, F: Fn(T) -> T> MonotoneInverse<T, F> {
    pub fn with_settings(
        f: F,
        domain: Domain<T>,
        bracket: BracketSettings<T>,
        brent: BrentSettings<T>,
    ) -> Self {
        Self {
            f,
            domain: Domain::new(domain.lower, domain.upper, domain.lower_open, domain.upper_open),
            range: (T::neg_infinity(), T::infinity()),
            bracket,
            brent,
        }
    }

    /// Declare the range of `f` (e.g. asymptotes the domain ends cannot
    /// reveal). Infinite limits are completed from the domain as usual.
    pub fn with_range(mut self, lower: T, upper: T) -> Self {
        self.range = if lower > upper {
            (upper, lower)
        } else {
            (lower, upper)
        };
        self
    }

    pub fn domain(&self) -> &Domain<T> {
        &self.domain
    }

    /// `+1` if `f` increases across the reference points, `-1` if it decreases.
    ///
    /// # Errors
    ///
    /// [`OptimError::NotMonotonic`] when the reference values are equal or NaN.
    pub fn trend(&self) -> Result<T, OptimError> {
        let (r0, r1) = self.domain.reference_points();
        let (f0, f1) = ((self.f)(r0), (self.f)(r1));
        if f1 > f0 {
            Ok(T::one())
        } else if f1 < f0 {
            Ok(-T::one())
        } else {
            Err(OptimError::NotMonotonic {
                a: r0.as_f64(),
                b: r1.as_f64(),
            })
        }
    }

    /// Reachable range `(low, high)` for the given trend.
    fn reference_values(&self, increasing: bool) -> (T, T) {
        let d = &self.domain;
        let (mut lo, mut hi) = self.range;
        if lo.is_infinite() {
            if increasing && d.lower.is_finite() {
                lo = (self.f)(d.lower);
            } else if !increasing && d.upper.is_finite() {
                lo = (self.f)(d.upper);
            }
        }
        if hi.is_infinite() {
            if increasing && d.upper.is_finite() {
                hi = (self.f)(d.upper);
            } else if !increasing && d.lower.is_finite() {
                hi = (self.f)(d.lower);
            }
        }
        (lo, hi)
    }

    /// `f` inside the domain, `∓∞·trend` below / above it.
    fn bounded(&self, x: T, trend: T) -> T {
        if self.domain.below(x) {
            T::neg_infinity() * trend
        } else if self.domain.above(x) {
            T::infinity() * trend
        } else {
            (self.f)(x)
        }
    }

    /// Solve `f(x) = target`.
    ///
    /// # Errors
    ///
    /// - [`OptimError::NotMonotonic`] (see [`trend`](Self::trend))
    /// - [`OptimError::BelowRange`] / [`OptimError::AboveRange`] when the
    ///   target lies outside the reachable range; a limit attained only at an
    ///   open domain end is itself out of range
    /// - errors of the bracket search and Brent minimizer
    /// - [`OptimError::MaxIterations`] carrying the minimizer when it does not
    ///   solve the equation
    pub fn solve(&self, target: T) -> Result<T, OptimError> {
        let trend = self.trend()?;
        let increasing = trend > T::zero();
        let d = &self.domain;
        let (lo, hi) = self.reference_values(increasing);

        if !lo.is_infinite() {
            let open = if increasing { d.lower_open } else { d.upper_open };
            if (open && target <= lo) || target < lo {
                return Err(OptimError::BelowRange {
                    target: target.as_f64(),
                    limit: lo.as_f64(),
                });
            }
        }
        if !hi.is_infinite() {
            let open = if increasing { d.upper_open } else { d.lower_open };
            if (open && target >= hi) || target > hi {
                return Err(OptimError::AboveRange {
                    target: target.as_f64(),
                    limit: hi.as_f64(),
                });
            }
        }

        let (r0, r1) = d.reference_points();
        if self.bounded(r1, trend) == target {
            return Ok(r1);
        }
        if self.bounded(r0, trend) == target {
            return Ok(r0);
        }

        let loss = |x: T| {
            let e = self.bounded(x, trend) - target;
            e * e
        };
        let bracket = bracket_from_points(loss, &[r0, r1], &self.bracket)?;
        let result = minimize(loss, &bracket, &self.brent)?;

        let residual = (self.bounded(result.x, trend) - target).abs();
        let limit = self.brent.tolerance.rel_tol().sqrt() * T::one().max(target.abs());
        if !(residual <= limit) {
            warn!(
                target = target.as_f64(),
                x = result.x.as_f64(),
                residual = residual.as_f64(),
                "monotone inverse stopped away from the root"
            );
            return Err(OptimError::MaxIterations {
                iterations: result.iterations,
                best: result.x.as_f64(),
            });
        }
        debug!(
            target = target.as_f64(),
            x = result.x.as_f64(),
            iterations = result.iterations,
            "monotone inverse solved"
        );
        Ok(result.x)
    }
}
