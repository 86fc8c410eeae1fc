use core::cell::RefCell;

use tracing::{debug, warn};

use crate::quad::{riemann_liouville_integral, QuadError, QuadSettings};
use crate::traits::FloatScalar;

use super::{binomial_derivative, BinomialSettings, DerivativeEstimate, DiffError};

/// Definition of the fractional derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FractionalKind {
    /// `d^n/dx^n I^(n-α) f`
    #[default]
    RiemannLiouville,
    /// `I^(n-α) f^(n)`
    Caputo,
}

/// Settings for [`fractional_derivative`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FractionalSettings<T> {
    pub kind: FractionalKind,
    /// Lower terminal of the integral; `-∞` is allowed (default: 0).
    pub base: T,
    /// Integer-order differences taken of the fractional integral.
    pub binomial: BinomialSettings<T>,
    /// Quadrature of the fractional integral.
    pub quad: QuadSettings<T>,
}

impl Default for FractionalSettings<f64> {
    fn default() -> Self {
        Self {
            kind: FractionalKind::default(),
            base: 0.0,
            binomial: BinomialSettings::default(),
            quad: QuadSettings::default(),
        }
    }
}

/// `I^order f` as a plain function of the evaluation point. Quadrature
/// failures without an estimate are kept for the caller and show up as NaN.
struct FractionalIntegral<'a, T, F> {
    f: &'a F,
    order: T,
    base: T,
    quad: &'a QuadSettings<T>,
    failure: RefCell<Option<QuadError>>,
}

impl<T: FloatScalar, F: Fn(T) -> T> FractionalIntegral<'_, T, F> {
    fn at(&self, y: T) -> T {
        if y <= self.base {
            return T::zero();
        }
        match riemann_liouville_integral(self.f, y, self.order, self.base, self.quad) {
            Ok(r) => r.value,
            Err(e) => match e.best() {
                Some(best) => T::lit(best),
                None => {
                    self.failure.borrow_mut().get_or_insert(e);
                    T::nan()
                }
            },
        }
    }
}

/// Accept the last trustworthy estimate of a binomial difference that
/// stopped improving.
fn settle<T: FloatScalar>(r: Result<DerivativeEstimate<T>, DiffError>) -> Result<T, DiffError> {
    match r {
        Ok(est) => Ok(est.value),
        Err(DiffError::ErrorIncrease { best, .. } | DiffError::MaxIterations { best, .. }) => Ok(T::lit(best)),
        Err(e) => Err(e),
    }
}

fn riemann_liouville<T: FloatScalar, F: Fn(T) -> T>(
    f: &F,
    x: T,
    order: T,
    n: usize,
    settings: &FractionalSettings<T>,
) -> Result<T, DiffError> {
    let integral = FractionalIntegral {
        f,
        order: T::lit(n as f64) - order,
        base: settings.base,
        quad: &settings.quad,
        failure: RefCell::new(None),
    };
    let r = binomial_derivative(|y| integral.at(y), x, n, &settings.binomial);
    if let Some(e) = integral.failure.into_inner() {
        return Err(DiffError::Quadrature(e));
    }
    settle(r)
}

/// `Σ_(k<n) f^(k)(base)·(x - base)^(k-α) / Γ(k + 1 - α)`, the initial-value
/// terms separating the two definitions.
fn initial_terms<T: FloatScalar, F: Fn(T) -> T>(
    f: &F,
    x: T,
    order: T,
    n: usize,
    settings: &FractionalSettings<T>,
) -> Result<T, DiffError> {
    let span = x - settings.base;
    let mut sum = T::zero();
    for k in 0..n {
        let fk = if k == 0 {
            f(settings.base)
        } else {
            settle(binomial_derivative(f, settings.base, k, &settings.binomial))?
        };
        let p = T::lit(k as f64) - order;
        sum = sum + fk * span.powf(p) / (p + T::one()).tgamma();
    }
    Ok(sum)
}

/// Derivative of real order `order` at `x`.
///
/// With `n = ⌈α⌉`:
///
/// - Riemann-Liouville: `D^α f = d^n/dx^n I^(n-α) f`, the integral from
///   [`riemann_liouville_integral`] and the outer derivative from
///   [`binomial_derivative`]
/// - Caputo: the Riemann-Liouville value less the initial-value terms
///   `f^(k)(base)·(x - base)^(k-α) / Γ(k + 1 - α)` for `k < n`; with
///   `base = -∞` both definitions agree
///
/// A negative order is the fractional integral of order `-α`, order zero
/// returns `f(x)` and integer orders are plain binomial derivatives. When a
/// binomial difference diverges or hits its level cap, its last estimate is
/// used.
///
/// # Errors
///
/// - [`DiffError::InvalidSettings`] for a non-finite order
/// - [`DiffError::BelowBase`] unless `x > base` for a positive non-integer order
/// - [`DiffError::Quadrature`] when the fractional integral fails without an
///   estimate
/// - [`DiffError::NotFinite`] and settings errors of [`binomial_derivative`]
///
/// ```
/// use stepwise::diff::{fractional_derivative, FractionalSettings};
///
/// // D^½ x = 2·sqrt(x/π)
/// let d = fractional_derivative(|x: f64| x, 1.0, 0.5, &FractionalSettings::default()).unwrap();
/// assert!((d - 2.0 / core::f64::consts::PI.sqrt()).abs() < 1e-5);
/// ```
pub fn fractional_derivative<T: FloatScalar>(
    f: impl Fn(T) -> T,
    x: T,
    order: T,
    settings: &FractionalSettings<T>,
) -> Result<T, DiffError> {
    if !order.is_finite() {
        return Err(DiffError::InvalidSettings("fractional order must be finite".into()));
    }
    if order < T::zero() {
        let r = riemann_liouville_integral(&f, x, -order, settings.base, &settings.quad)?;
        return Ok(r.value);
    }
    if order == T::zero() {
        return Ok(f(x));
    }
    if order.fract() == T::zero() {
        let n = order.as_f64() as usize;
        return settle(binomial_derivative(&f, x, n, &settings.binomial));
    }
    if !(x > settings.base) {
        return Err(DiffError::BelowBase {
            x: x.as_f64(),
            base: settings.base.as_f64(),
        });
    }

    let n = order.ceil().as_f64() as usize;
    let result = riemann_liouville(&f, x, order, n, settings).and_then(|rl| match settings.kind {
        FractionalKind::Caputo if settings.base.is_finite() => Ok(rl - initial_terms(&f, x, order, n, settings)?),
        _ => Ok(rl),
    });
    match &result {
        Ok(value) => debug!(
            x = x.as_f64(),
            order = order.as_f64(),
            kind = ?settings.kind,
            value = value.as_f64(),
            "fractional derivative"
        ),
        Err(e) => warn!(x = x.as_f64(), order = order.as_f64(), error = %e, "fractional derivative failed"),
    }
    result
}
