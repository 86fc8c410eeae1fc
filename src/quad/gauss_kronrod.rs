use tracing::{debug, warn};

use crate::traits::FloatScalar;

use super::tables::RuleTable;
use super::{KronrodRule, QuadError, QuadResult, QuadSettings};

/// Change of variable that turns the integration limits into a finite
/// interval.
#[derive(Debug, Clone, Copy)]
enum Mapping<T> {
    Finite,
    /// `(-∞, ∞)` onto `[-1, 1]`
    RealLine,
    /// `[a, ∞)` onto `[0, 1]`
    UpperHalf(T),
    /// `(-∞, b]` onto `[0, 1]`
    LowerHalf(T),
}

impl<T: FloatScalar> Mapping<T> {
    /// Mapping for `a < b` together with the finite interval it integrates over.
    fn for_limits(a: T, b: T) -> (Self, T, T) {
        let one = T::one();
        match (a.is_infinite(), b.is_infinite()) {
            (true, true) => (Mapping::RealLine, -one, one),
            (false, true) => (Mapping::UpperHalf(a), T::zero(), one),
            (true, false) => (Mapping::LowerHalf(b), T::zero(), one),
            (false, false) => (Mapping::Finite, a, b),
        }
    }

    #[inline]
    fn apply(&self, f: &impl Fn(T) -> T, t: T) -> T {
        let one = T::one();
        match *self {
            Mapping::Finite => f(t),
            Mapping::RealLine => {
                let d = one - t * t;
                f(t / d) * (one + t * t) / (d * d)
            }
            Mapping::UpperHalf(a) => {
                let d = one - t;
                f(a + t / d) / (d * d)
            }
            Mapping::LowerHalf(b) => f(b - (one - t) / t) / (t * t),
        }
    }
}

/// Orient the limits. `None` means the integral is trivially zero.
fn prepare<T: FloatScalar>(a: T, b: T) -> Result<Option<(T, T, T)>, QuadError> {
    if a.is_nan() || b.is_nan() {
        return Err(QuadError::InvalidLimits {
            a: a.as_f64(),
            b: b.as_f64(),
        });
    }
    if a == b {
        return Ok(None);
    }
    Ok(Some(if b < a { (b, a, -T::one()) } else { (a, b, T::one()) }))
}

/// One Gauss/Kronrod pair on `[-1, 1]`: `(kronrod, gauss, l1)`.
pub(super) fn rule_pair<T: FloatScalar>(table: &RuleTable, f: impl Fn(T) -> T) -> (T, T, T) {
    let mut kronrod = T::zero();
    let mut gauss = T::zero();
    let mut l1 = T::zero();

    let nodes = table.gauss_nodes.iter().zip(table.gauss_weights).zip(table.kronrod_at_gauss);
    for ((&x, &wg), &wk) in nodes {
        let (wg, wk) = (T::lit(wg), T::lit(wk));
        let (sum, abs) = symmetric_pair(&f, T::lit(x));
        kronrod = kronrod + wk * sum;
        gauss = gauss + wg * sum;
        l1 = l1 + wk * abs;
    }
    for (&x, &wk) in table.kronrod_nodes.iter().zip(table.kronrod_weights) {
        let wk = T::lit(wk);
        let (sum, abs) = symmetric_pair(&f, T::lit(x));
        kronrod = kronrod + wk * sum;
        l1 = l1 + wk * abs;
    }
    (kronrod, gauss, l1)
}

/// `f(x) + f(-x)` and `|f(x)| + |f(-x)|`; the zero node is sampled once.
#[inline]
fn symmetric_pair<T: FloatScalar>(f: &impl Fn(T) -> T, x: T) -> (T, T) {
    if x == T::zero() {
        let v = f(x);
        (v, v.abs())
    } else {
        let (p, m) = (f(x), f(-x));
        (p + m, p.abs() + m.abs())
    }
}

fn points_per_pair(table: &RuleTable) -> usize {
    let count = |nodes: &[f64]| nodes.iter().map(|&x| if x == 0.0 { 1 } else { 2 }).sum::<usize>();
    count(table.gauss_nodes) + count(table.kronrod_nodes)
}

/// Recursive bisection state.
struct Adaptive<'a, T, F> {
    f: &'a F,
    table: &'static RuleTable,
    rel_tol: T,
    abs_tol: T,
    points: usize,
    evals: usize,
    exhausted: bool,
}

impl<'a, T: FloatScalar, F: Fn(T) -> T> Adaptive<'a, T, F> {
    /// Integrate `[a, b]` with `level` bisections left. Returns
    /// `(estimate, error, l1)`.
    fn segment(&mut self, a: T, b: T, level: usize, tol: Option<T>) -> (T, T, T) {
        let two = T::lit(2.0);
        let mean = (a + b) / two;
        let scale = (b - a) / two;
        let f = self.f;
        let (k, g, l1) = rule_pair(self.table, |x: T| f(scale * x + mean));
        self.evals += self.points;

        let estimate = scale * k;
        let error = scale.abs() * (k - g).abs().max(two * T::epsilon() * k.abs());
        let local = self.rel_tol * estimate.abs();
        let tol = tol.unwrap_or(self.abs_tol + local);

        if tol < error && local < error {
            if level > 0 {
                let mid = mean;
                let (e1, r1, n1) = self.segment(a, mid, level - 1, Some(tol / two));
                let (e2, r2, n2) = self.segment(mid, b, level - 1, Some(tol / two));
                return (e1 + e2, r1 + r2, n1 + n2);
            }
            self.exhausted = true;
        }
        (estimate, error, scale.abs() * l1)
    }
}

/// Adaptive Gauss-Kronrod quadrature of `f` over `[a, b]`.
///
/// Either limit may be infinite. Each interval is bisected while its error
/// exceeds both its share of the global target and `rel_tol` times its own
/// estimate, up to `tolerance.max_iter()` levels deep.
///
/// # Errors
///
/// - [`QuadError::InvalidLimits`] for a NaN limit
/// - [`QuadError::NotFinite`] when the estimate is NaN or infinite
/// - [`QuadError::MaxDepth`] with the estimate as `best` when an interval at
///   the maximum depth still misses its tolerance
///
/// ```
/// use stepwise::quad::{gauss_kronrod, QuadSettings};
///
/// let r = gauss_kronrod(f64::sin, 0.0, core::f64::consts::PI, &QuadSettings::default()).unwrap();
/// assert!((r.value - 2.0).abs() < 1e-14);
/// ```
pub fn gauss_kronrod<T: FloatScalar>(
    f: impl Fn(T) -> T,
    a: T,
    b: T,
    settings: &QuadSettings<T>,
) -> Result<QuadResult<T>, QuadError> {
    let Some((lo, hi, sign)) = prepare(a, b)? else {
        return Ok(QuadResult {
            value: T::zero(),
            error: T::zero(),
            l1_norm: T::zero(),
            evals: 0,
        });
    };
    let (mapping, ta, tb) = Mapping::for_limits(lo, hi);
    let mapped = |t: T| mapping.apply(&f, t);

    let table = settings.rule.table();
    let depth = settings.tolerance.max_iter();
    let mut run = Adaptive {
        f: &mapped,
        table,
        rel_tol: settings.tolerance.rel_tol(),
        abs_tol: settings.tolerance.abs_tol(),
        points: points_per_pair(table),
        evals: 0,
        exhausted: false,
    };
    let (estimate, error, l1) = run.segment(ta, tb, depth, None);
    let value = sign * estimate;

    if !value.is_finite() {
        warn!(a = a.as_f64(), b = b.as_f64(), "non-finite integral");
        return Err(QuadError::NotFinite {
            a: a.as_f64(),
            b: b.as_f64(),
        });
    }
    if run.exhausted {
        warn!(
            a = a.as_f64(),
            b = b.as_f64(),
            depth,
            value = value.as_f64(),
            error = error.as_f64(),
            "gauss-kronrod depth exhausted"
        );
        return Err(QuadError::MaxDepth {
            depth,
            best: value.as_f64(),
            error: error.as_f64(),
        });
    }
    debug!(
        a = a.as_f64(),
        b = b.as_f64(),
        value = value.as_f64(),
        error = error.as_f64(),
        evals = run.evals,
        "gauss-kronrod converged"
    );
    Ok(QuadResult {
        value,
        error,
        l1_norm: l1,
        evals: run.evals,
    })
}

/// Single application of the `n`-point Gauss-Legendre rule of `rule` over
/// `[a, b]`, with the same limit handling as [`gauss_kronrod`] but no error
/// estimate or subdivision.
///
/// ```
/// use stepwise::quad::{gauss_legendre, KronrodRule};
///
/// // 7 points integrate degree 13 exactly
/// let v = gauss_legendre(|x: f64| x.powi(12), -1.0, 1.0, KronrodRule::G7K15).unwrap();
/// assert!((v - 2.0 / 13.0).abs() < 1e-14);
/// ```
pub fn gauss_legendre<T: FloatScalar>(f: impl Fn(T) -> T, a: T, b: T, rule: KronrodRule) -> Result<T, QuadError> {
    let Some((lo, hi, sign)) = prepare(a, b)? else {
        return Ok(T::zero());
    };
    let (mapping, ta, tb) = Mapping::for_limits(lo, hi);
    let two = T::lit(2.0);
    let mean = (ta + tb) / two;
    let scale = (tb - ta) / two;

    let table = rule.table();
    let mut sum = T::zero();
    for (&x, &w) in table.gauss_nodes.iter().zip(table.gauss_weights) {
        let g = |t: T| mapping.apply(&f, scale * t + mean);
        let (pair, _) = symmetric_pair(&g, T::lit(x));
        sum = sum + T::lit(w) * pair;
    }
    let value = sign * scale * sum;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QuadError::NotFinite {
            a: a.as_f64(),
            b: b.as_f64(),
        })
    }
}
