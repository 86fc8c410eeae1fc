use super::*;
use crate::diff::{Derivative, DerivativeSettings};
use crate::linalg::Polynomial;
use crate::tolerance::Tolerance;
use core::f64::consts::{FRAC_PI_3, PI, SQRT_2};
use proptest::prelude::*;

const DOTTIE: f64 = 0.739_085_133_215_160_7;

fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff {})",
        msg,
        a,
        b,
        (a - b).abs()
    );
}

fn cos_minus_x(x: f64) -> f64 {
    x.cos() - x
}

fn d1(x: f64) -> f64 {
    -x.sin() - 1.0
}

fn d2(x: f64) -> f64 {
    -x.cos()
}

fn d3(x: f64) -> f64 {
    x.sin()
}

fn d4(x: f64) -> f64 {
    x.cos()
}

// ═══════════════════════════════════════════════════════════════════
// Bisection
// ═══════════════════════════════════════════════════════════════════

#[test]
fn bisection_sqrt2() {
    let r = bisection(|x| x * x - 2.0, 0.0, 0.0, 2.0, &Tolerance::BISECTION).unwrap();
    assert_near(r.x, SQRT_2, 1e-11, "bisection √2");
    assert!(r.fx.abs() < 1e-10);
    assert_eq!(r.evals, r.iterations + 2);
}

#[test]
fn bisection_target_and_reversed_endpoints() {
    let r = bisection(|x: f64| x * x * x, 27.0, 5.0, 1.0, &Tolerance::BISECTION).unwrap();
    assert_near(r.x, 3.0, 1e-11, "cube root of 27");
}

#[test]
fn bisection_no_sign_change() {
    let err = bisection(|x| x * x - 2.0, 0.0, 3.0, 4.0, &Tolerance::BISECTION).unwrap_err();
    assert!(matches!(err, OptimError::BracketInvalid { a, b, .. } if a == 3.0 && b == 4.0));
}

#[test]
fn bisection_exact_endpoint() {
    let r = bisection(|x: f64| x - 1.0, 0.0, 1.0, 3.0, &Tolerance::BISECTION).unwrap();
    assert_eq!(r.x, 1.0);
    assert_eq!(r.iterations, 0);
    assert_eq!(r.evals, 2);
}

#[test]
fn bisection_exact_midpoint() {
    let r = bisection(|x: f64| x - 1.0, 0.0, 0.0, 2.0, &Tolerance::BISECTION).unwrap();
    assert_eq!(r.x, 1.0);
    assert_eq!(r.fx, 0.0);
    assert_eq!(r.iterations, 1);
}

#[test]
fn bisection_cap() {
    // ⌊10^0.5⌋ = 3 halvings
    let tol = Tolerance::new(11.7, 15.0, 0.5);
    match bisection(|x| x * x - 2.0, 0.0, 0.0, 2.0, &tol).unwrap_err() {
        OptimError::MaxIterations { iterations, best } => {
            assert_eq!(iterations, 3);
            assert_eq!(best, 1.25);
        }
        other => panic!("expected MaxIterations, got {:?}", other),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Newton / Halley
// ═══════════════════════════════════════════════════════════════════

#[test]
fn newton_dottie() {
    let r = newton(cos_minus_x, d1, 0.0, 0.5, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, DOTTIE, 1e-12, "newton cos x = x");
    assert_eq!(r.iterations, 4);
    // f and f' per iteration, plus the residual at the result
    assert_eq!(r.evals, 9);
}

#[test]
fn halley_beats_newton() {
    let tol = Tolerance::HOUSEHOLDER;
    let n = newton(cos_minus_x, d1, 0.0, 0.5, &tol).unwrap();
    let h = halley(cos_minus_x, d1, d2, 0.0, 0.5, &tol).unwrap();
    assert_near(h.x, DOTTIE, 1e-12, "halley cos x = x");
    assert_eq!(h.iterations, 3);
    assert!(h.iterations < n.iterations);
}

#[test]
fn newton_sqrt2_with_target() {
    let r = newton(|x| x * x, |x| 2.0 * x, 2.0, 1.0, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, SQRT_2, 1e-12, "newton √2");
    assert_eq!(r.iterations, 5);
}

#[test]
fn newton_zero_derivative() {
    let err = newton(|x| x * x + 1.0, |x| 2.0 * x, 0.0, 0.0, &Tolerance::HOUSEHOLDER).unwrap_err();
    assert_eq!(err, OptimError::DerivativeZero { x: 0.0 });
}

#[test]
fn newton_cap_reports_last_iterate() {
    let tol = Tolerance::new(7.83, f64::INFINITY, 0.0);
    match newton(cos_minus_x, d1, 0.0, 0.5, &tol).unwrap_err() {
        OptimError::MaxIterations { iterations, best } => {
            assert_eq!(iterations, 1);
            let expected = 0.5 - cos_minus_x(0.5) / d1(0.5);
            assert_eq!(best, expected);
        }
        other => panic!("expected MaxIterations, got {:?}", other),
    }
}

#[test]
fn newton_f32() {
    let tol = Tolerance::new(5.0_f32, f32::INFINITY, 1.7);
    let r = newton(|x: f32| x * x - 2.0, |x| 2.0 * x, 0.0, 1.0, &tol).unwrap();
    assert!((r.x - core::f32::consts::SQRT_2).abs() < 1e-5);
}

// ═══════════════════════════════════════════════════════════════════
// Householder
// ═══════════════════════════════════════════════════════════════════

#[test]
fn householder_needs_derivatives() {
    let err = householder(cos_minus_x, &[], 0.0, 0.5, &Tolerance::HOUSEHOLDER).unwrap_err();
    assert_eq!(err, OptimError::MissingDerivative);
    let err = householder_general(cos_minus_x, &[], 0.0, 0.5, &Tolerance::HOUSEHOLDER).unwrap_err();
    assert_eq!(err, OptimError::MissingDerivative);
}

#[test]
fn householder_dispatch_matches_classics() {
    let tol = Tolerance::HOUSEHOLDER;
    let d: [&dyn Fn(f64) -> f64; 2] = [&d1, &d2];
    let n = newton(cos_minus_x, d1, 0.0, 0.5, &tol).unwrap();
    let h = halley(cos_minus_x, d1, d2, 0.0, 0.5, &tol).unwrap();
    assert_eq!(householder(cos_minus_x, &d[..1], 0.0, 0.5, &tol).unwrap(), n);
    assert_eq!(householder(cos_minus_x, &d, 0.0, 0.5, &tol).unwrap(), h);
}

#[test]
fn general_formula_reduces_to_newton_and_halley() {
    let tol = Tolerance::HOUSEHOLDER;
    let d: [&dyn Fn(f64) -> f64; 2] = [&d1, &d2];
    let g1 = householder_general(cos_minus_x, &d[..1], 0.0, 0.5, &tol).unwrap();
    let g2 = householder_general(cos_minus_x, &d, 0.0, 0.5, &tol).unwrap();
    assert_near(g1.x, DOTTIE, 1e-12, "order 1");
    assert_near(g2.x, DOTTIE, 1e-12, "order 2");
    assert_eq!(g1.iterations, 4);
    assert_eq!(g2.iterations, 3);
}

#[test]
fn higher_orders_converge_faster() {
    let tol = Tolerance::HOUSEHOLDER;
    let d: [&dyn Fn(f64) -> f64; 4] = [&d1, &d2, &d3, &d4];
    let g3 = householder(cos_minus_x, &d[..3], 0.0, 0.5, &tol).unwrap();
    let g4 = householder(cos_minus_x, &d, 0.0, 0.5, &tol).unwrap();
    assert_near(g3.x, DOTTIE, 1e-12, "order 3");
    assert_near(g4.x, DOTTIE, 1e-12, "order 4");
    assert_eq!(g3.iterations, 3);
    assert_eq!(g4.iterations, 2);
    // f and four derivatives per iteration, plus the residual
    assert_eq!(g4.evals, 2 * 5 + 1);
}

#[test]
fn householder_third_order_sqrt2() {
    let d: [&dyn Fn(f64) -> f64; 3] = [&|x| 2.0 * x, &|_| 2.0, &|_| 0.0];
    let r = householder(|x: f64| x * x - 2.0, &d, 0.0, 1.0, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, SQRT_2, 1e-12, "third order √2");
    assert_eq!(r.iterations, 3);
}

#[test]
fn householder_on_polynomial_derivatives() {
    // Wallis' cubic x³ - 2x - 5
    let p = Polynomial::new(vec![1.0, 0.0, -2.0, -5.0]);
    let dp = p.derivative();
    let d2p = dp.derivative();
    let d3p = d2p.derivative();
    let d: [&dyn Fn(f64) -> f64; 3] = [&|x| dp.evaluate(x), &|x| d2p.evaluate(x), &|x| d3p.evaluate(x)];
    let r = householder(|x| p.evaluate(x), &d, 0.0, 2.0, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, 2.094_551_481_542_326_5, 1e-12, "Wallis root");
    assert!(r.iterations <= 4);
}

#[test]
fn householder_with_target() {
    let d: [&dyn Fn(f64) -> f64; 3] = [&|x| 3.0 * x * x, &|x| 6.0 * x, &|_| 6.0];
    let r = householder(|x: f64| x * x * x, &d, 8.0, 3.0, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, 2.0, 1e-12, "cube root of 8");
}

#[test]
fn householder_degenerate_denominator() {
    // f' and f''' vanish at 0, and with them every B[3][k]
    let d: [&dyn Fn(f64) -> f64; 3] = [&|x| 2.0 * x, &|_| 2.0, &|_| 0.0];
    let err = householder(|x: f64| x * x - 1.0, &d, 0.0, 0.0, &Tolerance::HOUSEHOLDER).unwrap_err();
    assert_eq!(err, OptimError::DerivativeZero { x: 0.0 });
}

#[test]
fn householder_with_numerical_derivatives() {
    let df = Derivative::new(cos_minus_x, DerivativeSettings::default()).unwrap();
    let numeric: &dyn Fn(f64) -> f64 = &|x| df.estimate(x);
    let r = householder(cos_minus_x, &[numeric], 0.0, 0.5, &Tolerance::HOUSEHOLDER).unwrap();
    assert_near(r.x, DOTTIE, 1e-10, "newton with finite differences");
}

// ═══════════════════════════════════════════════════════════════════
// Brent bracket
// ═══════════════════════════════════════════════════════════════════

#[test]
fn bracket_quadratic() {
    let b = bracket_minimum(|x: f64| (x - 2.0).powi(2), 0.0, 1.0, &BracketSettings::default()).unwrap();
    assert!(b.is_valid());
    assert!(b.xa.min(b.xc) < 2.0 && 2.0 < b.xa.max(b.xc));
}

#[test]
fn bracket_from_no_points_starts_at_unit_interval() {
    let f = |x: f64| (x - 0.3).powi(2);
    let b = bracket_from_points(f, &[], &BracketSettings::default()).unwrap();
    assert_eq!((b.xa, b.xb), (1.0, 0.0));
    assert!(b.is_valid());
}

#[test]
fn bracket_from_three_points_sorts() {
    let f = |x: f64| (x - 0.8).powi(2);
    let b = bracket_from_points(f, &[2.0, 0.0, 1.0], &BracketSettings::default()).unwrap();
    assert_eq!((b.xa, b.xb, b.xc), (0.0, 1.0, 2.0));
    assert_near(b.fb, 0.04, 1e-15, "centre value");
}

#[test]
fn bracket_from_three_points_validates() {
    let err = bracket_from_points(|x: f64| x, &[0.0, 1.0, 2.0], &BracketSettings::default()).unwrap_err();
    assert!(matches!(err, OptimError::InvalidBracket { .. }));
}

#[test]
fn bracket_point_count() {
    let err = bracket_from_points(|x: f64| x * x, &[0.0], &BracketSettings::default()).unwrap_err();
    assert_eq!(err, OptimError::InitialPoints(1));
    let err = bracket_from_points(|x: f64| x * x, &[0.0; 4], &BracketSettings::default()).unwrap_err();
    assert_eq!(err, OptimError::InitialPoints(4));
}

#[test]
fn bracket_cap_carries_last_triple() {
    let s = BracketSettings {
        tolerance: Tolerance::new(21.0, f64::INFINITY, 0.0),
        ..BracketSettings::default()
    };
    match bracket_minimum(|x: f64| -x, 0.0, 1.0, &s).unwrap_err() {
        OptimError::NoMinimumBracket { iterations, bracket } => {
            assert_eq!(iterations, 1);
            assert_eq!(bracket.xa, 1.0);
            assert!(bracket.xc > 100.0);
            assert!(bracket.fc < bracket.fb);
        }
        other => panic!("expected NoMinimumBracket, got {:?}", other),
    }
}

#[test]
fn bracket_unbounded_descent_is_invalid() {
    let err = bracket_minimum(|x: f64| -x, 0.0, 1.0, &BracketSettings::default()).unwrap_err();
    assert!(matches!(err, OptimError::InvalidBracket { .. }));
}

// ═══════════════════════════════════════════════════════════════════
// Brent minimizer
// ═══════════════════════════════════════════════════════════════════

#[test]
fn minimize_double_well() {
    let f = |x: f64| (x * x - 2.0).powi(2);
    let b = bracket_minimum(f, 0.0, 1.0, &BracketSettings::default()).unwrap();
    let m = minimize(f, &b, &BrentSettings::default()).unwrap();
    assert_near(m.x, SQRT_2, 1e-7, "double well");
    assert!(m.fx < 1e-14);
}

#[test]
fn minimize_from_counts_both_phases() {
    let m = minimize_from(
        |x: f64| x.cos(),
        &[3.0, 3.5],
        &BracketSettings::default(),
        &BrentSettings::default(),
    )
    .unwrap();
    assert_near(m.x, PI, 1e-9, "cos minimum");
    assert_eq!(m.fx, -1.0);
    assert_eq!(m.iterations, 8);
    assert_eq!(m.evals, 3 + 8);
}

#[test]
fn minimize_rejects_bad_bracket() {
    let bad = Bracket {
        xa: 0.0,
        fa: 0.0,
        xb: 1.0,
        fb: 1.0,
        xc: 2.0,
        fc: 4.0,
    };
    let err = minimize(|x: f64| x * x, &bad, &BrentSettings::default()).unwrap_err();
    assert_eq!(err, OptimError::InvalidBracket { bracket: bad });
}

#[test]
fn minimize_cap() {
    let s = BrentSettings {
        tolerance: Tolerance::new(11.0, 7.83, 0.0),
    };
    let f = |x: f64| (x - 2.0).powi(2);
    let b = bracket_from_points(f, &[0.0, 1.0, 5.0], &BracketSettings::default()).unwrap();
    assert!(matches!(
        minimize(f, &b, &s),
        Err(OptimError::MaxIterations { iterations: 1, .. })
    ));
}

#[test]
fn minimize_is_repeatable() {
    let f = |x: f64| (x - 0.25).powi(4) + x.sin();
    let a = minimize_from(f, &[0.0, 1.0], &BracketSettings::default(), &BrentSettings::default());
    let b = minimize_from(f, &[0.0, 1.0], &BracketSettings::default(), &BrentSettings::default());
    assert_eq!(a, b);
}

// ═══════════════════════════════════════════════════════════════════
// Monotone inverse
// ═══════════════════════════════════════════════════════════════════

#[test]
fn domain_normalizes_order() {
    let d = Domain::new(3.0, 1.0, true, false);
    assert_eq!(d, Domain::new(1.0, 3.0, false, true));
    assert_eq!((d.lower(), d.upper()), (1.0, 3.0));
    assert!(!d.is_lower_open() && d.is_upper_open());
}

#[test]
fn inverse_of_reversed_domain() {
    let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(PI, 0.0));
    assert_near(acos.solve(0.5).unwrap(), FRAC_PI_3, 1e-7, "acos on reversed ends");
}

#[test]
fn inverse_cosine() {
    let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(0.0, PI));
    assert_near(acos.solve(0.5).unwrap(), FRAC_PI_3, 1e-7, "acos 0.5");
    assert_near(acos.solve(-0.9).unwrap(), (-0.9_f64).acos(), 1e-7, "acos -0.9");
    assert_eq!(acos.trend().unwrap(), -1.0);
}

#[test]
fn inverse_reference_point_short_circuit() {
    let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(0.0, PI));
    let r1 = PI - PI / 4.0;
    assert_eq!(acos.solve(r1.cos()).unwrap(), r1);
    assert_eq!(acos.solve((PI / 4.0).cos()).unwrap(), PI / 4.0);
}

#[test]
fn inverse_range_checks() {
    let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(0.0, PI));
    assert_eq!(
        acos.solve(1.5).unwrap_err(),
        OptimError::AboveRange {
            target: 1.5,
            limit: 1.0
        }
    );
    assert_eq!(
        acos.solve(-1.5).unwrap_err(),
        OptimError::BelowRange {
            target: -1.5,
            limit: -1.0
        }
    );
}

#[test]
fn inverse_open_end_excludes_its_value() {
    let open = MonotoneInverse::new(|x: f64| x.exp(), Domain::open(0.0, 1.0));
    assert!(matches!(open.solve(1.0), Err(OptimError::BelowRange { .. })));
    let closed = MonotoneInverse::new(|x: f64| x.exp(), Domain::closed(0.0, 1.0));
    assert_near(closed.solve(1.0).unwrap(), 0.0, 1e-7, "exp at closed end");
}

#[test]
fn inverse_half_line() {
    // ln on (0, ∞): the open end maps to -∞ so nothing is rejected below
    let exp = MonotoneInverse::new(|x: f64| x.ln(), Domain::new(0.0, f64::INFINITY, true, true));
    assert_near(exp.solve(-2.0).unwrap(), (-2.0_f64).exp(), 1e-8, "e^-2");
}

#[test]
fn inverse_root_below_absolute_floor_fails() {
    // e^-30 ≈ 9.4e-14 is under Brent's 1e-11 absolute step
    let exp = MonotoneInverse::new(|x: f64| x.ln(), Domain::new(0.0, f64::INFINITY, true, true));
    match exp.solve(-30.0) {
        Err(OptimError::MaxIterations { best, .. }) => assert!(best > 0.0 && best.ln() > -29.0),
        other => panic!("expected MaxIterations, got {:?}", other),
    }
}

#[test]
fn inverse_decreasing_half_line() {
    let recip = MonotoneInverse::new(|x: f64| 1.0 / x, Domain::new(0.0, f64::INFINITY, true, true));
    assert_near(recip.solve(4.0).unwrap(), 0.25, 1e-8, "1/4");
}

#[test]
fn inverse_real_line() {
    let cbrt = MonotoneInverse::new(|x: f64| x * x * x, Domain::real_line());
    assert_near(cbrt.solve(8.0).unwrap(), 2.0, 1e-8, "cube root");
}

#[test]
fn inverse_declared_range() {
    let atanh = MonotoneInverse::new(|x: f64| x.tanh(), Domain::real_line()).with_range(1.0, -1.0);
    assert_near(atanh.solve(0.5).unwrap(), 0.5_f64.atanh(), 1e-8, "atanh 0.5");
    // both domain ends are open, so the asymptote itself is unreachable
    assert_eq!(
        atanh.solve(1.0).unwrap_err(),
        OptimError::AboveRange {
            target: 1.0,
            limit: 1.0
        }
    );
}

#[test]
fn inverse_needs_monotonic_function() {
    let flat = MonotoneInverse::new(|_: f64| 3.0, Domain::closed(0.0, 1.0));
    assert_eq!(
        flat.solve(3.0).unwrap_err(),
        OptimError::NotMonotonic { a: 0.25, b: 0.75 }
    );
}

#[test]
fn inverse_is_repeatable() {
    let acos = MonotoneInverse::new(|x: f64| x.cos(), Domain::closed(0.0, PI));
    assert_eq!(acos.solve(0.3).unwrap(), acos.solve(0.3).unwrap());
}

// ═══════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bisection_cube_root(c in -50.0f64..50.0) {
        let r = bisection(|x: f64| x * x * x, c, -4.0, 4.0, &Tolerance::BISECTION).unwrap();
        prop_assert!((r.x - c.cbrt()).abs() < 1e-10);
    }

    #[test]
    fn inverse_of_increasing_affine(y in -9.0f64..9.0) {
        let inv = MonotoneInverse::new(|x: f64| 2.0 * x + 1.0, Domain::closed(-5.0, 5.0));
        prop_assert!((inv.solve(y).unwrap() - (y - 1.0) / 2.0).abs() < 1e-6);
    }
}
