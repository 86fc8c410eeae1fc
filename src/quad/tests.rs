use super::gauss_kronrod::rule_pair;
use super::*;
use crate::linalg::Polynomial;
use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;
use approx::assert_relative_eq;
use core::f64::consts::{E, PI};

const RULES: [KronrodRule; 6] = [
    KronrodRule::G7K15,
    KronrodRule::G10K21,
    KronrodRule::G15K31,
    KronrodRule::G20K41,
    KronrodRule::G25K51,
    KronrodRule::G30K61,
];

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

fn settings() -> QuadSettings<f64> {
    QuadSettings::default()
}

// ═══════════════════════════════════════════════════════════════════
// Node and weight tables
// ═══════════════════════════════════════════════════════════════════

#[test]
fn table_sizes_match_rule() {
    for rule in RULES {
        let t = rule.table();
        let n = rule.gauss_points();
        assert_eq!(t.gauss_nodes.len(), (n + 1) / 2, "{:?}", rule);
        assert_eq!(t.gauss_weights.len(), t.gauss_nodes.len());
        assert_eq!(t.kronrod_at_gauss.len(), t.gauss_nodes.len());
        assert_eq!(t.kronrod_nodes.len(), n / 2 + 1, "{:?}", rule);
        assert_eq!(t.kronrod_weights.len(), t.kronrod_nodes.len());
    }
}

#[test]
fn weights_sum_to_interval_length() {
    let total = |nodes: &[f64], weights: &[f64]| -> f64 {
        nodes
            .iter()
            .zip(weights)
            .map(|(&x, &w)| if x == 0.0 { w } else { 2.0 * w })
            .sum()
    };
    for rule in RULES {
        let t = rule.table();
        assert_near(total(t.gauss_nodes, t.gauss_weights), 2.0, 1e-14, "gauss");
        let k = total(t.gauss_nodes, t.kronrod_at_gauss) + total(t.kronrod_nodes, t.kronrod_weights);
        assert_near(k, 2.0, 1e-14, "kronrod");
    }
}

#[test]
fn gauss_nodes_are_legendre_roots() {
    for rule in [KronrodRule::G7K15, KronrodRule::G10K21, KronrodRule::G15K31] {
        let t = rule.table();
        let p = Polynomial::<f64>::legendre(rule.gauss_points());
        let dp = p.derivative();
        for (&x, &w) in t.gauss_nodes.iter().zip(t.gauss_weights) {
            assert!(p.evaluate(x).abs() < 1e-12, "{:?}: P({}) = {}", rule, x, p.evaluate(x));
            let d = dp.evaluate(x);
            assert_relative_eq!(w, 2.0 / ((1.0 - x * x) * d * d), max_relative = 1e-10);
        }
    }
}

#[test]
fn kronrod_nodes_are_stieltjes_roots() {
    for rule in RULES {
        let e = Polynomial::<f64>::stieltjes(rule.gauss_points() + 1);
        let de = e.derivative();
        // coefficient growth costs accuracy for the long rules
        let tol = if rule.gauss_points() <= 10 { 1e-12 } else { 1e-5 };
        for &x in rule.table().kronrod_nodes {
            let newton = e.evaluate(x) / de.evaluate(x);
            assert!(newton.abs() < tol, "{:?}: Newton step {} at {}", rule, newton, x);
        }
    }
}

#[test]
fn kronrod_rule_degree_of_exactness() {
    // 2n+1 Kronrod points integrate degree 3n+1 exactly
    for rule in RULES {
        let n = rule.gauss_points();
        let deg = if (3 * n + 1) % 2 == 0 { 3 * n + 1 } else { 3 * n };
        let (k, _, _) = rule_pair(rule.table(), |x: f64| x.powi(deg as i32));
        assert_near(k, 2.0 / (deg + 1) as f64, 1e-14, "kronrod exactness");
        let (_, g, _) = rule_pair(rule.table(), |x: f64| x.powi(2 * n as i32 - 2));
        assert_near(g, 2.0 / (2 * n - 1) as f64, 1e-14, "gauss exactness");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Gauss-Kronrod
// ═══════════════════════════════════════════════════════════════════

#[test]
fn smooth_integrand_single_pass() {
    let r = gauss_kronrod(f64::sin, 0.0, PI, &settings()).unwrap();
    assert_near(r.value, 2.0, 1e-14, "∫ sin");
    assert_eq!(r.evals, 21);
    assert!(r.error < 1e-14);
    assert_near(r.l1_norm, 2.0, 1e-14, "‖sin‖₁");
}

#[test]
fn every_rule_agrees() {
    for rule in RULES {
        let s = QuadSettings {
            rule,
            ..settings()
        };
        let r = gauss_kronrod(f64::exp, 0.0, 1.0, &s).unwrap();
        assert_near(r.value, E - 1.0, 1e-14, "∫ exp");
        assert_eq!(r.evals, rule.kronrod_points());
    }
}

#[test]
fn reversed_and_empty_limits() {
    let fwd = gauss_kronrod(f64::exp, 0.0, 1.0, &settings()).unwrap();
    let rev = gauss_kronrod(f64::exp, 1.0, 0.0, &settings()).unwrap();
    assert_eq!(rev.value, -fwd.value);
    let empty = gauss_kronrod(|_x: f64| -> f64 { panic!("sampled an empty interval") }, 2.0, 2.0, &settings()).unwrap();
    assert_eq!(empty.value, 0.0);
    assert_eq!(empty.evals, 0);
}

#[test]
fn nan_limit_rejected() {
    assert!(matches!(
        gauss_kronrod(f64::exp, f64::NAN, 1.0, &settings()),
        Err(QuadError::InvalidLimits { .. })
    ));
}

#[test]
fn half_line_gaussian() {
    let r = gauss_kronrod(|t: f64| (-t * t).exp(), 0.0, f64::INFINITY, &settings()).unwrap();
    assert_near(r.value, PI.sqrt() / 2.0, 1e-14, "∫₀^∞ e^-t²");
}

#[test]
fn real_line_integrals() {
    let g = gauss_kronrod(|t: f64| (-t * t).exp(), f64::NEG_INFINITY, f64::INFINITY, &settings()).unwrap();
    assert_near(g.value, PI.sqrt(), 1e-14, "∫ e^-t²");
    let c = gauss_kronrod(|t: f64| 1.0 / (1.0 + t * t), f64::NEG_INFINITY, f64::INFINITY, &settings()).unwrap();
    assert_near(c.value, PI, 1e-14, "∫ 1/(1+t²)");
}

#[test]
fn lower_half_line() {
    let r = gauss_kronrod(f64::exp, f64::NEG_INFINITY, 0.0, &settings()).unwrap();
    assert_near(r.value, 1.0, 1e-14, "∫_-∞^0 e^t");
    let flipped = gauss_kronrod(f64::exp, 0.0, f64::NEG_INFINITY, &settings()).unwrap();
    assert_eq!(flipped.value, -r.value);
}

#[test]
fn cancelling_integral_stops_on_local_tolerance() {
    let r = gauss_kronrod(f64::sin, 0.0, 2.0 * PI, &settings()).unwrap();
    assert!(r.value.abs() < 1e-14);
    assert!(r.evals < 200);
}

#[test]
fn endpoint_singularity_exhausts_depth() {
    // √x has an unbounded derivative at 0
    match gauss_kronrod(f64::sqrt, 0.0, 1.0, &settings()) {
        Err(QuadError::MaxDepth { depth, best, .. }) => {
            assert_eq!(depth, 15);
            assert_near(best, 2.0 / 3.0, 1e-10, "∫ √x");
        }
        other => panic!("expected MaxDepth, got {:?}", other),
    }
    let loose = QuadSettings {
        tolerance: Tolerance::new(f64::INFINITY, 6.0, 1.18),
        ..settings()
    };
    let r = gauss_kronrod(f64::sqrt, 0.0, 1.0, &loose).unwrap();
    assert_near(r.value, 2.0 / 3.0, 1e-10, "∫ √x, loose tolerance");
}

#[test]
fn pole_is_not_finite() {
    assert_eq!(
        gauss_kronrod(|t: f64| 1.0 / t, -1.0, 1.0, &settings()).err(),
        Some(QuadError::NotFinite { a: -1.0, b: 1.0 })
    );
}

#[test]
fn single_precision() {
    let s = QuadSettings {
        tolerance: Tolerance::new(f32::INFINITY, 6.0, 1.0),
        rule: KronrodRule::G7K15,
    };
    let r = gauss_kronrod(|t: f32| t.cos(), 0.0, 1.0, &s).unwrap();
    assert!((r.value - 1.0_f32.sin()).abs() < 1e-6);
}

#[test]
fn gauss_only() {
    let v = gauss_legendre(|x: f64| x.powi(18), -1.0, 1.0, KronrodRule::G10K21).unwrap();
    assert_near(v, 2.0 / 19.0, 1e-14, "degree 18 with 10 points");
    let h = gauss_legendre(|t: f64| (-t).exp(), 0.0, f64::INFINITY, KronrodRule::G30K61).unwrap();
    assert_near(h, 1.0, 1e-6, "∫₀^∞ e^-t");
    assert_eq!(gauss_legendre(f64::exp, 3.0, 3.0, KronrodRule::G7K15).unwrap(), 0.0);
}

// ═══════════════════════════════════════════════════════════════════
// Newton-Cotes
// ═══════════════════════════════════════════════════════════════════

fn uneven(f: impl Fn(f64) -> f64, xs: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().map(|&x| (x, f(x))).collect()
}

#[test]
fn trapezoid_exact_for_lines() {
    let s = uneven(|x| 3.0 * x - 1.0, &[0.0, 0.3, 1.1, 2.0]);
    assert_near(trapezoidal(&s).unwrap(), 4.0, 1e-14, "∫ 3x - 1");
}

#[test]
fn simpson_exact_for_quadratics_on_uneven_grid() {
    let q = |x: f64| 3.0 * x * x - x + 1.0;
    // even and odd interval counts
    for xs in [&[0.0, 0.4, 0.9, 1.5, 2.0][..], &[0.0, 0.2, 0.9, 1.3, 1.7, 2.0][..]] {
        let s = uneven(q, xs);
        assert_near(simpson(&s).unwrap(), 8.0, 1e-13, "∫ 3x² - x + 1");
    }
    let two = uneven(q, &[0.0, 2.0]);
    assert_eq!(simpson(&two).unwrap(), trapezoidal(&two).unwrap());
}

#[test]
fn newton_cotes_degrees() {
    let cubic = |x: f64| x * x * x - 2.0 * x;
    let s = uneven(cubic, &[0.0, 0.5, 0.8, 1.2, 1.6, 2.0, 2.5]);
    assert_near(newton_cotes(&s, 3).unwrap(), 2.5_f64.powi(4) / 4.0 - 6.25, 1e-12, "degree 3");
    assert_near(newton_cotes(&s, 1).unwrap(), trapezoidal(&s).unwrap(), 1e-14, "degree 1");
    let even = evenly_spaced(f64::sin, 0.0, PI, 9);
    assert_near(newton_cotes(&even, 2).unwrap(), simpson(&even).unwrap(), 1e-14, "degree 2");
    assert_eq!(newton_cotes(&even, 0), Err(QuadError::ZeroDegree));
}

#[test]
fn sample_validation() {
    assert_eq!(
        trapezoidal(&[(0.0, 1.0)]),
        Err(QuadError::TooFewSamples { got: 1, need: 2 })
    );
    let unordered = [(0.0, 1.0), (1.0, 1.0), (1.0, 2.0)];
    assert_eq!(simpson(&unordered), Err(QuadError::UnorderedSamples { index: 2 }));
}

#[test]
fn romberg_convergence() {
    let s = evenly_spaced(f64::exp, 0.0, 1.0, 17);
    let table = romberg_table(&s).unwrap();
    assert_eq!(table.shape(), (5, 5));
    assert_near(table[(0, 0)], (E + 1.0) / 2.0, 1e-15, "single trapezoid");
    assert_near(table[(4, 0)], trapezoidal(&s).unwrap(), 1e-15, "16 trapezoids");
    assert_eq!(table[(0, 1)], 0.0);
    assert_near(romberg(&s).unwrap(), E - 1.0, 1e-14, "romberg exp");
    assert!((table[(4, 4)] - (E - 1.0)).abs() < (table[(4, 0)] - (E - 1.0)).abs());
}

#[test]
fn romberg_sample_requirements() {
    let six = evenly_spaced(f64::exp, 0.0, 1.0, 6);
    assert_eq!(romberg(&six), Err(QuadError::RombergSampleCount(6)));
    let bent = uneven(f64::exp, &[0.0, 0.2, 0.5, 0.75, 1.0]);
    assert_eq!(romberg(&bent), Err(QuadError::UnevenSamples { index: 1 }));
}

// ═══════════════════════════════════════════════════════════════════
// Riemann-Liouville integral
// ═══════════════════════════════════════════════════════════════════

#[test]
fn half_integral_of_constant() {
    for &x in &[0.25, 1.0, 4.0] {
        let r = riemann_liouville_integral(|_t: f64| 1.0, x, 0.5, 0.0, &settings()).unwrap();
        assert_near(r.value, 2.0 * (x / PI).sqrt(), 1e-13, "I^½ 1");
    }
}

#[test]
fn integer_orders_are_repeated_integrals() {
    let once = riemann_liouville_integral(f64::cos, 1.0, 1.0, 0.0, &settings()).unwrap();
    assert_near(once.value, 1.0_f64.sin(), 1e-14, "I¹ cos");
    // ∫₁^x ∫₁^s t dt ds at x = 3
    let twice = riemann_liouville_integral(|t: f64| t, 3.0, 2.0, 1.0, &settings()).unwrap();
    assert_near(twice.value, 10.0 / 3.0, 1e-13, "I² t");
}

#[test]
fn order_above_one_fractional() {
    // I^2.5 t = x^3.5 / Γ(4.5)
    let r = riemann_liouville_integral(|t: f64| t, 1.0, 2.5, 0.0, &settings()).unwrap();
    assert_near(r.value, 1.0 / 4.5_f64.tgamma(), 1e-14, "I^2.5 t");
}

#[test]
fn weyl_integral_of_exponential() {
    // base -∞ leaves e^x invariant under every order
    for &alpha in &[0.5, 1.5, 3.0] {
        let r = riemann_liouville_integral(f64::exp, 0.7, alpha, f64::NEG_INFINITY, &settings()).unwrap();
        assert_near(r.value, 0.7_f64.exp(), 1e-12, "Weyl");
    }
}

#[test]
fn riemann_liouville_edges() {
    let at_base = riemann_liouville_integral(f64::exp, 2.0, 0.5, 2.0, &settings()).unwrap();
    assert_eq!(at_base.value, 0.0);
    assert!(matches!(
        riemann_liouville_integral(f64::exp, 1.0, 0.5, 2.0, &settings()),
        Err(QuadError::InvalidLimits { .. })
    ));
    assert_eq!(
        riemann_liouville_integral(f64::exp, 1.0, 0.0, 0.0, &settings()).err(),
        Some(QuadError::InvalidOrder(0.0))
    );
    assert_eq!(
        riemann_liouville_integral(f64::exp, 1.0, f64::INFINITY, 0.0, &settings()).err(),
        Some(QuadError::InvalidOrder(f64::INFINITY))
    );
}
