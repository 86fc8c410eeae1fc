use super::*;
use crate::tolerance::Tolerance;
use approx::assert_relative_eq;

const PI: f64 = core::f64::consts::PI;
const TAU: f64 = 2.0 * PI;

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

fn tight() -> OdeSettings<f64> {
    OdeSettings {
        tolerance: Tolerance::new(10.0, 10.0, 5.0),
        ..OdeSettings::default()
    }
}

fn growth(_t: f64, y: &[f64]) -> Vec<f64> {
    vec![y[0]]
}

fn oscillator(_t: f64, y: &[f64]) -> Vec<f64> {
    vec![y[1], -y[0]]
}

// ═══════════════════════════════════════════════════════════════════
// Accuracy
// ═══════════════════════════════════════════════════════════════════

#[test]
fn exponential_growth_reaches_e() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_eq!(sol.current_point(), 1.0);
    assert_near(sol.current_state()[0], core::f64::consts::E, 1e-8, "y(1)");
}

#[test]
fn default_settings_are_loose_but_close() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, OdeSettings::default()).unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_near(sol.current_state()[0], core::f64::consts::E, 1e-3, "y(1)");
}

#[test]
fn harmonic_oscillator_full_period() {
    let sol = solve_ivp::<RK45, _, _>(oscillator, 0.0, &[1.0, 0.0], TAU, tight()).unwrap();
    let y = sol.current_state();
    assert_near(y[0], 1.0, 1e-8, "cos");
    assert_near(y[1], 0.0, 1e-8, "sin");
}

#[test]
fn backward_integration() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], -1.0, tight()).unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_eq!(sol.current_point(), -1.0);
    assert_near(sol.current_state()[0], (-1.0_f64).exp(), 1e-8, "y(-1)");
}

#[test]
fn bogacki_shampine_gaussian() {
    let settings = OdeSettings {
        tolerance: Tolerance::new(8.0, 8.0, 5.0),
        ..OdeSettings::default()
    };
    let sol =
        solve_ivp::<RK23, _, _>(|t, y: &[f64]| vec![-2.0 * t * y[0]], 0.0, &[1.0], 2.0, settings)
            .unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_near(sol.current_state()[0], (-4.0_f64).exp(), 1e-6, "exp(-t²)");
    // the low-order pair needs many more steps than RK45 would
    assert!(sol.stats().accepted > 100);
}

#[test]
fn single_precision() {
    let settings = OdeSettings::<f32> {
        tolerance: Tolerance::new(5.0, 5.0, 5.0),
        ..OdeSettings::default()
    };
    let sol = solve_ivp::<RK45, f32, _>(|_t, y: &[f32]| vec![y[0]], 0.0, &[1.0], 1.0, settings)
        .unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert!((sol.current_state()[0] - core::f32::consts::E).abs() < 1e-3);
}

// ═══════════════════════════════════════════════════════════════════
// Dense output
// ═══════════════════════════════════════════════════════════════════

#[test]
fn dense_output_matches_exact_solution() {
    let sol = solve_ivp::<RK45, _, _>(oscillator, 0.0, &[1.0, 0.0], TAU, tight()).unwrap();
    for &t in &[0.0, 0.3, 1.0, PI / 2.0, 2.5, 4.0, TAU] {
        let y = sol.evaluate(t).unwrap();
        assert_near(y[0], t.cos(), 1e-8, "cos");
        assert_near(y[1], -t.sin(), 1e-8, "-sin");
    }
}

#[test]
fn dense_output_matches_restart() {
    let full = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    let half = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 0.5, tight()).unwrap();
    assert_relative_eq!(
        full.evaluate(0.5).unwrap()[0],
        half.current_state()[0],
        max_relative = 1e-9
    );
}

#[test]
fn dense_output_backward() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], -1.0, tight()).unwrap();
    assert_near(sol.evaluate(-0.5).unwrap()[0], (-0.5_f64).exp(), 1e-9, "y(-0.5)");
    assert!(sol.evaluate(0.5).is_err());
}

#[test]
fn dense_output_hits_step_ends() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    for (t, y) in sol.trajectory() {
        assert_relative_eq!(sol.evaluate(*t).unwrap()[0], y[0], max_relative = 1e-12);
    }
}

#[test]
fn segments_tile_the_interval() {
    let sol = solve_ivp::<RK45, _, _>(oscillator, 0.0, &[1.0, 0.0], TAU, tight()).unwrap();
    let segments = sol.segments();
    assert_eq!(segments.len(), sol.stats().accepted);
    assert_eq!(segments[0].start(), 0.0);
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end(), pair[1].start());
    }
    assert_near(segments[segments.len() - 1].end(), TAU, 1e-12, "end");
}

#[test]
fn out_of_bounds() {
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    assert_eq!(
        sol.evaluate(1.5),
        Err(OdeError::OutOfBounds {
            t: 1.5,
            lower: 0.0,
            upper: 1.0
        })
    );
    assert!(sol.evaluate(-0.1).is_err());
}

#[test]
fn evaluate_before_any_step() {
    let ode = DormandPrince::new(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    assert_eq!(ode.evaluate(0.0).unwrap(), vec![1.0]);
    assert!(ode.evaluate(0.1).is_err());
}

// ═══════════════════════════════════════════════════════════════════
// Stepping and termination
// ═══════════════════════════════════════════════════════════════════

#[test]
fn step_by_step_trajectory_is_monotone() {
    let mut ode = DormandPrince::new(oscillator, 0.0, &[1.0, 0.0], TAU, tight()).unwrap();
    assert_eq!(ode.previous_point(), None);
    let mut last = ode.current_point();
    while ode.step().unwrap() == OdeState::Processing {
        let t = ode.current_point();
        assert!(t > last);
        assert_eq!(ode.previous_point(), Some(last));
        last = t;
    }
    assert_eq!(ode.state(), OdeState::Succeeded);
    assert_eq!(ode.trajectory().len(), ode.stats().accepted + 1);
    assert_eq!(ode.trajectory()[0], (0.0, vec![1.0, 0.0]));
}

#[test]
fn step_after_termination_is_an_error() {
    let mut sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, tight()).unwrap();
    assert_eq!(sol.step(), Err(OdeError::Terminated(OdeState::Succeeded)));
    assert_eq!(sol.run(), Err(OdeError::Terminated(OdeState::Succeeded)));
}

#[test]
fn empty_interval_succeeds_immediately() {
    let sol = solve_ivp::<RK45, _, _>(growth, 2.0, &[3.0], 2.0, tight()).unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_eq!(sol.stats().accepted, 0);
    assert_eq!(sol.current_state(), &[3.0]);
    assert_eq!(sol.evaluate(2.0).unwrap(), vec![3.0]);
}

#[test]
fn explicit_first_step() {
    let settings = OdeSettings {
        first_step: Some(0.1),
        ..OdeSettings::default()
    };
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, settings).unwrap();
    assert_eq!(sol.trajectory()[1].0, 0.1);
    // one evaluation at t0, then six per attempt (FSAL)
    let stats = sol.stats();
    assert_eq!(stats.evals, 1 + 6 * (stats.accepted + stats.rejected));
}

#[test]
fn automatic_first_step_costs_one_evaluation() {
    let ode = DormandPrince::new(growth, 0.0, &[1.0], 1.0, OdeSettings::default()).unwrap();
    assert_eq!(ode.stats().evals, 2);
    assert!(ode.step_size() > 0.0);
}

#[test]
fn max_step_is_respected() {
    let settings = OdeSettings {
        max_step: 0.05,
        ..OdeSettings::default()
    };
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, settings).unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert!(sol.stats().accepted >= 20);
    for seg in sol.segments() {
        assert!(seg.step().abs() <= 0.05 + 1e-15);
    }
}

#[test]
fn zero_derivative_grows_step() {
    let sol =
        solve_ivp::<RK45, _, _>(|_t, y: &[f64]| vec![0.0 * y[0]], 0.0, &[1.0], 5.0, OdeSettings::default())
            .unwrap();
    assert_eq!(sol.state(), OdeState::Succeeded);
    assert_eq!(sol.current_state(), &[1.0]);
    assert_eq!(sol.stats().rejected, 0);
    let segments = sol.segments();
    assert_relative_eq!(segments[1].step(), 10.0 * segments[0].step(), max_relative = 1e-12);
}

#[test]
fn rejection_caps_growth_of_next_step() {
    let settings = OdeSettings {
        first_step: Some(1.0),
        ..tight()
    };
    let mut ode = DormandPrince::new(growth, 0.0, &[1.0], 1.0, settings).unwrap();
    assert_eq!(ode.step().unwrap(), OdeState::Processing);
    assert!(ode.stats().rejected > 0);
    assert_eq!(ode.stats().accepted, 1);
    let taken = ode.segments()[0].step();
    assert!(taken < 0.1);
    // a step accepted after a rejection may not grow
    assert!(ode.step_size() <= taken);
}

#[test]
fn max_steps_exceeded() {
    let settings = OdeSettings {
        tolerance: Tolerance::new(6.0, 3.0, 0.0),
        ..OdeSettings::default()
    };
    let sol = solve_ivp::<RK45, _, _>(growth, 0.0, &[1.0], 1.0, settings).unwrap();
    assert_eq!(sol.state(), OdeState::MaxStepsExceeded);
    assert_eq!(sol.stats().accepted + sol.stats().rejected, 1);
    assert!(sol.current_point() < 1.0);
}

#[test]
fn blow_up_stops_with_step_too_small() {
    // y' = y², y(0) = 1 has y = 1/(1 - t)
    let sol =
        solve_ivp::<RK45, _, _>(|_t, y: &[f64]| vec![y[0] * y[0]], 0.0, &[1.0], 2.0, OdeSettings::default())
            .unwrap();
    assert_eq!(sol.state(), OdeState::StepTooSmall);
    assert!(sol.current_point() < 1.0);
    assert!(sol.current_point() > 0.99);
}

#[test]
fn non_finite_rhs() {
    let sol =
        solve_ivp::<RK45, _, _>(|t, _y: &[f64]| vec![if t > 0.5 { f64::NAN } else { 1.0 }], 0.0, &[0.0], 1.0, OdeSettings::default())
            .unwrap();
    assert_eq!(sol.state(), OdeState::NotFinite);
    assert!(sol.current_point() <= 0.5);
}

#[test]
fn dimension_mismatch() {
    let err = DormandPrince::new(|_t, _y: &[f64]| vec![0.0; 3], 0.0, &[1.0, 2.0], 1.0, tight()).err();
    assert_eq!(err, Some(OdeError::DimensionMismatch { expected: 2, got: 3 }));
}

#[test]
fn stats_count_every_attempt() {
    let sol = solve_ivp::<RK23, _, _>(oscillator, 0.0, &[1.0, 0.0], TAU, tight()).unwrap();
    let stats = sol.stats();
    // two evaluations at construction, three per attempt
    assert_eq!(stats.evals, 2 + 3 * (stats.accepted + stats.rejected));
}
