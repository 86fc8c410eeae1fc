use core::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::dynmatrix::DynMatrix;
use crate::tolerance::Tolerance;
use crate::traits::FloatScalar;

use super::tableau::{ButcherTableau, RK23, RK45};
use super::{DenseSegment, OdeError, OdeState, OdeStats};

/// Settings for adaptive step-size control.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdeSettings<T> {
    /// Error tolerances and step cap (default: abs 10^-6, rel 10^-3,
    /// 100 000 accepted plus rejected steps).
    pub tolerance: Tolerance<T>,
    /// Largest step magnitude (default: unbounded).
    pub max_step: T,
    /// First step magnitude; chosen automatically when `None`.
    pub first_step: Option<T>,
    /// Smallest shrink factor after a rejection (default: 0.2).
    pub min_factor: T,
    /// Largest growth factor after an acceptance (default: 10).
    pub max_factor: T,
    /// Safety factor applied to the optimal step (default: 0.9).
    pub safety: T,
}

impl Default for OdeSettings<f64> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(6.0, 3.0, 5.0),
            max_step: f64::INFINITY,
            first_step: None,
            min_factor: 0.2,
            max_factor: 10.0,
            safety: 0.9,
        }
    }
}

impl Default for OdeSettings<f32> {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::new(6.0, 3.0, 5.0),
            max_step: f32::INFINITY,
            first_step: None,
            min_factor: 0.2,
            max_factor: 10.0,
            safety: 0.9,
        }
    }
}

/// Tableau coefficients converted to the working scalar.
#[derive(Debug, Clone)]
struct Coefficients<T> {
    c: Vec<T>,
    /// `STAGES x STAGES`
    a: DynMatrix<T>,
    /// `B` padded with a zero for the FSAL column.
    b: Vec<T>,
    e: Vec<T>,
    /// `(STAGES + 1) x DENSE_ORDER`
    p: DynMatrix<T>,
    error_exponent: T,
}

impl<T: FloatScalar> Coefficients<T> {
    fn of<M: ButcherTableau>() -> Self {
        let s = M::STAGES;
        let lit = |v: &[f64]| v.iter().map(|&x| T::lit(x)).collect::<Vec<T>>();
        let mut b = lit(M::B);
        b.push(T::zero());
        Self {
            c: lit(M::C),
            a: DynMatrix::from_rows(s, s, &lit(M::A)),
            b,
            e: lit(M::E),
            p: DynMatrix::from_rows(s + 1, M::DENSE_ORDER, &lit(M::P)),
            error_exponent: T::lit((M::ERROR_ORDER + 1) as f64),
        }
    }
}

/// Explicit embedded Runge-Kutta integrator.
///
/// Owns the right-hand side, the trajectory and the dense-output segments.
/// The trajectory starts with `(t0, y0)` and gains one point per accepted
/// step, in the direction of integration; it is never reordered.
///
/// ```
/// use stepwise::ode::{DormandPrince, OdeSettings, OdeState};
///
/// let mut ode = DormandPrince::new(|_t, y: &[f64]| vec![y[0]], 0.0, &[1.0], 1.0, OdeSettings::default()).unwrap();
/// while ode.step().unwrap() == OdeState::Processing {}
/// assert_eq!(ode.current_point(), 1.0);
/// assert!((ode.current_state()[0] - 1.0_f64.exp()).abs() < 1e-2);
/// ```
#[derive(Debug, Clone)]
pub struct RungeKutta<M, T, F> {
    rhs: F,
    settings: OdeSettings<T>,
    coeffs: Coefficients<T>,
    t_end: T,
    /// `+1` forward, `-1` backward.
    direction: T,
    state: OdeState,
    abs_step: T,
    /// `f(t, y)` at the current point.
    fx: Vec<T>,
    /// Stage table, one column per stage plus the FSAL derivative.
    k: DynMatrix<T>,
    trajectory: Vec<(T, Vec<T>)>,
    segments: Vec<DenseSegment<T>>,
    stats: OdeStats,
    _method: PhantomData<M>,
}

/// Bogacki-Shampine 3(2) integrator.
pub type BogackiShampine<T, F> = RungeKutta<RK23, T, F>;
/// Dormand-Prince 5(4) integrator.
pub type DormandPrince<T, F> = RungeKutta<RK45, T, F>;

impl<M, T, F> RungeKutta<M, T, F>
where
    M: ButcherTableau,
    T: FloatScalar,
    F: FnMut(T, &[T]) -> Vec<T>,
{
    /// Prepare an integration of `y' = rhs(t, y)` from `(t0, y0)` to `t_end`.
    ///
    /// Evaluates `rhs(t0, y0)` (and once more for the automatic first step).
    ///
    /// # Errors
    ///
    /// [`OdeError::DimensionMismatch`] if `rhs` returns a vector whose length
    /// differs from `y0`.
    pub fn new(mut rhs: F, t0: T, y0: &[T], t_end: T, settings: OdeSettings<T>) -> Result<Self, OdeError> {
        let dim = y0.len();
        let fx = rhs(t0, y0);
        check_len(dim, &fx)?;

        let direction = if t_end < t0 { -T::one() } else { T::one() };
        let mut ode = Self {
            rhs,
            settings,
            coeffs: Coefficients::of::<M>(),
            t_end,
            direction,
            state: OdeState::Processing,
            abs_step: T::zero(),
            fx,
            k: DynMatrix::zeros(dim, M::STAGES + 1, T::zero()),
            trajectory: vec![(t0, y0.to_vec())],
            segments: Vec::new(),
            stats: OdeStats {
                evals: 1,
                ..OdeStats::default()
            },
            _method: PhantomData,
        };
        ode.abs_step = match settings.first_step {
            Some(h) => h.abs(),
            None => ode.initial_step()?,
        };
        debug!(
            method = M::NAME,
            t0 = t0.as_f64(),
            t_end = t_end.as_f64(),
            dim,
            first_step = ode.abs_step.as_f64(),
            "ode initialized"
        );
        Ok(ode)
    }

    /// Starting step from the scaled norms of `y0`, `f(t0, y0)` and a trial
    /// Euler step (Hairer, Nørsett & Wanner, II.4).
    fn initial_step(&mut self) -> Result<T, OdeError> {
        let tol = &self.settings.tolerance;
        let (atol, rtol) = (tol.abs_tol(), tol.rel_tol());
        let (t0, y0) = self.trajectory[0].clone();

        let scale: Vec<T> = y0.iter().map(|y| atol + y.abs() * rtol).collect();
        let d0 = rms_scaled(y0.iter().copied(), &scale);
        let d1 = rms_scaled(self.fx.iter().copied(), &scale);

        let small = T::lit(1e-5);
        let h0 = if d0 < small || d1 < small {
            T::lit(1e-6)
        } else {
            T::lit(0.01) * d0 / d1
        };

        let y1: Vec<T> = y0
            .iter()
            .zip(&self.fx)
            .map(|(&y, &f)| y + h0 * self.direction * f)
            .collect();
        let f1 = (self.rhs)(t0 + h0 * self.direction, &y1);
        self.stats.evals += 1;
        check_len(y0.len(), &f1)?;
        let d2 = rms_scaled(f1.iter().zip(&self.fx).map(|(&a, &b)| a - b), &scale) / h0;

        let tiny = T::lit(1e-15);
        let h1 = if d1 <= tiny && d2 <= tiny {
            T::lit(1e-6).max(h0 * T::lit(1e-3))
        } else {
            (T::lit(0.01) / d1.max(d2)).powf(T::one() / self.coeffs.error_exponent)
        };
        Ok((T::lit(100.0) * h0).min(h1))
    }

    /// Advance by one accepted step, retrying internally with smaller steps
    /// after rejections.
    ///
    /// Returns the new state; anything but [`OdeState::Processing`] is
    /// terminal.
    ///
    /// # Errors
    ///
    /// [`OdeError::Terminated`] when called after a terminal state, and
    /// [`OdeError::DimensionMismatch`] if `rhs` returns the wrong length.
    pub fn step(&mut self) -> Result<OdeState, OdeError> {
        if self.state.is_terminal() {
            return Err(OdeError::Terminated(self.state));
        }
        if self.current_point() == self.t_end {
            return Ok(self.finish(OdeState::Succeeded));
        }

        let outcome = self.attempt()?;
        if outcome.is_terminal() {
            return Ok(self.finish(outcome));
        }
        if self.direction * (self.current_point() - self.t_end) >= T::zero() {
            return Ok(self.finish(OdeState::Succeeded));
        }
        Ok(OdeState::Processing)
    }

    /// Step until the end point is reached or the integration fails.
    ///
    /// Returns the terminal state.
    pub fn run(&mut self) -> Result<OdeState, OdeError> {
        loop {
            let state = self.step()?;
            if state.is_terminal() {
                return Ok(state);
            }
        }
    }

    fn finish(&mut self, state: OdeState) -> OdeState {
        self.state = state;
        match state {
            OdeState::Succeeded => debug!(
                method = M::NAME,
                t = self.current_point().as_f64(),
                accepted = self.stats.accepted,
                rejected = self.stats.rejected,
                evals = self.stats.evals,
                "ode integration finished"
            ),
            _ => warn!(
                method = M::NAME,
                ?state,
                t = self.current_point().as_f64(),
                step = self.abs_step.as_f64(),
                "ode integration stopped"
            ),
        }
        state
    }

    /// One accepted step from the current point, or the terminal state that
    /// prevented it.
    fn attempt(&mut self) -> Result<OdeState, OdeError> {
        let stages = M::STAGES;
        let dim = self.fx.len();
        let (t, y) = match self.trajectory.last() {
            Some((t, y)) => (*t, y.clone()),
            None => return Ok(OdeState::NotFinite),
        };
        let tol = self.settings.tolerance;
        let (atol, rtol) = (tol.abs_tol(), tol.rel_tol());
        let max_steps = tol.max_iter();
        let s = self.settings;
        let exponent = -T::one() / self.coeffs.error_exponent;

        let toward = self.direction * T::infinity();
        let min_step = T::lit(10.0) * (t.next_toward(toward) - t).abs();
        let mut abs_h = self.abs_step.min(s.max_step).max(min_step);
        let mut rejected = false;

        loop {
            if self.stats.accepted + self.stats.rejected >= max_steps {
                return Ok(OdeState::MaxStepsExceeded);
            }
            if abs_h < min_step {
                return Ok(OdeState::StepTooSmall);
            }

            let mut t_new = t + self.direction * abs_h;
            if self.direction * (t_new - self.t_end) > T::zero() {
                t_new = self.t_end;
            }
            let h = t_new - t;

            self.k.set_col(0, &self.fx);
            let mut stage_y = vec![T::zero(); dim];
            for i in 1..stages {
                for (j, yj) in stage_y.iter_mut().enumerate() {
                    let mut dy = T::zero();
                    for m in 0..i {
                        let a = self.coeffs.a[(i, m)];
                        if a != T::zero() {
                            dy = dy + a * self.k[(j, m)];
                        }
                    }
                    *yj = y[j] + h * dy;
                }
                let ki = (self.rhs)(t + self.coeffs.c[i] * h, &stage_y);
                check_len(dim, &ki)?;
                self.k.set_col(i, &ki);
            }

            let increment = self.k.mul_vec(&self.coeffs.b);
            let y_new: Vec<T> = y.iter().zip(&increment).map(|(&y, &d)| y + h * d).collect();
            let f_new = (self.rhs)(t_new, &y_new);
            check_len(dim, &f_new)?;
            self.k.set_col(stages, &f_new);
            self.stats.evals += stages;

            let scale: Vec<T> = y
                .iter()
                .zip(&y_new)
                .map(|(a, b)| atol + a.abs().max(b.abs()) * rtol)
                .collect();
            let error = self.k.mul_vec(&self.coeffs.e);
            let err = rms_scaled(error.into_iter().map(|e| e * h), &scale);

            if !err.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                return Ok(OdeState::NotFinite);
            }

            if err < T::one() {
                let mut factor = if err == T::zero() {
                    s.max_factor
                } else {
                    s.max_factor.min(s.safety * err.powf(exponent))
                };
                if rejected {
                    factor = factor.min(T::one());
                }
                abs_h = abs_h * factor;
                trace!(t = t_new.as_f64(), h = h.as_f64(), err = err.as_f64(), "step accepted");

                let q = &self.k * &self.coeffs.p;
                self.segments.push(DenseSegment::new(t, h, y, q));
                self.trajectory.push((t_new, y_new));
                self.fx = f_new;
                self.abs_step = abs_h;
                self.stats.accepted += 1;
                return Ok(OdeState::Processing);
            }

            abs_h = abs_h * s.min_factor.max(s.safety * err.powf(exponent));
            rejected = true;
            self.stats.rejected += 1;
            trace!(t = t.as_f64(), h = h.as_f64(), err = err.as_f64(), "step rejected");
        }
    }

    /// Solution at `t` from the dense output.
    ///
    /// # Errors
    ///
    /// [`OdeError::OutOfBounds`] unless `t` lies between the initial point
    /// and the current point.
    pub fn evaluate(&self, t: T) -> Result<Vec<T>, OdeError> {
        let (t0, y0) = (self.trajectory[0].0, &self.trajectory[0].1);
        if self.segments.is_empty() && t == t0 {
            return Ok(y0.clone());
        }

        // segments are ordered along the direction of integration
        let dir = self.direction;
        let idx = self
            .segments
            .partition_point(|seg| dir * (seg.end() - t) < T::zero());
        match self.segments.get(idx) {
            Some(seg) if seg.contains(t) => Ok(seg.evaluate(t)),
            _ => {
                let cur = self.current_point();
                Err(OdeError::OutOfBounds {
                    t: t.as_f64(),
                    lower: t0.min(cur).as_f64(),
                    upper: t0.max(cur).as_f64(),
                })
            }
        }
    }

    pub fn state(&self) -> OdeState {
        self.state
    }

    /// Latest accepted point.
    pub fn current_point(&self) -> T {
        self.trajectory.last().map_or(self.t_end, |(t, _)| *t)
    }

    /// Solution at [`current_point`](Self::current_point).
    pub fn current_state(&self) -> &[T] {
        self.trajectory
            .last()
            .map(|(_, y)| y.as_slice())
            .unwrap_or_default()
    }

    /// The accepted point before the current one, if any step was taken.
    pub fn previous_point(&self) -> Option<T> {
        let n = self.trajectory.len();
        (n >= 2).then(|| self.trajectory[n - 2].0)
    }

    /// Accepted `(t, y)` pairs in the order they were reached.
    pub fn trajectory(&self) -> &[(T, Vec<T>)] {
        &self.trajectory
    }

    /// Dense-output segments, one per accepted step.
    pub fn segments(&self) -> &[DenseSegment<T>] {
        &self.segments
    }

    pub fn stats(&self) -> &OdeStats {
        &self.stats
    }

    /// Step magnitude proposed for the next step.
    pub fn step_size(&self) -> T {
        self.abs_step
    }

    pub fn end_point(&self) -> T {
        self.t_end
    }

    pub fn settings(&self) -> &OdeSettings<T> {
        &self.settings
    }
}

/// Build an integrator and run it to a terminal state.
///
/// The returned integrator holds the trajectory and dense output; check
/// [`state`](RungeKutta::state) to see whether the end point was reached.
///
/// # Errors
///
/// Those of [`RungeKutta::new`] and [`RungeKutta::run`].
pub fn solve_ivp<M, T, F>(
    rhs: F,
    t0: T,
    y0: &[T],
    t_end: T,
    settings: OdeSettings<T>,
) -> Result<RungeKutta<M, T, F>, OdeError>
where
    M: ButcherTableau,
    T: FloatScalar,
    F: FnMut(T, &[T]) -> Vec<T>,
{
    let mut ode = RungeKutta::new(rhs, t0, y0, t_end, settings)?;
    ode.run()?;
    Ok(ode)
}

fn check_len<T>(expected: usize, values: &[T]) -> Result<(), OdeError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(OdeError::DimensionMismatch {
            expected,
            got: values.len(),
        })
    }
}

/// `sqrt(mean((v_i / scale_i)²))`
fn rms_scaled<T: FloatScalar>(values: impl Iterator<Item = T>, scale: &[T]) -> T {
    if scale.is_empty() {
        return T::zero();
    }
    let sum = values
        .zip(scale)
        .fold(T::zero(), |acc, (v, &s)| acc + (v / s) * (v / s));
    (sum / T::lit(scale.len() as f64)).sqrt()
}
