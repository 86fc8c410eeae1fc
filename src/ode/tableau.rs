/// Embedded explicit Runge-Kutta pair with continuous extension.
///
/// Each method is a zero-size marker type carrying its coefficients as
/// `f64` statics; the engine converts them to the working scalar once at
/// construction. Slices follow the usual conventions:
///
/// - `C`: nodes, length `STAGES`
/// - `A`: strictly lower-triangular coupling matrix, row-major `STAGES x STAGES`
/// - `B`: weights of the propagated solution, length `STAGES`
/// - `E`: error weights over the stages plus the FSAL derivative at the new
///   point, length `STAGES + 1`
/// - `P`: dense-output coefficients, row-major `(STAGES + 1) x DENSE_ORDER`
pub trait ButcherTableau {
    const NAME: &'static str;
    /// Order of the propagated solution.
    const ORDER: usize;
    /// Order of the embedded error estimator.
    const ERROR_ORDER: usize;
    const STAGES: usize;
    /// Degree of the interpolating polynomial.
    const DENSE_ORDER: usize;
    const C: &'static [f64];
    const A: &'static [f64];
    const B: &'static [f64];
    const E: &'static [f64];
    const P: &'static [f64];
}

/// Bogacki-Shampine 3(2) pair with cubic Hermite dense output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RK23;

impl ButcherTableau for RK23 {
    const NAME: &'static str = "RK23";
    const ORDER: usize = 3;
    const ERROR_ORDER: usize = 2;
    const STAGES: usize = 3;
    const DENSE_ORDER: usize = 3;
    const C: &'static [f64] = &[0.0, 1.0 / 2.0, 3.0 / 4.0];
    #[rustfmt::skip]
    const A: &'static [f64] = &[
        0.0,       0.0,       0.0,
        1.0 / 2.0, 0.0,       0.0,
        0.0,       3.0 / 4.0, 0.0,
    ];
    const B: &'static [f64] = &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0];
    const E: &'static [f64] = &[5.0 / 72.0, -1.0 / 12.0, -1.0 / 9.0, 1.0 / 8.0];
    #[rustfmt::skip]
    const P: &'static [f64] = &[
        1.0, -4.0 / 3.0,  5.0 / 9.0,
        0.0,  1.0,       -2.0 / 3.0,
        0.0,  4.0 / 3.0, -8.0 / 9.0,
        0.0, -1.0,        1.0,
    ];
}

/// Dormand-Prince 5(4) pair with quartic dense output (Shampine 1986).
#[derive(Debug, Clone, Copy, Default)]
pub struct RK45;

impl ButcherTableau for RK45 {
    const NAME: &'static str = "RK45";
    const ORDER: usize = 5;
    const ERROR_ORDER: usize = 4;
    const STAGES: usize = 6;
    const DENSE_ORDER: usize = 4;
    const C: &'static [f64] = &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
    #[rustfmt::skip]
    const A: &'static [f64] = &[
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0,
        44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0,
        19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0,
        9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0,
    ];
    const B: &'static [f64] = &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ];
    const E: &'static [f64] = &[
        -71.0 / 57600.0,
        0.0,
        71.0 / 16695.0,
        -71.0 / 1920.0,
        17253.0 / 339200.0,
        -22.0 / 525.0,
        1.0 / 40.0,
    ];
    #[rustfmt::skip]
    const P: &'static [f64] = &[
        1.0, -8048581381.0 / 2820520608.0, 8663915743.0 / 2820520608.0, -12715105075.0 / 11282082432.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 131558114200.0 / 32700410799.0, -68118460800.0 / 10900136933.0, 87487479700.0 / 32700410799.0,
        0.0, -1754552775.0 / 470086768.0, 14199869525.0 / 1410260304.0, -10690763975.0 / 1880347072.0,
        0.0, 127303824393.0 / 49829197408.0, -318862633887.0 / 49829197408.0, 701980252875.0 / 199316789632.0,
        0.0, -282668133.0 / 205662961.0, 2019193451.0 / 616988883.0, -1453857185.0 / 822651844.0,
        0.0, 40617522.0 / 29380423.0, -110615467.0 / 29380423.0, 69997945.0 / 29380423.0,
    ];
}
