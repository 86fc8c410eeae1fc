//! # stepwise
//!
//! Iterative numerical kernels for scalar functions and small ODE systems:
//! Richardson-extrapolated finite differences and fractional derivatives,
//! adaptive Gauss-Kronrod quadrature, Householder-family root finders, Brent
//! minimization with a monotone-function inverse, and adaptive explicit
//! Runge-Kutta integration with dense output.
//!
//! ## Quick start
//!
//! ```
//! use stepwise::diff::{derivative, DerivativeSettings};
//! use stepwise::optim::newton;
//! use stepwise::Tolerance;
//!
//! // d/dx sin(x) at 1
//! let d = derivative(|x: f64| x.sin(), 1.0, &DerivativeSettings::default()).unwrap();
//! assert!((d.value - 1.0_f64.cos()).abs() < 1e-8);
//!
//! // sqrt(2) as the root of x² = 2
//! let r = newton(|x: f64| x * x, |x| 2.0 * x, 2.0, 1.0, &Tolerance::HOUSEHOLDER).unwrap();
//! assert!((r.x - 2.0_f64.sqrt()).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`tolerance`]: [`Tolerance`], three base-10 exponents from which every
//!   iterative routine derives its absolute tolerance, relative tolerance and
//!   iteration cap.
//!
//! - [`diff`]: derivatives of `f: T -> T` from central, forward or backward
//!   stencils refined geometrically, with weights from an inverse Vandermonde
//!   matrix, plus a binomial-sum estimator for higher orders and
//!   Riemann-Liouville / Caputo derivatives of real order.
//!
//! - [`quad`]: adaptive Gauss-Kronrod quadrature (G7/K15 to G30/K61) over
//!   finite or infinite limits, Newton-Cotes and Romberg rules for sampled
//!   data, and the Riemann-Liouville fractional integral.
//!
//! - [`optim`]: bisection, Newton, Halley and general-order Householder
//!   iteration; parabolic bracketing and Brent minimization; inversion of
//!   monotone functions on open or closed domains. Requires `optim` feature.
//!
//! - [`ode`]: Bogacki-Shampine 3(2) and Dormand-Prince 5(4) integrators with
//!   step-size control and per-step interpolants. Requires `ode` feature.
//!
//! - [`linalg`]: Vandermonde matrices and their closed-form inverse,
//!   elementary symmetric polynomials, partial Bell polynomials, and dense
//!   [`Polynomial`](linalg::Polynomial)s with Legendre and Stieltjes
//!   constructors.
//!
//! - [`dynmatrix`]: heap-allocated column-major [`DynMatrix`], the storage
//!   behind stencil weights, Bell tables, Romberg tables and Runge-Kutta
//!   stage tables.
//!
//! - [`iteration`]: the refinement protocol the finite-difference estimators
//!   are driven by.
//!
//! - [`traits`]: element traits:
//!   - [`Scalar`]: matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`]: `f32` / `f64`, used by every solver
//!
//! ## Logging
//!
//! Solvers emit [`tracing`](https://docs.rs/tracing) events: `debug` when a
//! solve converges, `warn` when it gives up, `trace` for individual steps.
//! Nothing is printed unless the application installs a subscriber.
//!
//! ## Cargo features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `ode`   | yes     | Adaptive Runge-Kutta integration |
//! | `optim` | yes     | Root finding, minimization, monotone inverse |
//! | `serde` | no      | `Serialize` / `Deserialize` for settings, results and errors |
//! | `all`   | no      | All of the above |

pub mod diff;
pub mod dynmatrix;
pub mod iteration;
pub mod linalg;
#[cfg(feature = "ode")]
pub mod ode;
#[cfg(feature = "optim")]
pub mod optim;
pub mod quad;
pub mod tolerance;
pub mod traits;

pub use dynmatrix::DynMatrix;
pub use iteration::IterState;
pub use tolerance::Tolerance;
pub use traits::{FloatScalar, Scalar};
