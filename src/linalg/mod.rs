//! Combinatorial and Vandermonde kernels.
//!
//! - [`vandermonde`] / [`inverse_vandermonde`]: power matrix of a node set and
//!   its closed-form inverse, built from [`elementary_symmetric`] polynomials
//!   of the nodes with one node left out at a time. The finite-difference
//!   engine takes its stencil weights from a row of the inverse.
//! - [`bell_triangular`]: partial Bell polynomials `B[n][k]` of a derivative
//!   sequence, the table behind Faà di Bruno's formula and the general
//!   Householder step.
//! - [`binomial`]: binomial coefficients as floats.
//! - [`Polynomial`]: dense real polynomials with exact derivatives, plus the
//!   Legendre and Stieltjes families behind the Gauss-Kronrod rules.

mod bell;
mod polynomial;
mod vandermonde;

pub use bell::{bell_triangular, binomial, factorial};
pub use polynomial::Polynomial;
pub use vandermonde::{elementary_symmetric, inverse_vandermonde, try_inverse_vandermonde, vandermonde};

use thiserror::Error;

/// Errors from the linear algebra kernels.
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinalgError {
    /// Two nodes of a Vandermonde system coincide.
    #[error("vandermonde nodes {i} and {j} coincide at {value}")]
    RepeatedNode { i: usize, j: usize, value: f64 },
}
