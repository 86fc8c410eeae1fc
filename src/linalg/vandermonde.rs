use crate::dynmatrix::DynMatrix;
use crate::traits::FloatScalar;

use super::LinalgError;

/// Vandermonde matrix `M[(i, j)] = v[i]^j` of size `n x n`.
///
/// ```
/// use stepwise::linalg::vandermonde;
/// let m = vandermonde(&[2.0_f64, 3.0]);
/// assert_eq!(m[(0, 0)], 1.0);
/// assert_eq!(m[(1, 1)], 3.0);
/// ```
pub fn vandermonde<T: FloatScalar>(v: &[T]) -> DynMatrix<T> {
    let n = v.len();
    let mut m = DynMatrix::zeros(n, n, T::zero());
    for (i, &x) in v.iter().enumerate() {
        let mut p = T::one();
        for j in 0..n {
            m[(i, j)] = p;
            p = p * x;
        }
    }
    m
}

/// Elementary symmetric polynomials `[e0, e1, ..., en]` of `v`, with `e0 = 1`.
///
/// ```
/// use stepwise::linalg::elementary_symmetric;
/// assert_eq!(elementary_symmetric(&[2.0_f64, 3.0, 4.0]), vec![1.0, 9.0, 26.0, 24.0]);
/// ```
pub fn elementary_symmetric<T: FloatScalar>(v: &[T]) -> Vec<T> {
    let mut e = vec![T::zero(); v.len() + 1];
    e[0] = T::one();
    for (m, &x) in v.iter().enumerate() {
        // descending so e[k - 1] is still the previous row
        for k in (1..=m + 1).rev() {
            e[k] = e[k] + x * e[k - 1];
        }
    }
    e
}

/// Closed-form inverse of [`vandermonde`]`(v)`.
///
/// Entry `(j, i)` is the coefficient of `t^j` in the Lagrange basis polynomial
/// of node `i`:
///
/// ```text
/// inv[(j, i)] = (-1)^(n-1-j) · e_(n-1-j)(v without v[i]) / ∏_(k≠i) (v[i] - v[k])
/// ```
///
/// Nodes must be distinct; repeated nodes produce non-finite entries. Use
/// [`try_inverse_vandermonde`] to have that checked.
///
/// ```
/// use stepwise::linalg::{inverse_vandermonde, vandermonde};
/// let v = [2.0_f64, 3.0, 4.0, 5.0];
/// let prod = &vandermonde(&v) * &inverse_vandermonde(&v);
/// for i in 0..4 {
///     for j in 0..4 {
///         let expected = if i == j { 1.0 } else { 0.0 };
///         assert!((prod[(i, j)] - expected).abs() < 1e-10);
///     }
/// }
/// ```
pub fn inverse_vandermonde<T: FloatScalar>(v: &[T]) -> DynMatrix<T> {
    let n = v.len();
    let mut inv = DynMatrix::zeros(n, n, T::zero());
    let mut others = Vec::with_capacity(n.saturating_sub(1));
    for i in 0..n {
        others.clear();
        others.extend(v.iter().enumerate().filter(|&(k, _)| k != i).map(|(_, &x)| x));
        let esp = elementary_symmetric(&others);
        let scale = others.iter().fold(T::one(), |acc, &x| acc * (v[i] - x));
        for j in 0..n {
            let deg = n - 1 - j;
            let sign = if deg % 2 == 0 { T::one() } else { -T::one() };
            inv[(j, i)] = sign * esp[deg] / scale;
        }
    }
    inv
}

/// [`inverse_vandermonde`] with an up-front check for repeated nodes.
pub fn try_inverse_vandermonde<T: FloatScalar>(v: &[T]) -> Result<DynMatrix<T>, LinalgError> {
    for i in 0..v.len() {
        for j in i + 1..v.len() {
            if v[i] == v[j] {
                return Err(LinalgError::RepeatedNode {
                    i,
                    j,
                    value: v[i].as_f64(),
                });
            }
        }
    }
    Ok(inverse_vandermonde(v))
}
