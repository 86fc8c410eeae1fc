use crate::dynmatrix::DynMatrix;
use crate::traits::FloatScalar;

/// Binomial coefficient `C(n, k)` as a float; zero when `k > n`.
///
/// ```
/// use stepwise::linalg::binomial;
/// assert_eq!(binomial::<f64>(5, 2), 10.0);
/// assert_eq!(binomial::<f64>(3, 4), 0.0);
/// ```
pub fn binomial<T: FloatScalar>(n: usize, k: usize) -> T {
    if k > n {
        return T::zero();
    }
    let k = k.min(n - k);
    let mut c = T::one();
    for i in 1..=k {
        // c·(n-k+i) is divisible by i at every step
        c = c * T::lit((n - k + i) as f64) / T::lit(i as f64);
    }
    c.round()
}

/// `n!` as a float.
pub fn factorial<T: FloatScalar>(n: usize) -> T {
    (1..=n).fold(T::one(), |acc, i| acc * T::lit(i as f64))
}

/// Partial Bell polynomials `B[n][k] = B_(n,k)(x[0], x[1], ...)` for `n ≤ N`.
///
/// `x` holds `N` values (typically the derivatives `f', f'', ..., f^(N)`).
/// Returns an `(N+1) x (N+1)` lower-triangular matrix with
///
/// - `B[0][0] = 1`, `B[n][0] = 0` for `n ≥ 1`
/// - `B[n][1] = x[n-1]`, `B[n][n] = x[0]^n`
/// - `B[n+1][k+1] = Σ_(i=0)^(n-k) C(n, i)·x[i]·B[n-i][k]`
///
/// Entries above the diagonal are zero.
///
/// ```
/// use stepwise::linalg::bell_triangular;
/// // derivatives of e^x are all 1; B_(n,k)(1, 1, ...) are Stirling numbers of the second kind
/// let b = bell_triangular(&[1.0_f64; 4]);
/// assert_eq!(b[(4, 2)], 7.0);
/// assert_eq!(b[(4, 3)], 6.0);
/// ```
pub fn bell_triangular<T: FloatScalar>(x: &[T]) -> DynMatrix<T> {
    let big_n = x.len();
    let mut b = DynMatrix::zeros(big_n + 1, big_n + 1, T::zero());
    b[(0, 0)] = T::one();

    for n in 1..=big_n {
        b[(n, 1)] = x[n - 1];
        b[(n, n)] = x[0].powi(n as i32);
    }

    for n in 2..big_n {
        for k in 1..n {
            let mut sum = T::zero();
            for i in 0..=n - k {
                sum = sum + binomial::<T>(n, i) * x[i] * b[(n - i, k)];
            }
            b[(n + 1, k + 1)] = sum;
        }
    }
    b
}
