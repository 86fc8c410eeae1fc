use crate::traits::FloatScalar;

/// Real polynomial with coefficients stored highest power first.
///
/// ```
/// use stepwise::linalg::Polynomial;
///
/// // 2x² - 3x + 1
/// let p = Polynomial::new(vec![2.0_f64, -3.0, 1.0]);
/// assert_eq!(p.evaluate(2.0), 3.0);
/// assert_eq!(p.derivative().coefficients(), &[4.0, -3.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polynomial<T> {
    coeffs: Vec<T>,
}

impl<T: FloatScalar> Polynomial<T> {
    /// Polynomial `c[0]·x^n + c[1]·x^(n-1) + … + c[n]`.
    ///
    /// An empty vector is the zero polynomial.
    pub fn new(coeffs: Vec<T>) -> Self {
        Self { coeffs }
    }

    pub fn coefficients(&self) -> &[T] {
        &self.coeffs
    }

    /// Highest power stored, zero for constants and the empty polynomial.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Horner evaluation.
    pub fn evaluate(&self, x: T) -> T {
        self.coeffs.iter().fold(T::zero(), |acc, &c| acc * x + c)
    }

    /// Term-by-term derivative. A constant differentiates to the empty
    /// polynomial.
    pub fn derivative(&self) -> Self {
        let n = self.degree();
        let coeffs = self
            .coeffs
            .iter()
            .take(n)
            .enumerate()
            .map(|(i, &c)| c * T::lit((n - i) as f64))
            .collect();
        Self { coeffs }
    }

    /// Legendre polynomial `P_n` from the three-term recurrence
    /// `(k+1)·P_(k+1) = (2k+1)·x·P_k - k·P_(k-1)`.
    ///
    /// ```
    /// use stepwise::linalg::Polynomial;
    /// assert_eq!(Polynomial::<f64>::legendre(2).coefficients(), &[1.5, 0.0, -0.5]);
    /// ```
    pub fn legendre(n: usize) -> Self {
        let mut prev = vec![T::one()];
        if n == 0 {
            return Self::new(prev);
        }
        let mut cur = vec![T::one(), T::zero()];
        for k in 1..n {
            let kf = T::lit(k as f64);
            let a = T::lit((2 * k + 1) as f64);
            let b = T::lit((k + 1) as f64);
            // x·P_k shifts left by one power; P_(k-1) lines up two places lower
            let mut next: Vec<T> = cur.iter().map(|&c| a * c).collect();
            next.push(T::zero());
            for (i, &c) in prev.iter().enumerate() {
                next[i + 2] = next[i + 2] - kf * c;
            }
            for c in next.iter_mut() {
                *c = *c / b;
            }
            prev = core::mem::replace(&mut cur, next);
        }
        Self::new(cur)
    }

    /// Stieltjes polynomial `E_n`, degree `n`, orthogonal to `P_(n-1)·x^k`
    /// on `[-1, 1]` for `k < n`. Its roots are the Kronrod nodes that
    /// extend the `(n-1)`-point Gauss-Legendre rule.
    ///
    /// Built as a sum of Legendre polynomials of the same parity whose
    /// coefficients follow a closed-form product recurrence.
    pub fn stieltjes(n: usize) -> Self {
        if n == 0 {
            return Self::new(vec![T::one()]);
        }
        let m = (n - 1) as i64;
        let q = m % 2;
        let r = ((m + 3) / 2) as usize;
        let mut a = vec![T::zero(); r + 1];
        a[r] = T::one();
        for k in 1..r {
            let ki = k as i64;
            let mut s = T::one();
            let mut acc = T::zero();
            for i in (r + 1 - k)..=r {
                let ii = i as i64;
                let num = (m - q + 2 * (ii + ki - 1))
                    * (m + q + 2 * (ki - ii + 1))
                    * (m - 1 - q + 2 * (ii - ki))
                    * (2 * (ki + ii - 1) - 1 - q - m);
                let den = (m - q + 2 * (ii - ki))
                    * (2 * (ki + ii - 1) - q - m)
                    * (m + 1 + q + 2 * (ki - ii))
                    * (m - 1 - q + 2 * (ii + ki));
                s = s * T::lit(num as f64) / T::lit(den as f64);
                acc = acc - a[i] * s;
            }
            a[r - k] = acc;
        }

        let mut coeffs = vec![T::zero(); n + 1];
        for (i, &ai) in a.iter().enumerate().skip(1) {
            let p = Self::legendre(2 * i - 1 - q as usize);
            let offset = coeffs.len() - p.coeffs.len();
            for (j, &c) in p.coeffs.iter().enumerate() {
                coeffs[offset + j] = coeffs[offset + j] + ai * c;
            }
        }
        Self::new(coeffs)
    }
}
