use core::ops::{Add, Mul, Sub};

use crate::traits::Scalar;

use super::DynMatrix;

fn assert_same_shape<T>(a: &DynMatrix<T>, b: &DynMatrix<T>, op: &str) {
    assert_eq!(
        (a.nrows, a.ncols),
        (b.nrows, b.ncols),
        "dimension mismatch: {}x{} {} {}x{}",
        a.nrows,
        a.ncols,
        op,
        b.nrows,
        b.ncols,
    );
}

fn zip_with<T: Scalar>(a: &DynMatrix<T>, b: &DynMatrix<T>, f: impl Fn(T, T) -> T) -> DynMatrix<T> {
    DynMatrix {
        data: a.data.iter().zip(b.data.iter()).map(|(&x, &y)| f(x, y)).collect(),
        nrows: a.nrows,
        ncols: a.ncols,
    }
}

// ── Element-wise addition / subtraction ─────────────────────────────

impl<T: Scalar> Add<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn add(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_same_shape(self, rhs, "+");
        zip_with(self, rhs, |a, b| a + b)
    }
}

impl<T: Scalar> Add for DynMatrix<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl<T: Scalar> Sub<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn sub(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_same_shape(self, rhs, "-");
        zip_with(self, rhs, |a, b| a - b)
    }
}

impl<T: Scalar> Sub for DynMatrix<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        &self - &rhs
    }
}

// ── Matrix multiplication: (M×N) * (N×P) → (M×P) ──────────────────

impl<T: Scalar> Mul<&DynMatrix<T>> for &DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let m = self.nrows;
        let n = self.ncols;
        let p = rhs.ncols;
        let mut data = vec![T::zero(); m * p];
        // column j of the product is A · (column j of B); axpy over A's columns
        for j in 0..p {
            let out = &mut data[j * m..(j + 1) * m];
            for k in 0..n {
                let b_kj = rhs.data[j * n + k];
                if b_kj == T::zero() {
                    continue;
                }
                let a_col = &self.data[k * m..(k + 1) * m];
                for (o, &a) in out.iter_mut().zip(a_col) {
                    *o = *o + a * b_kj;
                }
            }
        }
        DynMatrix {
            data,
            nrows: m,
            ncols: p,
        }
    }
}

impl<T: Scalar> Mul for DynMatrix<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

impl<T: Scalar> Mul<&DynMatrix<T>> for DynMatrix<T> {
    type Output = DynMatrix<T>;

    fn mul(self, rhs: &DynMatrix<T>) -> DynMatrix<T> {
        &self * rhs
    }
}

impl<T: Scalar> DynMatrix<T> {
    /// Matrix-vector product `A · v`.
    ///
    /// ```
    /// use stepwise::DynMatrix;
    /// let a = DynMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(a.mul_vec(&[1.0, 0.0, -1.0]), vec![-2.0, -2.0]);
    /// ```
    pub fn mul_vec(&self, v: &[T]) -> Vec<T> {
        assert_eq!(
            self.ncols,
            v.len(),
            "dimension mismatch: {}x{} * {}",
            self.nrows,
            self.ncols,
            v.len(),
        );
        let mut out = vec![T::zero(); self.nrows];
        for (k, &vk) in v.iter().enumerate() {
            if vk == T::zero() {
                continue;
            }
            for (o, &a) in out.iter_mut().zip(self.col_slice(k)) {
                *o = *o + a * vk;
            }
        }
        out
    }
}
