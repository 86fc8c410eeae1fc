use core::fmt::Debug;
use num_traits::{Float, Num, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Real floating-point scalar used by every solver in the crate.
///
/// Adds infallible conversion from `f64` literals (tableau coefficients,
/// default tolerances), the one-ulp neighbour used by the ODE step floor, and
/// the gamma function behind fractional integrals.
pub trait FloatScalar: Scalar + Float {
    /// Convert an `f64` constant into `Self`, rounding if necessary.
    fn lit(x: f64) -> Self;

    /// Widen (or keep) the value as `f64`. Used for error payloads.
    fn as_f64(self) -> f64;

    /// The adjacent representable value from `self` in the direction of `toward`.
    ///
    /// Returns `self` when `toward == self`, and NaN when either is NaN.
    fn next_toward(self, toward: Self) -> Self;

    /// Euler's gamma function, Γ(self).
    fn tgamma(self) -> Self;
}

macro_rules! impl_float_scalar {
    ($($t:ty => $next:path, $gamma:path);*) => {
        $(
            impl FloatScalar for $t {
                #[inline]
                fn lit(x: f64) -> $t {
                    x as $t
                }

                #[inline]
                fn as_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn next_toward(self, toward: $t) -> $t {
                    $next(self, toward)
                }

                #[inline]
                fn tgamma(self) -> $t {
                    $gamma(self)
                }
            }
        )*
    };
}

impl_float_scalar!(f32 => libm::nextafterf, libm::tgammaf; f64 => libm::nextafter, libm::tgamma);
