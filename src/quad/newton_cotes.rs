use crate::dynmatrix::DynMatrix;
use crate::linalg::inverse_vandermonde;
use crate::traits::FloatScalar;

use super::QuadError;

/// `n` samples `(x, f(x))` evenly spaced over `[a, b]`, both ends included.
///
/// ```
/// use stepwise::quad::evenly_spaced;
/// let s = evenly_spaced(|x: f64| x * x, 0.0, 1.0, 3);
/// assert_eq!(s, vec![(0.0, 0.0), (0.5, 0.25), (1.0, 1.0)]);
/// ```
pub fn evenly_spaced<T: FloatScalar>(f: impl Fn(T) -> T, a: T, b: T, n: usize) -> Vec<(T, T)> {
    match n {
        0 => Vec::new(),
        1 => vec![(a, f(a))],
        _ => {
            let h = (b - a) / T::lit((n - 1) as f64);
            (0..n)
                .map(|i| {
                    // pin the last abscissa to b exactly
                    let x = if i == n - 1 { b } else { a + T::lit(i as f64) * h };
                    (x, f(x))
                })
                .collect()
        }
    }
}

fn check_samples<T: FloatScalar>(samples: &[(T, T)], need: usize) -> Result<(), QuadError> {
    if samples.len() < need {
        return Err(QuadError::TooFewSamples {
            got: samples.len(),
            need,
        });
    }
    for (i, w) in samples.windows(2).enumerate() {
        if !(w[1].0 > w[0].0) {
            return Err(QuadError::UnorderedSamples { index: i + 1 });
        }
    }
    Ok(())
}

/// Trapezoidal rule over arbitrarily spaced samples.
///
/// # Errors
///
/// [`QuadError::TooFewSamples`] below two samples,
/// [`QuadError::UnorderedSamples`] unless `x` strictly increases.
pub fn trapezoidal<T: FloatScalar>(samples: &[(T, T)]) -> Result<T, QuadError> {
    check_samples(samples, 2)?;
    let half = T::lit(0.5);
    Ok(samples
        .windows(2)
        .fold(T::zero(), |acc, w| acc + (w[1].0 - w[0].0) * (w[0].1 + w[1].1) * half))
}

/// Composite Simpson's rule for irregularly spaced samples.
///
/// Interval pairs are integrated through the parabola on their three
/// samples. With an odd number of intervals the last one is closed with the
/// parabola through the final three samples. Two samples fall back to the
/// trapezoidal rule.
///
/// # Errors
///
/// As [`trapezoidal`].
pub fn simpson<T: FloatScalar>(samples: &[(T, T)]) -> Result<T, QuadError> {
    check_samples(samples, 2)?;
    if samples.len() == 2 {
        return trapezoidal(samples);
    }
    let two = T::lit(2.0);
    let three = T::lit(3.0);
    let six = T::lit(6.0);
    let intervals = samples.len() - 1;
    let h = |i: usize| samples[i + 1].0 - samples[i].0;
    let y = |i: usize| samples[i].1;

    let mut sum = T::zero();
    for i in (1..intervals).step_by(2) {
        let (h0, h1) = (h(i - 1), h(i));
        let hph = h0 + h1;
        let hdh = h1 / h0;
        let hmh = h1 * h0;
        sum = sum + hph / six * ((two - hdh) * y(i - 1) + hph * hph / hmh * y(i) + (two - T::one() / hdh) * y(i + 1));
    }
    if intervals % 2 == 1 {
        let n = intervals;
        let (h0, h1) = (h(n - 2), h(n - 1));
        sum = sum + y(n) * (two * h1 * h1 + three * h0 * h1) / (six * (h0 + h1));
        sum = sum + y(n - 1) * (h1 * h1 + three * h1 * h0) / (six * h0);
        sum = sum - y(n - 2) * h1 * h1 * h1 / (six * h0 * (h0 + h1));
    }
    Ok(sum)
}

/// Closed interpolatory weights for samples at `nodes`, integrating over
/// `[nodes[0], nodes[last]]`.
///
/// Nodes are rescaled to `[0, 1]`; weight `i` is the integral of the
/// Lagrange basis polynomial of node `i`, read off column `i` of the inverse
/// Vandermonde matrix.
fn interpolatory_weights<T: FloatScalar>(nodes: &[T]) -> Vec<T> {
    let x0 = nodes[0];
    let span = nodes[nodes.len() - 1] - x0;
    let scaled: Vec<T> = nodes.iter().map(|&x| (x - x0) / span).collect();
    let inv = inverse_vandermonde(&scaled);
    (0..nodes.len())
        .map(|i| {
            let integral = (0..nodes.len()).fold(T::zero(), |acc, j| acc + inv[(j, i)] / T::lit((j + 1) as f64));
            span * integral
        })
        .collect()
}

/// Composite closed Newton-Cotes rule of the given degree.
///
/// The samples are split into blocks of `degree` intervals sharing their end
/// samples; each block is integrated exactly for polynomials of that degree
/// through its own nodes, so uneven spacing is allowed. A trailing block
/// with fewer intervals uses the lower degree that fits. Degree 1 is the
/// trapezoidal rule, degree 2 Simpson's, degree 3 Simpson's 3/8.
///
/// High degrees on evenly spaced nodes have weights of both signs; degrees
/// beyond about eight amplify noise in the samples.
///
/// # Errors
///
/// [`QuadError::ZeroDegree`], plus the sample errors of [`trapezoidal`].
///
/// ```
/// use stepwise::quad::{evenly_spaced, newton_cotes};
/// // Boole's rule is exact for quartics
/// let s = evenly_spaced(|x: f64| x.powi(4), 0.0, 2.0, 5);
/// assert!((newton_cotes(&s, 4).unwrap() - 32.0 / 5.0).abs() < 1e-12);
/// ```
pub fn newton_cotes<T: FloatScalar>(samples: &[(T, T)], degree: usize) -> Result<T, QuadError> {
    if degree == 0 {
        return Err(QuadError::ZeroDegree);
    }
    check_samples(samples, 2)?;

    let mut sum = T::zero();
    let mut start = 0;
    let last = samples.len() - 1;
    while start < last {
        let end = (start + degree).min(last);
        let block = &samples[start..=end];
        let nodes: Vec<T> = block.iter().map(|s| s.0).collect();
        let weights = interpolatory_weights(&nodes);
        sum = sum + weights.iter().zip(block).fold(T::zero(), |acc, (&w, s)| acc + w * s.1);
        start = end;
    }
    Ok(sum)
}

/// Romberg extrapolation table for `2^k + 1` evenly spaced samples.
///
/// Row `i`, column 0 is the trapezoidal rule with `2^i` intervals; column
/// `j` removes the `h^(2j)` error term from column `j - 1`. The entries
/// above the diagonal are zero, and `(k, k)` is the final estimate.
///
/// # Errors
///
/// [`QuadError::RombergSampleCount`] unless `samples.len() == 2^k + 1`,
/// [`QuadError::UnevenSamples`], and the errors of [`trapezoidal`].
pub fn romberg_table<T: FloatScalar>(samples: &[(T, T)]) -> Result<DynMatrix<T>, QuadError> {
    check_samples(samples, 2)?;
    let intervals = samples.len() - 1;
    if !intervals.is_power_of_two() {
        return Err(QuadError::RombergSampleCount(samples.len()));
    }
    let (a, b) = (samples[0].0, samples[intervals].0);
    let h = (b - a) / T::lit(intervals as f64);
    let slack = T::lit(1024.0) * T::epsilon() * (a.abs() + b.abs());
    for (i, s) in samples.iter().enumerate() {
        if (s.0 - (a + T::lit(i as f64) * h)).abs() > slack {
            return Err(QuadError::UnevenSamples { index: i });
        }
    }

    let k = intervals.trailing_zeros() as usize;
    let half = T::lit(0.5);
    let mut table = DynMatrix::zeros(k + 1, k + 1, T::zero());
    table[(0, 0)] = (b - a) * (samples[0].1 + samples[intervals].1) * half;
    for i in 1..=k {
        // new midpoints of the 2^(i-1) intervals of the previous row
        let stride = intervals >> i;
        let width = (b - a) / T::lit((1usize << i) as f64);
        let mids = (1..(1usize << i))
            .step_by(2)
            .fold(T::zero(), |acc, m| acc + samples[m * stride].1);
        table[(i, 0)] = table[(i - 1, 0)] * half + width * mids;

        let mut four = T::one();
        for j in 1..=i {
            four = four * T::lit(4.0);
            table[(i, j)] = table[(i, j - 1)] + (table[(i, j - 1)] - table[(i - 1, j - 1)]) / (four - T::one());
        }
    }
    Ok(table)
}

/// Romberg integration: the corner of [`romberg_table`].
///
/// ```
/// use stepwise::quad::{evenly_spaced, romberg};
/// let s = evenly_spaced(f64::exp, 0.0, 1.0, 17);
/// assert!((romberg(&s).unwrap() - (1f64.exp() - 1.0)).abs() < 1e-13);
/// ```
pub fn romberg<T: FloatScalar>(samples: &[(T, T)]) -> Result<T, QuadError> {
    let table = romberg_table(samples)?;
    let k = table.nrows() - 1;
    Ok(table[(k, k)])
}
