//! FFT-based linear cross-correlation.
//!
//! Uses the correlation theorem: `corr(a, b) = IDFT(DFT(a) * conj(DFT(b)))`.
//! Both inputs are zero-padded to a power of two at least
//! `len(a) + len(b) - 1` long so the circular result contains the full
//! linear correlation with no wraparound.

use rustfft::num_complex::Complex;

use super::transform::{inverse_transform, next_power_of_two, transform};
use super::types::AnalysisResult;

/// Padded length used to correlate sequences of length `len_a` and `len_b`.
pub fn correlation_length(len_a: usize, len_b: usize) -> usize {
    next_power_of_two((len_a + len_b).saturating_sub(1))
}

/// Cross-correlate two real sequences.
///
/// Element `k` of the result is `sum_n a[n + k] * b[n]` for lag `k`, with
/// negative lags wrapped to the end of the buffer. When `a` is `b` delayed by
/// `d` samples the peak sits at lag `+d`, so to ask "how late is `other`
/// compared to `reference`" pass `other` first.
///
/// Lengths may differ. The only error is one propagated from the transform,
/// which cannot happen with the padding used here.
pub fn cross_correlate(a: &[f64], b: &[f64]) -> AnalysisResult<Vec<f64>> {
    let n = correlation_length(a.len(), b.len());

    let fa = transform(&zero_padded(a, n))?;
    let fb = transform(&zero_padded(b, n))?;

    let product: Vec<Complex<f64>> = fa
        .iter()
        .zip(fb.iter())
        .map(|(x, y)| x * y.conj())
        .collect();

    Ok(inverse_transform(&product)?
        .into_iter()
        .map(|c| c.re)
        .collect())
}

fn zero_padded(samples: &[f64], len: usize) -> Vec<Complex<f64>> {
    let mut padded: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();
    padded.resize(len, Complex::new(0.0, 0.0));
    padded
}
