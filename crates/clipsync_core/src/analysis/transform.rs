//! Discrete Fourier transform over power-of-two lengths.
//!
//! Recursive radix-2 decimation in time: split into even and odd indices,
//! transform each half, then combine with the twiddle factors
//! `exp(-2*pi*i*k/n)`. The inverse reuses the forward transform through
//! conjugation, so there is only one butterfly implementation to trust.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use super::types::{AnalysisError, AnalysisResult};

/// Whether `n` is a non-zero power of two.
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Smallest power of two that is `>= n` (1 for `n == 0`).
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

fn check_length(len: usize) -> AnalysisResult<()> {
    if is_power_of_two(len) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidTransformLength(len))
    }
}

/// Forward transform of a complex sequence.
///
/// # Errors
/// [`AnalysisError::InvalidTransformLength`] if the length is zero or not a
/// power of two.
pub fn transform(input: &[Complex<f64>]) -> AnalysisResult<Vec<Complex<f64>>> {
    check_length(input.len())?;
    Ok(radix2(input))
}

/// Forward transform of a real sequence (imaginary parts taken as zero).
pub fn transform_real(input: &[f64]) -> AnalysisResult<Vec<Complex<f64>>> {
    let complex: Vec<Complex<f64>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
    transform(&complex)
}

/// Inverse transform, scaled by `1/n`.
///
/// Computed as `conj(transform(conj(x))) / n`. Imaginary parts are returned
/// as-is; callers wanting a real signal take `.re` themselves.
pub fn inverse_transform(input: &[Complex<f64>]) -> AnalysisResult<Vec<Complex<f64>>> {
    check_length(input.len())?;

    let conjugated: Vec<Complex<f64>> = input.iter().map(|c| c.conj()).collect();
    let scale = 1.0 / input.len() as f64;

    Ok(radix2(&conjugated)
        .into_iter()
        .map(|c| c.conj() * scale)
        .collect())
}

/// Recursive butterfly. Caller guarantees a power-of-two length.
fn radix2(input: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = input.len();
    if n == 1 {
        return vec![input[0]];
    }

    let even: Vec<Complex<f64>> = input.iter().step_by(2).copied().collect();
    let odd: Vec<Complex<f64>> = input.iter().skip(1).step_by(2).copied().collect();

    let even = radix2(&even);
    let odd = radix2(&odd);

    let half = n / 2;
    let mut output = vec![Complex::new(0.0, 0.0); n];

    for k in 0..half {
        let twiddle = Complex::from_polar(1.0, -2.0 * PI * k as f64 / n as f64);
        let t = twiddle * odd[k];
        output[k] = even[k] + t;
        output[k + half] = even[k] - t;
    }

    output
}
