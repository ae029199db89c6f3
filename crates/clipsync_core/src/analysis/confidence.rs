//! Normalized confidence score for a correlation peak.

use super::peak::lag_to_circular_index;

/// Sum of squares.
pub fn signal_energy(samples: &[f64]) -> f64 {
    samples.iter().map(|x| x * x).sum()
}

/// Score how reliable the peak at `peak_offset` is.
///
/// Returns `|peak| / sqrt(energy(a) * energy(b))`, or exactly 0 when either
/// signal has no energy. The normalization uses the full signal energies
/// rather than the overlap at that lag, so degenerate edge lags are not
/// strictly bounded by 1. Thresholds such as `min_confidence` are tuned to
/// this formula.
pub fn calculate_confidence(a: &[f64], b: &[f64], correlation: &[f64], peak_offset: i64) -> f64 {
    let energy_a = signal_energy(a);
    let energy_b = signal_energy(b);

    if energy_a == 0.0 || energy_b == 0.0 {
        return 0.0;
    }

    let index = lag_to_circular_index(peak_offset, correlation.len());
    let peak = correlation.get(index).copied().unwrap_or(0.0);

    peak.abs() / (energy_a * energy_b).sqrt()
}
