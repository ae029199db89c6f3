//! Peak lag extraction from a circular correlation buffer.

/// Map a circular buffer index to a signed lag.
///
/// Indices up to `n / 2` are non-negative lags; the upper half wraps to
/// negative lags.
pub fn circular_index_to_lag(index: usize, n: usize) -> i64 {
    if index > n / 2 {
        index as i64 - n as i64
    } else {
        index as i64
    }
}

/// Map a signed lag back to its circular buffer index.
pub fn lag_to_circular_index(lag: i64, n: usize) -> usize {
    if lag < 0 {
        (n as i64 + lag) as usize
    } else {
        lag as usize
    }
}

/// Find the lag of the largest correlation value.
///
/// Scans left to right with a strict `>` so the earliest index wins ties; a
/// flat (or empty) sequence resolves to lag 0. `_reference_length` is kept
/// for call-site symmetry and does not affect the result.
pub fn find_peak_offset(correlation: &[f64], _reference_length: usize) -> i64 {
    let mut best_index = 0;
    let mut best_value = match correlation.first() {
        Some(&v) => v,
        None => return 0,
    };

    for (i, &value) in correlation.iter().enumerate().skip(1) {
        if value > best_value {
            best_value = value;
            best_index = i;
        }
    }

    circular_index_to_lag(best_index, correlation.len())
}
