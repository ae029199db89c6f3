//! DC removal and peak normalization.

/// Remove the mean and scale so the largest magnitude is 1.
///
/// Silence (all samples equal to the mean) is returned mean-removed, i.e. all
/// zeros, without dividing. Applied identically to every stream so differing
/// recording gains do not bias the correlation magnitude.
pub fn preprocess(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let mut centered: Vec<f64> = samples.iter().map(|x| x - mean).collect();

    let peak = centered.iter().fold(0.0_f64, |max, x| max.max(x.abs()));
    if peak > 0.0 {
        for x in &mut centered {
            *x /= peak;
        }
    }

    centered
}
