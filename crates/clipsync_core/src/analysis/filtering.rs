//! Optional pre-correlation filtering.
//!
//! Recordings from different devices often disagree most at the extremes of
//! the spectrum (handling noise, wind, cheap tweeters). Restricting both
//! streams to a shared band before correlating keeps those regions from
//! dominating the peak. Filters are Butterworth biquads from the `biquad`
//! crate, cascaded for a steeper rolloff.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, Type, Q_BUTTERWORTH_F64};
use serde::{Deserialize, Serialize};

use super::types::{AnalysisError, AnalysisResult};

/// Which frequencies survive the pre-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Samples pass through untouched.
    #[default]
    None,
    /// Keep content below `high_cutoff_hz`.
    LowPass,
    /// Keep content above `low_cutoff_hz`.
    HighPass,
    /// Keep content between the two cutoffs.
    BandPass,
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterType::None => write!(f, "None"),
            FilterType::LowPass => write!(f, "Low Pass"),
            FilterType::HighPass => write!(f, "High Pass"),
            FilterType::BandPass => write!(f, "Band Pass"),
        }
    }
}

/// Pre-filter settings applied to every stream of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub filter_type: FilterType,
    /// Lower edge (Hz), used by high-pass and band-pass.
    pub low_cutoff_hz: f64,
    /// Upper edge (Hz), used by low-pass and band-pass.
    pub high_cutoff_hz: f64,
    /// Number of cascaded second-order sections per edge.
    pub sections: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_type: FilterType::None,
            low_cutoff_hz: 300.0,
            high_cutoff_hz: 3400.0,
            sections: 2,
        }
    }
}

impl FilterConfig {
    /// Speech band (300-3400 Hz).
    pub fn speech_band() -> Self {
        Self {
            filter_type: FilterType::BandPass,
            ..Self::default()
        }
    }

    /// Whether applying this config changes the samples at all.
    pub fn is_active(&self) -> bool {
        self.filter_type != FilterType::None
    }

    /// Filter `samples` recorded at `sample_rate`.
    ///
    /// # Errors
    /// [`AnalysisError::InvalidAudio`] if a cutoff is not below Nyquist for
    /// this sample rate.
    pub fn apply(&self, samples: &[f64], sample_rate: u32) -> AnalysisResult<Vec<f64>> {
        match self.filter_type {
            FilterType::None => Ok(samples.to_vec()),
            FilterType::LowPass => {
                self.run(samples, sample_rate, Type::LowPass, self.high_cutoff_hz)
            }
            FilterType::HighPass => {
                self.run(samples, sample_rate, Type::HighPass, self.low_cutoff_hz)
            }
            FilterType::BandPass => {
                let high_passed =
                    self.run(samples, sample_rate, Type::HighPass, self.low_cutoff_hz)?;
                self.run(&high_passed, sample_rate, Type::LowPass, self.high_cutoff_hz)
            }
        }
    }

    fn run(
        &self,
        samples: &[f64],
        sample_rate: u32,
        kind: Type<f64>,
        cutoff_hz: f64,
    ) -> AnalysisResult<Vec<f64>> {
        // Cutoff as a fraction of Nyquist; above 1.0 is rejected by biquad
        let normalized = 2.0 * cutoff_hz / sample_rate as f64;
        let coeffs = Coefficients::<f64>::from_normalized_params(kind, normalized, Q_BUTTERWORTH_F64)
            .map_err(|e| {
                AnalysisError::InvalidAudio(format!(
                    "{} Hz cutoff unusable at {} Hz sample rate: {:?}",
                    cutoff_hz, sample_rate, e
                ))
            })?;

        let mut output = samples.to_vec();
        for _ in 0..self.sections.max(1) {
            let mut section = DirectForm2Transposed::<f64>::new(coeffs);
            for sample in &mut output {
                *sample = section.run(*sample);
            }
        }

        Ok(output)
    }
}
