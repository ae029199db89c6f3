//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be updated on disk
//! independently of the others.

use serde::{Deserialize, Serialize};

use crate::alignment::DEFAULT_MIN_CONFIDENCE;
use crate::analysis::{FilterConfig, FilterType};
use crate::logging::LogLevel;

use super::manager::{ConfigError, ConfigResult};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Alignment run settings.
    #[serde(default)]
    pub alignment: AlignmentSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values that parse fine but make no sense.
    pub fn validate(&self) -> ConfigResult<()> {
        self.alignment.validate()
    }
}

/// Top-level config sections, one per TOML table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Alignment,
    Logging,
}

impl ConfigSection {
    /// Name of the TOML table for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Alignment => "alignment",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 2] {
        [ConfigSection::Alignment, ConfigSection::Logging]
    }
}

/// Settings for an alignment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSettings {
    /// Index of the reference stream.
    #[serde(default)]
    pub reference_index: usize,

    /// Minimum per-stream confidence for a successful run (0-1).
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Pre-correlation filter.
    #[serde(default)]
    pub filtering_method: FilterType,

    /// Lower cutoff for high-pass / band-pass (Hz).
    #[serde(default = "default_low_cutoff")]
    pub filter_low_cutoff_hz: f64,

    /// Upper cutoff for low-pass / band-pass (Hz).
    #[serde(default = "default_high_cutoff")]
    pub filter_high_cutoff_hz: f64,

    /// Correlate stream pairs in parallel.
    #[serde(default)]
    pub parallel: bool,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_low_cutoff() -> f64 {
    300.0
}

fn default_high_cutoff() -> f64 {
    3400.0
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            reference_index: 0,
            min_confidence: default_min_confidence(),
            filtering_method: FilterType::None,
            filter_low_cutoff_hz: default_low_cutoff(),
            filter_high_cutoff_hz: default_high_cutoff(),
            parallel: false,
        }
    }
}

impl AlignmentSettings {
    /// Filter config described by these settings.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            filter_type: self.filtering_method,
            low_cutoff_hz: self.filter_low_cutoff_hz,
            high_cutoff_hz: self.filter_high_cutoff_hz,
            ..FilterConfig::default()
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::invalid(
                "alignment.min_confidence",
                format!("{} is outside [0, 1]", self.min_confidence),
            ));
        }

        let cutoffs_used = match self.filtering_method {
            FilterType::None => false,
            FilterType::LowPass | FilterType::HighPass | FilterType::BandPass => true,
        };
        if cutoffs_used && (self.filter_low_cutoff_hz <= 0.0 || self.filter_high_cutoff_hz <= 0.0) {
            return Err(ConfigError::invalid(
                "alignment.filter_*_cutoff_hz",
                "cutoffs must be positive",
            ));
        }
        if self.filtering_method == FilterType::BandPass
            && self.filter_low_cutoff_hz >= self.filter_high_cutoff_hz
        {
            return Err(ConfigError::invalid(
                "alignment.filter_low_cutoff_hz",
                format!(
                    "{} Hz must be below filter_high_cutoff_hz ({} Hz)",
                    self.filter_low_cutoff_hz, self.filter_high_cutoff_hz
                ),
            ));
        }

        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,
}
