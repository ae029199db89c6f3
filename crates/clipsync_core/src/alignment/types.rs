//! Input and output types for an alignment run.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Decoded audio for one recording, as handed over by the extraction
/// collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInput {
    /// Caller-chosen identifier (file name, camera label, ...).
    pub id: String,
    /// Mono samples, nominally in [-1, 1].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Wall-clock start of the recording, if known.
    pub original_start_time: Option<DateTime<Utc>>,
}

impl StreamInput {
    /// Create a stream with no known start time.
    pub fn new(id: impl Into<String>, samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            id: id.into(),
            samples,
            sample_rate,
            original_start_time: None,
        }
    }

    /// Attach the recording's wall-clock start time.
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.original_start_time = Some(start);
        self
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Offset of one stream relative to the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub id: String,
    /// Positive when this stream lags the reference.
    pub offset_seconds: f64,
    pub offset_samples: i64,
    /// Normalized peak correlation, nominally in [0, 1].
    pub confidence: f64,
    /// Reference start shifted back by this stream's offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_start_time: Option<DateTime<Utc>>,
}

impl AlignmentResult {
    /// Result for the reference stream itself.
    pub fn reference(id: impl Into<String>, start: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            offset_seconds: 0.0,
            offset_samples: 0,
            confidence: 1.0,
            corrected_start_time: start,
        }
    }

    /// Result for a measured stream.
    pub fn measured(
        id: impl Into<String>,
        offset_samples: i64,
        sample_rate: u32,
        confidence: f64,
        reference_start: Option<DateTime<Utc>>,
    ) -> Self {
        let offset_seconds = offset_samples as f64 / sample_rate as f64;
        Self {
            id: id.into(),
            offset_seconds,
            offset_samples,
            confidence,
            // Out of chrono's range means no corrected time
            corrected_start_time: reference_start
                .and_then(|start| start.checked_sub_signed(seconds_to_delta(offset_seconds))),
        }
    }

    /// Whether the confidence meets `min_confidence`. NaN never passes.
    pub fn passes(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence
    }

    /// Offset in milliseconds.
    pub fn offset_ms(&self) -> f64 {
        self.offset_seconds * 1000.0
    }
}

fn seconds_to_delta(seconds: f64) -> TimeDelta {
    TimeDelta::nanoseconds((seconds * 1e9).round() as i64)
}

/// Outcome of one alignment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub reference_id: String,
    /// Position of the reference in `results`.
    #[serde(default)]
    pub reference_index: usize,
    /// One entry per input stream, in input order.
    pub results: Vec<AlignmentResult>,
    pub sample_rate: u32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    /// A run that failed before producing any offsets.
    pub fn failure(
        reference_id: impl Into<String>,
        reference_index: usize,
        sample_rate: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            reference_index,
            results: Vec::new(),
            sample_rate,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Look up a stream's result by id.
    pub fn result_for(&self, id: &str) -> Option<&AlignmentResult> {
        self.results.iter().find(|r| r.id == id)
    }

    /// Lowest confidence among non-reference streams. A NaN confidence is
    /// reported as the minimum.
    pub fn min_confidence(&self) -> Option<f64> {
        self.results
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != self.reference_index)
            .map(|(_, r)| r.confidence)
            .reduce(|lowest, c| if c.is_nan() || c < lowest { c } else { lowest })
    }

    /// Pretty-printed JSON for hand-off to the host application.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Coarse stage reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignStage {
    /// Acquiring samples from the extraction collaborator.
    Extracting,
    /// Correlating a stream against the reference.
    Correlating,
}

impl AlignStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlignStage::Extracting => "extracting",
            AlignStage::Correlating => "correlating",
        }
    }
}

impl std::fmt::Display for AlignStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callback type.
///
/// Arguments: (stage, fraction of that stage completed in [0, 1])
pub type ProgressCallback = Box<dyn Fn(AlignStage, f64) + Send + Sync>;
