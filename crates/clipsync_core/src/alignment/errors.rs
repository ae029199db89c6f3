//! Error types for the multi-stream aligner.
//!
//! These never escape [`super::Aligner::align`]; their display text becomes
//! the `error` field of a failed [`super::RunResult`].

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Why an alignment run failed.
#[derive(Error, Debug)]
pub enum AlignError {
    /// Fewer than two streams were supplied.
    #[error("At least 2 streams are required for alignment, got {count}")]
    TooFewStreams { count: usize },

    /// The reference index does not name a stream.
    #[error("Reference index {index} is out of range for {count} streams")]
    ReferenceOutOfRange { index: usize, count: usize },

    /// A stream carried no samples.
    #[error("Stream '{id}' contains no samples")]
    EmptyStream { id: String },

    /// A stream declared a sample rate of zero.
    #[error("Stream '{id}' has a sample rate of 0 Hz")]
    ZeroSampleRate { id: String },

    /// Streams were not sampled at a common rate.
    #[error("Stream '{id}' is sampled at {found} Hz but the reference uses {expected} Hz")]
    SampleRateMismatch {
        id: String,
        expected: u32,
        found: u32,
    },

    /// The extraction collaborator failed for a source.
    #[error("Failed to acquire samples for '{id}': {source}")]
    Source {
        id: String,
        #[source]
        source: AnalysisError,
    },

    /// The pre-correlation filter cannot run on a stream.
    #[error("Pre-filter cannot process '{id}': {source}")]
    Filter {
        id: String,
        #[source]
        source: AnalysisError,
    },

    /// The numeric engine failed (indicates an internal bug).
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),
}

impl AlignError {
    /// Create a source acquisition error.
    pub fn acquisition(id: impl Into<String>, source: AnalysisError) -> Self {
        Self::Source {
            id: id.into(),
            source,
        }
    }

    /// Whether this is a configuration error caught before any computation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::TooFewStreams { .. }
                | Self::ReferenceOutOfRange { .. }
                | Self::EmptyStream { .. }
                | Self::ZeroSampleRate { .. }
                | Self::SampleRateMismatch { .. }
                | Self::Filter { .. }
        )
    }
}

/// Result type for alignment internals.
pub type AlignResult<T> = Result<T, AlignError>;
