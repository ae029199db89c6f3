//! Error types for the numeric engine.

/// Error types for analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The transform was handed a buffer whose length is not a power of two.
    ///
    /// Correlation pads its inputs before transforming, so reaching this
    /// from the aligner means the padding logic is broken.
    #[error("Transform length must be a non-zero power of two, got {0}")]
    InvalidTransformLength(usize),

    /// Sample acquisition failed in the extraction collaborator.
    #[error("Audio extraction failed: {0}")]
    Extraction(String),

    /// Invalid audio data.
    #[error("Invalid audio data: {0}")]
    InvalidAudio(String),
}

/// Type alias for analysis results.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
