//! Seam to the audio extraction collaborator.
//!
//! Decoding containers is the host's job. Anything that can produce a
//! [`StreamInput`] (an FFmpeg pipe, a WAV reader, a test fixture) implements
//! [`SampleSource`] and the aligner pulls samples through it one source at a
//! time.

use crate::analysis::AnalysisResult;

use super::types::StreamInput;

/// Producer of decoded samples for one recording.
pub trait SampleSource: Send + Sync {
    /// Identifier used in results and error messages.
    fn id(&self) -> &str;

    /// Decode and return the recording's samples.
    ///
    /// Errors are reported by the aligner as a failed run carrying the
    /// error's message.
    fn extract(&self) -> AnalysisResult<StreamInput>;
}

/// Already-decoded samples act as their own source.
impl SampleSource for StreamInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn extract(&self) -> AnalysisResult<StreamInput> {
        Ok(self.clone())
    }
}
