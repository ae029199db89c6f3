//! clipsync core - audio-based offset estimation between recordings.
//!
//! Given decoded audio from two or more devices that captured the same event,
//! this crate measures how far each recording is shifted relative to a chosen
//! reference so the videos can be placed on one timeline.
//!
//! The crate has no decoding or UI dependencies. Extraction of PCM samples is
//! left to the caller through the [`alignment::SampleSource`] seam.

pub mod alignment;
pub mod analysis;
pub mod config;
pub mod logging;

pub use alignment::{
    align, AlignError, AlignStage, Aligner, AlignmentResult, ProgressCallback, RunResult,
    SampleSource, StreamInput, DEFAULT_MIN_CONFIDENCE,
};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
