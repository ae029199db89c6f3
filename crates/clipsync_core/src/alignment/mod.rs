//! Multi-stream alignment.
//!
//! Takes decoded audio for two or more recordings, picks one as the
//! reference, and reports every stream's offset from it in samples, seconds
//! and (when the reference carries a wall-clock start) corrected start time.
//!
//! # Example
//!
//! ```
//! use clipsync_core::alignment::{Aligner, StreamInput};
//!
//! let shared: Vec<f64> = (0..1200)
//!     .map(|i| ((i as f64 * 12.9898).sin() * 43758.5453).fract())
//!     .collect();
//! let streams = vec![
//!     StreamInput::new("cam-a", shared[100..1100].to_vec(), 1000),
//!     StreamInput::new("cam-b", shared[60..1060].to_vec(), 1000),
//! ];
//!
//! let run = Aligner::new().align(&streams);
//! assert!(run.success);
//! assert_eq!(run.results[1].offset_samples, 40);
//! ```

mod aligner;
mod errors;
mod source;
mod types;

pub use aligner::{align, measure_offset, Aligner, PairMeasurement, DEFAULT_MIN_CONFIDENCE};
pub use errors::{AlignError, AlignResult};
pub use source::SampleSource;
pub use types::{AlignStage, AlignmentResult, ProgressCallback, RunResult, StreamInput};
