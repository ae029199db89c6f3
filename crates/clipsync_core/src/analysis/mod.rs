//! Numeric alignment engine.
//!
//! Pure functions that the aligner composes for every stream pair:
//!
//! 1. **Filtering** (`filtering`): optional Butterworth pre-filter.
//! 2. **Preprocessing** (`preprocess`): DC removal and peak normalization.
//! 3. **Transform** (`transform`): radix-2 discrete Fourier transform.
//! 4. **Correlation** (`correlation`): linear cross-correlation via the
//!    correlation theorem.
//! 5. **Peak resolution** (`peak`): dominant lag with sign resolution.
//! 6. **Confidence** (`confidence`): normalized peak score.
//!
//! # Usage
//!
//! ```
//! use clipsync_core::analysis::{
//!     calculate_confidence, cross_correlate, find_peak_offset, preprocess,
//! };
//!
//! let reference = preprocess(&[0.0, 1.0, 0.5, -0.5, -1.0, 0.0, 0.0, 0.0]);
//! let other = preprocess(&[0.0, 0.0, 0.0, 1.0, 0.5, -0.5, -1.0, 0.0]);
//!
//! // `other` is `reference` delayed by two samples
//! let corr = cross_correlate(&other, &reference).unwrap();
//! let offset = find_peak_offset(&corr, reference.len());
//! let confidence = calculate_confidence(&other, &reference, &corr, offset);
//! assert_eq!(offset, 2);
//! assert!(confidence > 0.5);
//! ```

mod confidence;
mod correlation;
pub mod filtering;
mod peak;
mod preprocess;
mod transform;
pub mod types;

pub use types::{AnalysisError, AnalysisResult};

pub use confidence::{calculate_confidence, signal_energy};
pub use correlation::{correlation_length, cross_correlate};
pub use filtering::{FilterConfig, FilterType};
pub use peak::{circular_index_to_lag, find_peak_offset, lag_to_circular_index};
pub use preprocess::preprocess;
pub use transform::{
    inverse_transform, is_power_of_two, next_power_of_two, transform, transform_real,
};
