//! Multi-stream aligner.
//!
//! Orchestrates the analysis pipeline for a whole run:
//! 1. Validate the stream set (count, reference index, sample rates)
//! 2. Filter and preprocess every stream once, up front
//! 3. Correlate each non-reference stream against the reference
//! 4. Convert lags to seconds and corrected start times
//! 5. Apply the success policy
//!
//! Failures never escape as errors. Every outcome is a [`RunResult`].

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::analysis::{
    calculate_confidence, cross_correlate, find_peak_offset, preprocess, AnalysisResult,
    FilterConfig,
};
use crate::config::AlignmentSettings;

use super::errors::{AlignError, AlignResult};
use super::source::SampleSource;
use super::types::{AlignStage, AlignmentResult, ProgressCallback, RunResult, StreamInput};

/// Default minimum confidence for a run to count as successful.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Offset and confidence for one stream pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMeasurement {
    /// Positive when `other` lags `reference`.
    pub offset_samples: i64,
    pub confidence: f64,
}

/// Measure how far `other` lags `reference`.
///
/// Both sequences should already be preprocessed.
pub fn measure_offset(reference: &[f64], other: &[f64]) -> AnalysisResult<PairMeasurement> {
    let correlation = cross_correlate(other, reference)?;
    let offset_samples = find_peak_offset(&correlation, reference.len());
    let confidence = calculate_confidence(other, reference, &correlation, offset_samples);

    Ok(PairMeasurement {
        offset_samples,
        confidence,
    })
}

/// Align streams with default options.
///
/// Convenience wrapper around [`Aligner`].
pub fn align(streams: &[StreamInput], reference_index: usize, min_confidence: f64) -> RunResult {
    Aligner::new()
        .with_reference_index(reference_index)
        .with_min_confidence(min_confidence)
        .align(streams)
}

/// Aligns several recordings of the same event to one reference timeline.
pub struct Aligner {
    /// Index of the reference stream.
    reference_index: usize,
    /// Minimum per-stream confidence for a successful run.
    min_confidence: f64,
    /// Pre-correlation filter.
    filter: FilterConfig,
    /// Correlate stream pairs on the rayon pool.
    parallel: bool,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Aligner {
    /// Create an aligner with default settings.
    pub fn new() -> Self {
        Self {
            reference_index: 0,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            filter: FilterConfig::default(),
            parallel: false,
            progress_callback: None,
        }
    }

    /// Create an aligner from settings.
    pub fn from_settings(settings: &AlignmentSettings) -> Self {
        Self {
            reference_index: settings.reference_index,
            min_confidence: settings.min_confidence,
            filter: settings.filter_config(),
            parallel: settings.parallel,
            progress_callback: None,
        }
    }

    /// Set the reference stream index.
    pub fn with_reference_index(mut self, index: usize) -> Self {
        self.reference_index = index;
        self
    }

    /// Set the success threshold.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Set the pre-correlation filter.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Correlate pairs in parallel.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn reference_index(&self) -> usize {
        self.reference_index
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    fn report_progress(&self, stage: AlignStage, fraction: f64) {
        if let Some(ref callback) = self.progress_callback {
            callback(stage, fraction.clamp(0.0, 1.0));
        }
    }

    /// Acquire samples from each source, then align them.
    ///
    /// Sources are extracted sequentially, in order, before any correlation
    /// starts. An extraction error ends the run with a failed result.
    pub fn align_sources(&self, sources: &[&dyn SampleSource]) -> RunResult {
        let reference_id = sources
            .get(self.reference_index)
            .map(|s| s.id().to_string())
            .unwrap_or_default();

        if let Err(e) = self.check_layout(sources.len()) {
            tracing::warn!("Alignment rejected: {}", e);
            return RunResult::failure(reference_id, self.reference_index, 0, e.to_string());
        }

        let total = sources.len();
        let mut streams = Vec::with_capacity(total);

        for (idx, source) in sources.iter().enumerate() {
            tracing::debug!("Extracting samples for '{}'", source.id());

            match source.extract() {
                Ok(stream) => streams.push(stream),
                Err(e) => {
                    let err = AlignError::acquisition(source.id(), e);
                    tracing::warn!("{}", err);
                    return RunResult::failure(
                        reference_id,
                        self.reference_index,
                        0,
                        err.to_string(),
                    );
                }
            }

            self.report_progress(AlignStage::Extracting, (idx + 1) as f64 / total as f64);
        }

        self.align(&streams)
    }

    /// Align already-decoded streams against the reference stream.
    pub fn align(&self, streams: &[StreamInput]) -> RunResult {
        match self.run(streams) {
            Ok(result) => result,
            Err(e) => {
                if e.is_configuration() {
                    tracing::warn!("Alignment rejected: {}", e);
                } else {
                    tracing::error!("Alignment failed: {}", e);
                }

                let reference = streams.get(self.reference_index);
                RunResult::failure(
                    reference.map(|s| s.id.clone()).unwrap_or_default(),
                    self.reference_index,
                    reference.map(|s| s.sample_rate).unwrap_or(0),
                    e.to_string(),
                )
            }
        }
    }

    fn check_layout(&self, count: usize) -> AlignResult<()> {
        if count < 2 {
            return Err(AlignError::TooFewStreams { count });
        }
        if self.reference_index >= count {
            return Err(AlignError::ReferenceOutOfRange {
                index: self.reference_index,
                count,
            });
        }
        Ok(())
    }

    fn validate(&self, streams: &[StreamInput]) -> AlignResult<()> {
        self.check_layout(streams.len())?;

        let expected = streams[self.reference_index].sample_rate;
        for stream in streams {
            if stream.samples.is_empty() {
                return Err(AlignError::EmptyStream {
                    id: stream.id.clone(),
                });
            }
            if stream.sample_rate == 0 {
                return Err(AlignError::ZeroSampleRate {
                    id: stream.id.clone(),
                });
            }
            if stream.sample_rate != expected {
                return Err(AlignError::SampleRateMismatch {
                    id: stream.id.clone(),
                    expected,
                    found: stream.sample_rate,
                });
            }
        }
        Ok(())
    }

    /// Filter (if configured) and preprocess one stream.
    fn prepare(&self, stream: &StreamInput) -> AlignResult<Vec<f64>> {
        if !self.filter.is_active() {
            return Ok(preprocess(&stream.samples));
        }

        let filtered = self
            .filter
            .apply(&stream.samples, stream.sample_rate)
            .map_err(|e| AlignError::Filter {
                id: stream.id.clone(),
                source: e,
            })?;
        Ok(preprocess(&filtered))
    }

    fn run(&self, streams: &[StreamInput]) -> AlignResult<RunResult> {
        self.validate(streams)?;

        let reference = &streams[self.reference_index];
        let sample_rate = reference.sample_rate;

        tracing::info!(
            "Aligning {} streams against '{}' ({} Hz, filter: {})",
            streams.len(),
            reference.id,
            sample_rate,
            self.filter.filter_type
        );

        let prepared = streams
            .iter()
            .map(|s| self.prepare(s))
            .collect::<AlignResult<Vec<_>>>()?;
        let reference_samples = &prepared[self.reference_index];

        let others: Vec<usize> = (0..streams.len())
            .filter(|&i| i != self.reference_index)
            .collect();
        let total = others.len();
        let completed = AtomicUsize::new(0);

        let measure = |idx: usize| -> AlignResult<PairMeasurement> {
            let measurement = measure_offset(reference_samples, &prepared[idx])?;

            tracing::debug!(
                "'{}' vs '{}': offset={} samples, confidence={:.3}",
                streams[idx].id,
                reference.id,
                measurement.offset_samples,
                measurement.confidence
            );

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            self.report_progress(AlignStage::Correlating, done as f64 / total as f64);
            Ok(measurement)
        };

        let measurements: Vec<PairMeasurement> = if self.parallel {
            others
                .par_iter()
                .map(|&idx| measure(idx))
                .collect::<AlignResult<Vec<_>>>()?
        } else {
            others
                .iter()
                .map(|&idx| measure(idx))
                .collect::<AlignResult<Vec<_>>>()?
        };

        let mut measured = measurements.into_iter();
        let results: Vec<AlignmentResult> = streams
            .iter()
            .enumerate()
            .map(|(idx, stream)| {
                if idx == self.reference_index {
                    return AlignmentResult::reference(
                        stream.id.clone(),
                        reference.original_start_time,
                    );
                }
                // One measurement per non-reference stream, in the same order
                let m = measured.next().unwrap_or(PairMeasurement {
                    offset_samples: 0,
                    confidence: 0.0,
                });
                AlignmentResult::measured(
                    stream.id.clone(),
                    m.offset_samples,
                    sample_rate,
                    m.confidence,
                    reference.original_start_time,
                )
            })
            .collect();

        Ok(self.apply_policy(reference.id.clone(), sample_rate, results))
    }

    fn apply_policy(
        &self,
        reference_id: String,
        sample_rate: u32,
        results: Vec<AlignmentResult>,
    ) -> RunResult {
        let weak: Vec<String> = results
            .iter()
            .enumerate()
            .filter(|(idx, r)| *idx != self.reference_index && !r.passes(self.min_confidence))
            .map(|(_, r)| format!("'{}' ({:.3})", r.id, r.confidence))
            .collect();

        for r in &results {
            tracing::info!(
                "{}: offset={:+.3}s ({} samples), confidence={:.3}",
                r.id,
                r.offset_seconds,
                r.offset_samples,
                r.confidence
            );
        }

        let error = if weak.is_empty() {
            None
        } else {
            let message = format!(
                "Confidence below {:.2} for {}",
                self.min_confidence,
                weak.join(", ")
            );
            tracing::warn!("{}", message);
            Some(message)
        };

        RunResult {
            reference_id,
            reference_index: self.reference_index,
            results,
            sample_rate,
            success: error.is_none(),
            error,
        }
    }
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};

    /// Deterministic white-ish noise in [-1, 1].
    fn noise(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
            })
            .collect()
    }

    /// Window of `base` starting at `start`, `len` samples long.
    fn window(base: &[f64], start: usize, len: usize) -> Vec<f64> {
        base[start..start + len].to_vec()
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn id(&self) -> &str {
            "corrupt.mov"
        }

        fn extract(&self) -> AnalysisResult<StreamInput> {
            Err(AnalysisError::Extraction("invalid data found".to_string()))
        }
    }

    #[test]
    fn measure_offset_detects_lag_and_lead() {
        let base = noise(600, 7);
        let reference = preprocess(&window(&base, 100, 400));
        let late = preprocess(&window(&base, 80, 400));
        let early = preprocess(&window(&base, 125, 400));

        assert_eq!(measure_offset(&reference, &late).unwrap().offset_samples, 20);
        assert_eq!(measure_offset(&reference, &early).unwrap().offset_samples, -25);
    }

    #[test]
    fn too_few_streams_fails() {
        let streams = vec![StreamInput::new("only", vec![0.1; 10], 1000)];
        let run = align(&streams, 0, DEFAULT_MIN_CONFIDENCE);

        assert!(!run.success);
        assert!(run.results.is_empty());
        assert!(!run.error.unwrap_or_default().is_empty());
    }

    #[test]
    fn no_streams_fails() {
        let run = Aligner::new().align(&[]);
        assert!(!run.success);
        assert!(run.results.is_empty());
        assert!(run.error.is_some());
    }

    #[test]
    fn reference_out_of_range_fails() {
        let streams = vec![StreamInput::new("only", vec![0.1; 10], 1000)];
        let run = align(&streams, 1, DEFAULT_MIN_CONFIDENCE);
        assert!(!run.success);
        assert!(run.results.is_empty());

        let streams = vec![
            StreamInput::new("a", noise(64, 1), 1000),
            StreamInput::new("b", noise(64, 2), 1000),
        ];
        let run = align(&streams, 2, DEFAULT_MIN_CONFIDENCE);
        assert!(!run.success);
        assert!(run.error.unwrap().contains("out of range"));
    }

    #[test]
    fn empty_stream_fails() {
        let streams = vec![
            StreamInput::new("a", noise(64, 1), 1000),
            StreamInput::new("b", Vec::new(), 1000),
        ];
        let run = Aligner::new().align(&streams);
        assert!(!run.success);
        assert!(run.error.unwrap().contains("'b'"));
    }

    #[test]
    fn mismatched_rates_fail() {
        let streams = vec![
            StreamInput::new("a", noise(64, 1), 48000),
            StreamInput::new("b", noise(64, 2), 44100),
        ];
        let run = Aligner::new().align(&streams);
        assert!(!run.success);
        assert_eq!(run.sample_rate, 48000);
        assert!(run.error.unwrap().contains("44100"));
    }

    #[test]
    fn reference_is_reported_at_zero() {
        let base = noise(900, 3);
        let start = Utc.with_ymd_and_hms(2023, 9, 2, 18, 30, 0).unwrap();
        let streams = vec![
            StreamInput::new("a", window(&base, 100, 600), 1000),
            StreamInput::new("b", window(&base, 150, 600), 1000).with_start_time(start),
        ];

        let run = Aligner::new().with_reference_index(1).align(&streams);

        assert!(run.success);
        assert_eq!(run.reference_id, "b");
        assert_eq!(run.reference_index, 1);
        assert_eq!(run.results[1], AlignmentResult::reference("b", Some(start)));
        // a starts 50 samples earlier in the shared signal, so it lags b
        assert_eq!(run.results[0].offset_samples, 50);
        assert_eq!(
            run.results[0].corrected_start_time,
            Some(start - chrono::TimeDelta::milliseconds(50))
        );
    }

    #[test]
    fn no_reference_start_means_no_corrected_times() {
        let base = noise(700, 4);
        let other_start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let streams = vec![
            StreamInput::new("a", window(&base, 50, 500), 1000),
            StreamInput::new("b", window(&base, 60, 500), 1000).with_start_time(other_start),
        ];

        let run = Aligner::new().align(&streams);
        assert!(run.results.iter().all(|r| r.corrected_start_time.is_none()));
    }

    #[test]
    fn low_confidence_keeps_results() {
        crate::logging::init_test_tracing();
        let streams = vec![
            StreamInput::new("a", noise(512, 10), 1000),
            StreamInput::new("b", noise(512, 20), 1000),
        ];

        let run = Aligner::new().with_min_confidence(0.9).align(&streams);

        assert!(!run.success);
        assert_eq!(run.results.len(), 2);
        assert!(run.results[1].confidence < 0.9);
        assert!(run.error.unwrap().contains("'b'"));
    }

    #[test]
    fn threshold_equal_to_confidence_passes() {
        let base = noise(900, 8);
        let streams = vec![
            StreamInput::new("a", window(&base, 100, 600), 1000),
            StreamInput::new("b", window(&base, 130, 600), 1000),
        ];

        let measured = Aligner::new().align(&streams).results[1].confidence;
        let run = Aligner::new().with_min_confidence(measured).align(&streams);

        assert!(run.success, "{:?}", run.error);
        assert!(run.error.is_none());
    }

    #[test]
    fn nan_sample_fails_the_run() {
        let base = noise(700, 9);
        let mut corrupted = window(&base, 60, 500);
        corrupted[10] = f64::NAN;
        let streams = vec![
            StreamInput::new("a", window(&base, 50, 500), 1000),
            StreamInput::new("b", corrupted, 1000),
        ];

        let run = align(&streams, 0, DEFAULT_MIN_CONFIDENCE);

        assert!(!run.success);
        assert_eq!(run.results.len(), 2);
        assert!(run.results[1].confidence.is_nan());
        assert!(run.error.unwrap().contains("'b'"));
    }

    #[test]
    fn nan_threshold_fails_the_run() {
        let base = noise(700, 10);
        let streams = vec![
            StreamInput::new("a", window(&base, 50, 500), 1000),
            StreamInput::new("b", window(&base, 70, 500), 1000),
        ];

        let run = align(&streams, 0, f64::NAN);
        assert!(!run.success);
        assert!(run.error.is_some());
    }

    #[test]
    fn silent_stream_scores_zero() {
        let streams = vec![
            StreamInput::new("a", noise(256, 5), 1000),
            StreamInput::new("silent", vec![0.0; 256], 1000),
        ];

        let run = Aligner::new().align(&streams);
        assert!(!run.success);
        assert_eq!(run.results[1].confidence, 0.0);
        assert_eq!(run.results[1].offset_samples, 0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let base = noise(1400, 11);
        let streams = vec![
            StreamInput::new("a", window(&base, 200, 800), 1000),
            StreamInput::new("b", window(&base, 170, 800), 1000),
            StreamInput::new("c", window(&base, 240, 800), 1000),
            StreamInput::new("d", window(&base, 200, 800), 1000),
        ];

        let sequential = Aligner::new().align(&streams);
        let parallel = Aligner::new().with_parallel(true).align(&streams);

        assert_eq!(sequential, parallel);
        let offsets: Vec<i64> = parallel.results.iter().map(|r| r.offset_samples).collect();
        assert_eq!(offsets, vec![0, 30, -40, 0]);
    }

    #[test]
    fn progress_reports_each_stage() {
        let base = noise(800, 12);
        let events: Arc<Mutex<Vec<(AlignStage, f64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let a = StreamInput::new("a", window(&base, 100, 500), 1000);
        let b = StreamInput::new("b", window(&base, 90, 500), 1000);
        let c = StreamInput::new("c", window(&base, 110, 500), 1000);

        let aligner = Aligner::new().with_progress_callback(Box::new(move |stage, fraction| {
            sink.lock().unwrap().push((stage, fraction));
        }));
        let run = aligner.align_sources(&[&a, &b, &c]);
        assert!(run.success);

        let events = events.lock().unwrap();
        let extracting: Vec<f64> = events
            .iter()
            .filter(|(s, _)| *s == AlignStage::Extracting)
            .map(|(_, f)| *f)
            .collect();
        let correlating: Vec<f64> = events
            .iter()
            .filter(|(s, _)| *s == AlignStage::Correlating)
            .map(|(_, f)| *f)
            .collect();

        assert_eq!(extracting.len(), 3);
        assert_eq!(extracting.last(), Some(&1.0));
        assert_eq!(correlating, vec![0.5, 1.0]);
    }

    #[test]
    fn extraction_failure_becomes_failed_run() {
        let good = StreamInput::new("good", noise(128, 1), 1000);
        let run = Aligner::new().align_sources(&[&good, &FailingSource]);

        assert!(!run.success);
        assert!(run.results.is_empty());
        let error = run.error.unwrap();
        assert!(error.contains("corrupt.mov"));
        assert!(error.contains("invalid data found"));
    }

    #[test]
    fn align_sources_checks_layout_before_extracting() {
        let run = Aligner::new().align_sources(&[&FailingSource]);
        assert!(!run.success);
        assert!(run.error.unwrap().contains("At least 2 streams"));
    }

    #[test]
    fn unusable_filter_fails_run() {
        let streams = vec![
            StreamInput::new("a", noise(256, 1), 1000),
            StreamInput::new("b", noise(256, 2), 1000),
        ];

        // 3400 Hz cutoff is above Nyquist at 1 kHz
        let run = Aligner::new()
            .with_filter(FilterConfig::speech_band())
            .align(&streams);
        assert!(!run.success);
        assert!(run.results.is_empty());
        assert!(run.error.unwrap().contains("Pre-filter"));
    }

    #[test]
    fn from_settings_copies_values() {
        let settings = AlignmentSettings {
            reference_index: 2,
            min_confidence: 0.5,
            parallel: true,
            ..Default::default()
        };

        let aligner = Aligner::from_settings(&settings);
        assert_eq!(aligner.reference_index(), 2);
        assert_eq!(aligner.min_confidence(), 0.5);
        assert!(aligner.parallel);
    }
}
