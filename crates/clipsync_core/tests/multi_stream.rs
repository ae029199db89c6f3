//! End-to-end runs through the public API.

use std::fs;

use chrono::{TimeZone, Utc};
use clipsync_core::analysis::{cross_correlate, find_peak_offset};
use clipsync_core::config::ConfigManager;
use clipsync_core::{align, Aligner, RunResult, StreamInput, DEFAULT_MIN_CONFIDENCE};
use tempfile::tempdir;

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

/// Three 1 s clips at 1 kHz cut from one recording. The second starts 50
/// samples earlier than the reference, the third 30 samples later.
fn three_cameras() -> Vec<StreamInput> {
    let shared = noise(1200, 42);
    vec![
        StreamInput::new("cam-1", shared[100..1100].to_vec(), 1000),
        StreamInput::new("cam-2", shared[50..1050].to_vec(), 1000),
        StreamInput::new("cam-3", shared[130..1130].to_vec(), 1000),
    ]
}

fn offsets(run: &RunResult) -> Vec<i64> {
    run.results.iter().map(|r| r.offset_samples).collect()
}

#[test]
fn three_streams_align_to_reference() {
    let run = align(&three_cameras(), 0, DEFAULT_MIN_CONFIDENCE);

    assert!(run.success, "{:?}", run.error);
    assert!(run.error.is_none());
    assert_eq!(run.reference_id, "cam-1");
    assert_eq!(run.sample_rate, 1000);

    let expected = [0i64, 50, -30];
    for (result, want) in run.results.iter().zip(expected) {
        assert!(
            (result.offset_samples - want).abs() <= 1,
            "{}: got {}, want {}",
            result.id,
            result.offset_samples,
            want
        );
    }
    assert!(run.results[1].confidence > 0.9);
    assert!(run.results[2].confidence > 0.9);
    assert!((run.results[1].offset_seconds - 0.05).abs() < 1e-9);
    assert!((run.results[2].offset_ms() + 30.0).abs() < 1e-6);
}

#[test]
fn gain_and_dc_do_not_move_offsets() {
    let mut streams = three_cameras();
    streams[1].samples = streams[1].samples.iter().map(|s| 0.25 * s + 0.1).collect();

    let run = Aligner::new().align(&streams);
    assert!(run.success);
    assert_eq!(offsets(&run), vec![0, 50, -30]);
}

#[test]
fn corrected_start_times_follow_reference_clock() {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap();
    let mut streams = three_cameras();
    streams[0] = streams[0].clone().with_start_time(start);

    let run = Aligner::new().align(&streams);
    let times: Vec<_> = run
        .results
        .iter()
        .map(|r| r.corrected_start_time.unwrap())
        .collect();

    assert_eq!(times[0], start);
    assert_eq!(times[1], start - chrono::TimeDelta::milliseconds(50));
    assert_eq!(times[2], start + chrono::TimeDelta::milliseconds(30));
}

#[test]
fn delayed_copy_reports_positive_lag() {
    let a = [1.0, 3.0, -2.0, 0.5, 4.0, -1.0, 2.0, 0.0];
    let mut b = [0.0; 8];
    b[2..].copy_from_slice(&a[..6]);

    let correlation = cross_correlate(&b, &a).unwrap();
    assert_eq!(find_peak_offset(&correlation, b.len()), 2);
}

#[test]
fn single_stream_with_reference_one_is_rejected() {
    let streams = vec![StreamInput::new("solo", noise(100, 1), 1000)];
    let run = align(&streams, 1, DEFAULT_MIN_CONFIDENCE);

    assert!(!run.success);
    assert!(run.results.is_empty());
    assert!(!run.error.unwrap_or_default().is_empty());
}

#[test]
fn config_file_drives_the_aligner() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clipsync.toml");
    fs::write(
        &path,
        "[alignment]\nreference_index = 1\nmin_confidence = 0.5\nparallel = true\n",
    )
    .unwrap();

    let mut config = ConfigManager::new(&path);
    config.load().unwrap();
    let run = Aligner::from_settings(&config.settings().alignment).align(&three_cameras());

    assert!(run.success);
    assert_eq!(run.reference_id, "cam-2");
    assert_eq!(offsets(&run), vec![-50, 0, -80]);
}

#[test]
fn run_result_serializes_for_reports() {
    let run = align(&three_cameras(), 0, DEFAULT_MIN_CONFIDENCE);
    let json = run.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["results"][1]["id"], "cam-2");
    assert_eq!(value["results"][1]["offset_samples"], 50);
    assert!(value["results"][0].get("corrected_start_time").is_none());
}
