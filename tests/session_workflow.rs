//! Session Workflow Tests
//!
//! Drives upload → configure → apply → stream end to end with a fake
//! transcoder standing in for ffmpeg.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::{tempdir, TempDir};

use montage::audio::{read_wav, write_wav, AudioBuffer};
use montage::config::Settings;
use montage::pipeline::Transcoder;
use montage::session::{Operation, Session, SessionState, SessionStore};
use montage::{MontageError, Result};

/// Stands in for ffmpeg: extraction writes a stereo tone, muxing copies the
/// processed WAV to the output path and remembers the filter graph
#[derive(Default)]
struct FakeTranscoder {
    fail_extract: bool,
    graphs: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    fn failing() -> Self {
        Self {
            fail_extract: true,
            ..Default::default()
        }
    }
}

impl Transcoder for FakeTranscoder {
    fn extract_audio(&self, _video: &Path, wav: &Path, sample_rate: u32) -> Result<()> {
        if self.fail_extract {
            return Err(MontageError::Extraction {
                stderr: "Output file #0 does not contain any stream".to_string(),
            });
        }
        let left: Vec<f32> = (0..9600)
            .map(|n| 0.9 * (2.0 * std::f32::consts::PI * 220.0 * n as f32 / sample_rate as f32).sin())
            .collect();
        let right: Vec<f32> = left.iter().map(|s| 0.5 * s).collect();
        write_wav(wav, &AudioBuffer::from_channels(vec![left, right], sample_rate)?)
    }

    fn mux(&self, _video: &Path, audio_wav: &Path, output: &Path, graph: &str) -> Result<()> {
        self.graphs.lock().unwrap().push(graph.to_string());
        fs::copy(audio_wav, output)?;
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    settings: Settings,
    source: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let settings = Settings::with_workspace(dir.path().join("workspace"));
    let source = dir.path().join("holiday.mp4");
    fs::write(&source, b"\x00\x00\x00\x18ftypmp42").unwrap();
    Fixture {
        _dir: dir,
        settings,
        source,
    }
}

fn scenario_config() -> serde_json::Value {
    json!({
        "audio": [{"name": "gainCompressor", "params": {"threshold": 0.2, "ratio": 4.0}}],
        "video": [{"name": "grayscale"}]
    })
}

// === State Machine Tests ===

#[test]
fn test_empty_session_only_accepts_upload() {
    let fx = fixture();
    let transcoder = FakeTranscoder::default();
    let mut session = Session::new();

    assert!(session.configure(&scenario_config()).is_err());
    assert!(session.apply(&fx.settings, &transcoder).is_err());
    assert!(session.delete().is_err());
    assert!(session.stream().is_err());
    assert_eq!(session.state, SessionState::Empty);

    session.upload(&fx.settings, &fx.source).unwrap();
    assert_eq!(session.state, SessionState::Uploaded);
}

#[test]
fn test_rejections_are_validation_errors() {
    let fx = fixture();
    let mut session = Session::new();

    let err = session.apply(&fx.settings, &FakeTranscoder::default()).unwrap_err();
    assert!(err.is_validation());
    assert!(err.recovery_suggestion().is_some());
    assert!(matches!(
        err,
        MontageError::InvalidTransition {
            operation: "apply",
            ..
        }
    ));
}

// === Scenario Tests ===

#[test]
fn test_upload_configure_apply_stream() {
    let fx = fixture();
    let transcoder = FakeTranscoder::default();
    let mut session = Session::new();

    let stored = session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();
    assert_eq!(session.state, SessionState::Configured);

    let report = session.apply(&fx.settings, &transcoder).unwrap();

    assert_eq!(session.state, SessionState::Processed);
    assert!(!stored.exists(), "input must be removed after processing");
    assert_eq!(report.filter_graph, "hue=s=0");
    assert_eq!(*transcoder.graphs.lock().unwrap(), vec!["hue=s=0".to_string()]);

    let output = session.stream().unwrap();
    assert_eq!(output, fx.settings.processed_dir().join("output.mp4"));

    // The fake mux copied the processed audio: compressed, peak at most 1.
    let processed = read_wav(output).unwrap();
    assert_eq!(processed.num_channels(), 2);
    assert!(processed.peak() <= 1.0);
    assert!(processed.peak() < 0.9);
}

#[test]
fn test_unknown_audio_filter_keeps_uploaded() {
    let fx = fixture();
    let mut session = Session::new();
    session.upload(&fx.settings, &fx.source).unwrap();

    let err = session
        .configure(&json!({"audio": [{"name": "reverb"}], "video": []}))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Unknown audio filter: reverb");
    assert_eq!(session.state, SessionState::Uploaded);
    assert!(session.config.is_none());
}

#[test]
fn test_failed_apply_stays_configured_and_can_retry() {
    let fx = fixture();
    let mut session = Session::new();
    let stored = session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();

    let err = session
        .apply(&fx.settings, &FakeTranscoder::failing())
        .unwrap_err();

    assert!(!err.is_validation());
    assert_eq!(err.error_code(), "EXTRACTION_FAILED");
    assert_eq!(session.state, SessionState::Configured);
    assert!(stored.exists(), "input must survive a failed apply");
    assert!(session.output_path.is_none());

    session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap();
    assert_eq!(session.state, SessionState::Processed);
}

#[test]
fn test_new_upload_after_processing_starts_over() {
    let fx = fixture();
    let mut session = Session::new();
    session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();
    session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap();
    let old_output = fx.settings.processed_dir().join("output.mp4");
    assert!(old_output.exists());

    session.upload(&fx.settings, &fx.source).unwrap();

    assert_eq!(session.state, SessionState::Uploaded);
    assert!(session.config.is_none());
    assert!(session.output_path.is_none());
    assert!(!old_output.exists());
    assert!(session.stream().is_err());
}

#[test]
fn test_reupload_of_processed_output_keeps_its_bytes() {
    let fx = fixture();
    let mut session = Session::new();
    session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();
    session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap();
    let output = fx.settings.processed_dir().join("output.mp4");
    let processed = fs::read(&output).unwrap();

    let stored = session.upload(&fx.settings, &output).unwrap();

    assert_eq!(session.state, SessionState::Uploaded);
    assert_eq!(stored, fx.settings.upload_dir().join("output.mp4"));
    assert_eq!(fs::read(&stored).unwrap(), processed);
    assert!(session.output_path.is_none());
}

#[test]
fn test_filter_design_failure_during_apply_is_execution_error() {
    let mut fx = fixture();
    // Nyquist 300 Hz collapses the voice band.
    fx.settings.extract_sample_rate = 600;
    let mut session = Session::new();
    let stored = session.upload(&fx.settings, &fx.source).unwrap();
    session
        .configure(&json!({"audio": [{"name": "voiceEnhancement"}], "video": []}))
        .unwrap();

    let err = session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap_err();

    assert_eq!(err.error_code(), "FILTER_DESIGN");
    assert!(!err.is_validation());
    assert!(err.recovery_suggestion().is_some());
    assert_eq!(session.state, SessionState::Configured);
    assert!(stored.exists());
}

#[test]
fn test_stream_missing_output_is_execution_error() {
    let fx = fixture();
    let mut session = Session::new();
    session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();
    session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap();

    fs::remove_file(fx.settings.processed_dir().join("output.mp4")).unwrap();

    let err = session.stream().unwrap_err();
    assert_eq!(err.error_code(), "ASSET_MISSING");
}

#[test]
fn test_apply_with_vanished_input() {
    let fx = fixture();
    let mut session = Session::new();
    let stored = session.upload(&fx.settings, &fx.source).unwrap();
    session.configure(&scenario_config()).unwrap();
    fs::remove_file(stored).unwrap();

    let err = session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap_err();
    assert!(matches!(err, MontageError::AssetMissing { .. }));
    assert_eq!(session.state, SessionState::Configured);
}

// === Persistence Tests ===

#[test]
fn test_workflow_survives_reload() {
    let fx = fixture();
    let store = SessionStore::new(&fx.settings.workspace);

    let mut session = store.load().unwrap();
    session.upload(&fx.settings, &fx.source).unwrap();
    store.save(&session).unwrap();

    let mut session = store.load().unwrap();
    session.configure(&scenario_config()).unwrap();
    store.save(&session).unwrap();

    let mut session = store.load().unwrap();
    session
        .apply(&fx.settings, &FakeTranscoder::default())
        .unwrap();
    store.save(&session).unwrap();

    let session = store.load().unwrap();
    assert_eq!(session.state, SessionState::Processed);
    assert_eq!(session.status().next, vec![Operation::Upload.as_str(), "stream"]);
    assert!(session.stream().is_ok());
}
