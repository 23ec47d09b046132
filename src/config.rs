//! Runtime settings
//!
//! Loaded from an optional JSON file; every field has a default, and a few
//! can be overridden from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable overriding [`Settings::ffmpeg_path`]
pub const FFMPEG_ENV: &str = "MONTAGE_FFMPEG";

/// Upload subdirectory name
pub const UPLOAD_DIR: &str = "uploads";
/// Processed output subdirectory name
pub const PROCESSED_DIR: &str = "processed";
/// Scratch subdirectory name
pub const TMP_DIR: &str = "tmp";
/// Persisted session file name
pub const SESSION_FILE: &str = "session.json";
/// Name of the final processed asset
pub const OUTPUT_FILE: &str = "output.mp4";

/// Encoder settings for the final mux
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderPreset {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Move the index to the front of the file for progressive playback
    pub faststart: bool,
}

impl Default for EncoderPreset {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            faststart: true,
        }
    }
}

/// Montage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root holding uploads/, processed/, tmp/ and session.json
    pub workspace: PathBuf,
    /// Transcoder binary
    pub ffmpeg_path: PathBuf,
    /// Sample rate audio is extracted at
    pub extract_sample_rate: u32,
    /// Accepted upload extensions, lowercase with leading dot
    pub allowed_extensions: Vec<String>,
    /// Characters of transcoder stderr kept in error messages
    pub stderr_tail: usize,
    pub encoder: EncoderPreset,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("montage-data"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            extract_sample_rate: 48000,
            allowed_extensions: [".mp4", ".mov", ".mkv", ".webm", ".avi"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stderr_tail: 4000,
            encoder: EncoderPreset::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (if given), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => {
                debug!("Loading settings from {}", p.display());
                let text = fs::read_to_string(p)?;
                serde_json::from_str(&text)?
            }
            None => Settings::default(),
        };

        if let Some(ffmpeg) = std::env::var_os(FFMPEG_ENV) {
            settings.ffmpeg_path = PathBuf::from(ffmpeg);
        }

        Ok(settings)
    }

    /// Default settings rooted at `workspace`
    pub fn with_workspace(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Default::default()
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.workspace.join(UPLOAD_DIR)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.workspace.join(PROCESSED_DIR)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.workspace.join(TMP_DIR)
    }

    pub fn session_file(&self) -> PathBuf {
        self.workspace.join(SESSION_FILE)
    }

    /// Whether an upload with this file name is accepted
    pub fn accepts_upload(&self, file_name: &Path) -> bool {
        upload_extension(file_name)
            .map(|ext| self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }
}

/// Lowercased extension with leading dot, e.g. `.mp4`
pub fn upload_extension(file_name: &Path) -> Option<String> {
    file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
}
