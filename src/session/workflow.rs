//! The session record and its operations
//!
//! Every operation first checks the transition table, so a rejected request
//! performs no side effects. Execution failures leave the session at its
//! last valid state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::{upload_extension, Settings, OUTPUT_FILE};
use crate::error::{MontageError, Result};
use crate::filters::FilterChainConfig;
use crate::pipeline::{Pipeline, PipelineReport, Transcoder};
use crate::session::state::{allowed_operations, transition, Operation, SessionState};

/// One user's workflow over a single uploaded asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub state: SessionState,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub config: Option<FilterChainConfig>,
    /// SHA-256 of the uploaded asset, hex encoded
    pub input_sha256: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serializable view of a session, with the operations it accepts next
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub id: Uuid,
    pub state: SessionState,
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub config: Option<FilterChainConfig>,
    pub input_sha256: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub next: Vec<&'static str>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Fresh session in the `Empty` state
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Empty,
            input_path: None,
            output_path: None,
            config: None,
            input_sha256: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn check(&self, op: Operation) -> Result<SessionState> {
        transition(self.state, op).map_err(|e| {
            warn!("Session {}: rejected {} in state {}", self.id, op, self.state);
            e
        })
    }

    fn enter(&mut self, next: SessionState) {
        info!("Session {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        self.updated_at = Utc::now();
    }

    fn reset(&mut self) {
        self.input_path = None;
        self.output_path = None;
        self.config = None;
        self.input_sha256 = None;
        self.enter(SessionState::Empty);
    }

    /// Store `source` as the session's input asset
    ///
    /// Reads `source` first, then clears every file left in the upload,
    /// processed and scratch directories and writes the bytes into the
    /// upload directory under a sanitized name. A source inside the
    /// workspace (such as the last processed output) therefore survives the
    /// clear. Returns the stored path.
    pub fn upload(&mut self, settings: &Settings, source: &Path) -> Result<PathBuf> {
        let next = self.check(Operation::Upload)?;

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !settings.accepts_upload(Path::new(&file_name)) {
            return Err(MontageError::UnsupportedUpload {
                extension: upload_extension(Path::new(&file_name))
                    .unwrap_or_else(|| "(none)".to_string()),
            });
        }
        if !source.is_file() {
            return Err(MontageError::AssetMissing {
                path: source.to_path_buf(),
            });
        }
        let content = fs::read(source)?;

        for dir in [
            settings.upload_dir(),
            settings.processed_dir(),
            settings.tmp_dir(),
        ] {
            fs::create_dir_all(&dir)?;
            clear_files(&dir)?;
        }

        let stored = settings.upload_dir().join(sanitize_file_name(&file_name));
        if let Err(e) = fs::write(&stored, &content) {
            // Prior artifacts are already gone.
            warn!("Session {}: upload failed: {}", self.id, e);
            self.reset();
            return Err(e.into());
        }

        info!("Session {}: stored {}", self.id, stored.display());
        self.input_path = Some(stored.clone());
        self.output_path = None;
        self.config = None;
        self.input_sha256 = Some(format!("{:x}", Sha256::digest(&content)));
        self.enter(next);
        Ok(stored)
    }

    /// Validate and store a filter chain configuration payload
    pub fn configure(&mut self, payload: &Value) -> Result<&FilterChainConfig> {
        let next = self.check(Operation::Configure)?;

        let config = FilterChainConfig::from_value(payload)?;
        let chain = config.resolve()?;
        info!(
            "Session {}: configured {} audio / {} video filter(s)",
            self.id,
            chain.audio.len(),
            chain.video.len()
        );

        self.enter(next);
        Ok(self.config.insert(config))
    }

    /// Drop the uploaded asset and return to `Empty`
    pub fn delete(&mut self) -> Result<()> {
        self.check(Operation::Delete)?;

        if let Some(input) = &self.input_path {
            remove_if_present(input)?;
        }
        self.reset();
        Ok(())
    }

    /// Run the pipeline over the uploaded asset
    ///
    /// On success the input asset is removed and the session becomes
    /// `Processed`. On failure the session stays `Configured`.
    pub fn apply(
        &mut self,
        settings: &Settings,
        transcoder: &dyn Transcoder,
    ) -> Result<PipelineReport> {
        let next = self.check(Operation::Apply)?;

        let (Some(input), Some(config)) = (self.input_path.clone(), self.config.as_ref()) else {
            return Err(MontageError::transition(Operation::Apply.as_str(), self.state));
        };
        let chain = config.resolve()?;
        let output = settings.processed_dir().join(OUTPUT_FILE);

        let pipeline = Pipeline::new(transcoder, settings.extract_sample_rate);
        let report = match pipeline.run(&input, &output, &chain, &settings.tmp_dir()) {
            Ok(report) => report,
            Err(e) => {
                warn!("Session {}: apply failed: {}", self.id, e);
                return Err(e);
            }
        };

        remove_if_present(&input)?;
        self.output_path = Some(output);
        self.enter(next);
        Ok(report)
    }

    /// Path of the processed asset
    pub fn stream(&self) -> Result<&Path> {
        self.check(Operation::Stream)?;

        match &self.output_path {
            Some(path) if path.is_file() => Ok(path),
            Some(path) => Err(MontageError::AssetMissing { path: path.clone() }),
            None => Err(MontageError::transition(Operation::Stream.as_str(), self.state)),
        }
    }

    /// Snapshot of the session for display
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            id: self.id,
            state: self.state,
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
            config: self.config.clone(),
            input_sha256: self.input_sha256.clone(),
            updated_at: self.updated_at,
            next: allowed_operations(self.state)
                .iter()
                .map(Operation::as_str)
                .collect(),
        }
    }
}

/// Reduce an uploaded file name to a safe ASCII name
///
/// Path separators and anything outside `[A-Za-z0-9._-]` are dropped,
/// whitespace becomes `_`, and leading dots or underscores are stripped.
/// Falls back to `upload<ext>` when nothing usable is left of the stem.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let trimmed = cleaned.trim_start_matches(['.', '_']);

    let ext = upload_extension(Path::new(name));
    if trimmed.is_empty() || upload_extension(Path::new(trimmed)) != ext {
        return format!("upload{}", ext.unwrap_or_default());
    }
    trimmed.to_string()
}

fn clear_files(dir: &Path) -> Result<()> {
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        remove_if_present(entry.path())?;
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
