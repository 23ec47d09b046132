//! CLI Command Implementations
//!
//! Each command loads the workspace session, performs one operation and
//! writes the session back.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde_json::Value;

use crate::config::Settings;
use crate::filters::{FilterChainConfig, AUDIO_FILTER_NAMES, VIDEO_FILTER_NAMES};
use crate::pipeline::{process_audio_file, FfmpegTranscoder};
use crate::session::{Session, SessionStore};

/// Settings plus the session file of one workspace
#[derive(Debug)]
pub struct Workspace {
    pub settings: Settings,
    store: SessionStore,
}

impl Workspace {
    /// Resolve settings; `--workspace` wins over the settings file
    pub fn open(workspace: Option<&Path>, config: Option<&Path>) -> Result<Self> {
        let mut settings = Settings::load(config).with_context(|| match config {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to load settings".to_string(),
        })?;
        if let Some(dir) = workspace {
            settings.workspace = dir.to_path_buf();
        }

        let store = SessionStore::new(&settings.workspace);
        Ok(Self { settings, store })
    }

    fn load_session(&self) -> Result<Session> {
        self.store.load().context("Failed to load session")
    }

    /// Run `op` on the stored session, saving it on success or when a
    /// failed operation still changed it
    fn with_session<R>(
        &self,
        op: impl FnOnce(&mut Session, &Settings) -> crate::Result<R>,
    ) -> Result<R> {
        let mut session = self.load_session()?;
        let before = session.clone();
        let outcome = op(&mut session, &self.settings);
        if outcome.is_ok() || session != before {
            self.store.save(&session).context("Failed to save session")?;
        }
        Ok(outcome?)
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Upload a video.
pub fn upload(ws: &Workspace, file: &Path) -> Result<()> {
    info!("Uploading {}", file.display());

    let stored = ws.with_session(|session, settings| session.upload(settings, file))?;
    println!("Uploaded: {}", stored.display());

    Ok(())
}

/// Store a filter configuration.
pub fn configure(ws: &Workspace, payload: &Path) -> Result<()> {
    info!("Configuring from {}", payload.display());

    let payload = read_json(payload)?;
    let config = ws.with_session(|session, _| session.configure(&payload).cloned())?;

    println!("Configured:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

/// Process the uploaded video.
pub fn apply(ws: &Workspace) -> Result<()> {
    info!("Applying filters");

    let transcoder = FfmpegTranscoder::from_settings(&ws.settings);
    let report = ws.with_session(|session, settings| session.apply(settings, &transcoder))?;

    println!("Processed: {}", report.output.display());
    println!(
        "Audio: {} filter(s), {} ch @ {} Hz, {} frames",
        report.audio_steps, report.channels, report.sample_rate, report.frames
    );
    if !report.filter_graph.is_empty() {
        println!("Video graph: {}", report.filter_graph);
    }

    Ok(())
}

/// Delete the uploaded video.
pub fn delete(ws: &Workspace) -> Result<()> {
    info!("Deleting upload");

    ws.with_session(|session, _| session.delete())?;
    println!("Deleted");

    Ok(())
}

/// Copy the processed video to `out`.
pub fn stream(ws: &Workspace, out: &Path) -> Result<()> {
    info!("Streaming to {}", out.display());

    let source = ws.with_session(|session, _| session.stream().map(Path::to_path_buf))?;
    let bytes = fs::copy(&source, out)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), out.display()))?;
    println!("Wrote {} ({} bytes)", out.display(), bytes);

    Ok(())
}

/// Print the session.
pub fn status(ws: &Workspace) -> Result<()> {
    let session = ws.load_session()?;
    println!("{}", serde_json::to_string_pretty(&session.status())?);
    Ok(())
}

/// List the registered filters.
pub fn filters() -> Result<()> {
    println!("Audio filters:");
    for name in AUDIO_FILTER_NAMES {
        println!("  {}", name);
    }
    println!("Video filters:");
    for name in VIDEO_FILTER_NAMES {
        println!("  {}", name);
    }
    Ok(())
}

/// Run the audio chain of `payload` over a WAV file.
pub fn process_audio(input: &Path, output: &Path, payload: &Path) -> Result<()> {
    info!("Processing {} -> {}", input.display(), output.display());

    let config = FilterChainConfig::from_value(&read_json(payload)?)?;
    let chain = config.resolve()?;
    let processed = process_audio_file(input, output, &chain.audio)?;

    println!(
        "Wrote {} ({} ch, {:.2}s, peak {:.3})",
        output.display(),
        processed.num_channels(),
        processed.duration_secs(),
        processed.peak()
    );

    Ok(())
}
