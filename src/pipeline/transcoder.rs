//! External transcoder
//!
//! Audio extraction and the final mux are delegated to ffmpeg. The
//! [`Transcoder`] trait is the seam; [`FfmpegTranscoder`] is the real thing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::config::{EncoderPreset, Settings};
use crate::error::{MontageError, Result};

/// Extracts audio from, and muxes processed audio back into, a video asset
pub trait Transcoder: Send + Sync {
    /// Decode the first audio stream of `video` into 16-bit PCM WAV at `sample_rate`
    fn extract_audio(&self, video: &Path, wav: &Path, sample_rate: u32) -> Result<()>;

    /// Combine the first video stream of `video` with the first audio stream
    /// of `audio_wav` into `output`, applying `filter_graph` to the video when
    /// it is non-empty
    fn mux(&self, video: &Path, audio_wav: &Path, output: &Path, filter_graph: &str)
        -> Result<()>;
}

/// Transcoder backed by the ffmpeg command-line tool
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    encoder: EncoderPreset,
    stderr_tail: usize,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let defaults = Settings::default();
        Self {
            program: program.into(),
            encoder: defaults.encoder,
            stderr_tail: defaults.stderr_tail,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            program: settings.ffmpeg_path.clone(),
            encoder: settings.encoder.clone(),
            stderr_tail: settings.stderr_tail,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments for the extraction call
    pub fn extract_args(&self, video: &Path, wav: &Path, sample_rate: u32) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), video.into()];
        args.extend(
            ["-vn", "-acodec", "pcm_s16le", "-ar"]
                .iter()
                .map(OsString::from),
        );
        args.push(sample_rate.to_string().into());
        args.push(wav.into());
        args
    }

    /// Arguments for the mux call
    pub fn mux_args(
        &self,
        video: &Path,
        audio_wav: &Path,
        output: &Path,
        filter_graph: &str,
    ) -> Vec<OsString> {
        let enc = &self.encoder;
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            video.into(),
            "-i".into(),
            audio_wav.into(),
        ];

        if !filter_graph.is_empty() {
            args.push("-vf".into());
            args.push(filter_graph.into());
        }

        let mut push = |flag: &str, value: &str| {
            args.push(flag.into());
            args.push(value.into());
        };
        push("-map", "0:v:0");
        push("-map", "1:a:0");
        push("-c:v", &enc.video_codec);
        push("-preset", &enc.preset);
        push("-crf", &enc.crf.to_string());
        push("-c:a", &enc.audio_codec);
        push("-b:a", &enc.audio_bitrate);
        if enc.faststart {
            push("-movflags", "+faststart");
        }

        args.push(output.into());
        args
    }

    /// Run the program to completion, mapping a non-zero exit through `on_failure`
    fn run(&self, args: Vec<OsString>, on_failure: fn(String) -> MontageError) -> Result<()> {
        debug!("{} {:?}", self.program.display(), args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| MontageError::TranscoderUnavailable {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = tail_chars(&stderr, self.stderr_tail).to_string();
        warn!(
            "{} exited with {}",
            self.program.display(),
            output.status
        );
        Err(on_failure(tail))
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl Transcoder for FfmpegTranscoder {
    fn extract_audio(&self, video: &Path, wav: &Path, sample_rate: u32) -> Result<()> {
        if let Some(parent) = wav.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = self.extract_args(video, wav, sample_rate);
        self.run(args, |stderr| MontageError::Extraction { stderr })
    }

    fn mux(
        &self,
        video: &Path,
        audio_wav: &Path,
        output: &Path,
        filter_graph: &str,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = self.mux_args(video, audio_wav, output, filter_graph);
        self.run(args, |stderr| MontageError::Muxing { stderr })
    }
}

/// Last `max_chars` characters of `text`
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}
