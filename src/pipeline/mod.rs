//! Pipeline Orchestrator
//!
//! Sequences one processing run:
//!
//! 1. extract the source's audio to `<tmp>/audio_in.wav`
//! 2. run the audio filter chain over it
//! 3. write the result to `<tmp>/audio_out.wav`
//! 4. mux the source video (through the video filter graph) with the
//!    processed audio into the output asset
//!
//! Any failing step aborts the run; nothing is retried.

pub mod transcoder;

pub use transcoder::{tail_chars, FfmpegTranscoder, Transcoder};

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::audio::{read_wav, write_wav, AudioBuffer};
use crate::error::{MontageError, Result};
use crate::filters::{apply_audio_chain, build_filter_graph, AudioFilter, ResolvedChain};

/// Scratch file holding the extracted audio
pub const EXTRACTED_WAV: &str = "audio_in.wav";
/// Scratch file holding the processed audio
pub const PROCESSED_WAV: &str = "audio_out.wav";

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub output: PathBuf,
    pub sample_rate: u32,
    pub channels: usize,
    pub frames: usize,
    pub audio_steps: usize,
    /// Filter graph handed to the transcoder; empty when there was none
    pub filter_graph: String,
}

/// Drives a [`Transcoder`] and the audio chain for one asset
pub struct Pipeline<'a> {
    transcoder: &'a dyn Transcoder,
    sample_rate: u32,
}

impl<'a> Pipeline<'a> {
    pub fn new(transcoder: &'a dyn Transcoder, sample_rate: u32) -> Self {
        Self {
            transcoder,
            sample_rate,
        }
    }

    /// Process `input` into `output` using `tmp_dir` for intermediates
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        chain: &ResolvedChain,
        tmp_dir: &Path,
    ) -> Result<PipelineReport> {
        if !input.exists() {
            return Err(MontageError::AssetMissing {
                path: input.to_path_buf(),
            });
        }

        fs::create_dir_all(tmp_dir)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        let wav_in = tmp_dir.join(EXTRACTED_WAV);
        let wav_out = tmp_dir.join(PROCESSED_WAV);

        info!("Extracting audio from {}", input.display());
        self.transcoder.extract_audio(input, &wav_in, self.sample_rate)?;

        info!("Running {} audio filter(s)", chain.audio.len());
        let processed = process_audio_file(&wav_in, &wav_out, &chain.audio)?;

        let filter_graph = build_filter_graph(&chain.video);
        info!(
            "Muxing into {} (video graph: {})",
            output.display(),
            if filter_graph.is_empty() { "none" } else { filter_graph.as_str() }
        );
        self.transcoder.mux(input, &wav_out, output, &filter_graph)?;

        Ok(PipelineReport {
            output: output.to_path_buf(),
            sample_rate: processed.sample_rate,
            channels: processed.num_channels(),
            frames: processed.len(),
            audio_steps: chain.audio.len(),
            filter_graph,
        })
    }
}

/// Read a WAV file, run `chain` over it and write the result
pub fn process_audio_file(
    wav_in: &Path,
    wav_out: &Path,
    chain: &[AudioFilter],
) -> Result<AudioBuffer> {
    let buffer = read_wav(wav_in)?;
    let processed = apply_audio_chain(&buffer, chain)?;
    write_wav(wav_out, &processed)?;
    Ok(processed)
}
