//! Montage - Video Post-Processing Engine
//!
//! Montage takes an uploaded video through a fixed workflow:
//! 1. Upload - store the source asset
//! 2. Configure - choose ordered audio and video filter chains
//! 3. Apply - extract audio, run the audio chain, mux with the video graph
//! 4. Stream - hand back the processed asset
//!
//! # Architecture
//!
//! - `dsp`: whole-buffer signal primitives (pre-emphasis, Butterworth,
//!   mid/side, gain compression, peak normalization)
//! - `filters`: named audio filters built from those primitives, and video
//!   filters rendered as ffmpeg filter-graph fragments
//! - `pipeline`: the extract → process → mux sequence over a [`Transcoder`]
//! - `session`: the state machine gating every step
//!
//! [`Transcoder`]: pipeline::Transcoder

pub mod audio;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod session;

pub use error::{ErrorKind, MontageError, Result};
