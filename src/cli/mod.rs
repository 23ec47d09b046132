//! CLI Module
//!
//! Command-line interface driving one session per workspace.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Montage - apply audio and video filter chains to an uploaded video
#[derive(Parser, Debug)]
#[command(name = "montage-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace holding uploads, outputs and the session file
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a video into the workspace
    #[command(name = "upload")]
    Upload {
        /// Video file (.mp4, .mov, .mkv, .webm, .avi)
        file: PathBuf,
    },

    /// Set the audio and video filter chains
    #[command(name = "configure")]
    Configure {
        /// JSON file: {"audio": [{name, params?}], "video": [...]}
        payload: PathBuf,
    },

    /// Process the uploaded video with the configured filters
    #[command(name = "apply")]
    Apply,

    /// Remove the uploaded video before it is configured
    #[command(name = "delete")]
    Delete,

    /// Copy the processed video out of the workspace
    #[command(name = "stream")]
    Stream {
        /// Destination path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print the current session
    #[command(name = "status")]
    Status,

    /// List the registered audio and video filters
    #[command(name = "filters")]
    Filters,

    /// Run only the audio chain over a WAV file
    #[command(name = "process-audio")]
    ProcessAudio {
        /// Input WAV
        input: PathBuf,

        /// Output WAV
        output: PathBuf,

        /// JSON filter configuration (its video list is ignored)
        payload: PathBuf,
    },
}
