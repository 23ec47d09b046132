//! Montage CLI - Video Post-Processing
//!
//! Command-line front end for the Montage session workflow.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::debug;

use montage::cli::commands::{self, Workspace};
use montage::cli::{Cli, Commands};
use montage::MontageError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Montage v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(hint) = err
                .downcast_ref::<MontageError>()
                .and_then(MontageError::recovery_suggestion)
            {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let open = || Workspace::open(cli.workspace.as_deref(), cli.config.as_deref());

    match cli.command {
        Commands::Upload { ref file } => commands::upload(&open()?, file),
        Commands::Configure { ref payload } => commands::configure(&open()?, payload),
        Commands::Apply => commands::apply(&open()?),
        Commands::Delete => commands::delete(&open()?),
        Commands::Stream { ref out } => commands::stream(&open()?, out),
        Commands::Status => commands::status(&open()?),
        Commands::Filters => commands::filters(),
        Commands::ProcessAudio {
            ref input,
            ref output,
            ref payload,
        } => commands::process_audio(input, output, payload),
    }
}
