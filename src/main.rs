//! Skirmish CLI - Command-line interface for playing back and checking games.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// Skirmish - A deterministic turn & combat engine for grid tactics
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace); `RUST_LOG` overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a recording from start to finish
    Run {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress step-by-step output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the board at a step of a recording
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: PathBuf,

        /// Number of commands to apply (default: all)
        #[arg(short, long)]
        step: Option<usize>,
    },

    /// Check a configuration or recording file
    Validate {
        /// Configuration or recording file (JSON)
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Write a template recording
    Init {
        /// Destination file
        #[arg(required = true)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "skirmish=warn",
        1 => "skirmish=debug",
        _ => "skirmish=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            recording,
            format,
            quiet,
        } => cli::run::execute(&recording, format, quiet),

        Commands::Replay { recording, step } => cli::replay::execute(&recording, step),

        Commands::Validate { path } => cli::validate::execute(&path),

        Commands::Init { path, force } => cli::init::execute(&path, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
