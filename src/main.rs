mod catalog;
mod commands;
mod config;
mod diagnostics;
mod error;
mod listing;
mod mover;
mod renumber;
mod rewriter;
mod scan;
mod stub;
mod walk;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::{ReportFormat, UpdateOptions};

#[derive(Parser)]
#[command(name = "listings", about = "Keep numbered book listings contiguous, consistently named, and tested")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report extra listings, listings without tests, and orphaned tests
    Scan {
        /// A chapter directory, or a book root containing Chapter<CC> directories
        path: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Write placeholder tests for listings that have none
    Stub {
        /// A chapter directory, or a book root containing Chapter<CC> directories
        path: PathBuf,
        /// Print the stubs that would be created without writing them
        #[arg(long)]
        preview: bool,
    },
    /// Renumber a chapter's listings and rewrite everything that refers to them
    Update {
        /// The chapter directory to renumber
        path: PathBuf,
        /// Take the chapter number from the directory name
        #[arg(long)]
        by_folder: bool,
        /// Replace only the chapter number, keeping listing numbers and suffixes
        #[arg(long)]
        chapter_only: bool,
        /// Record renames with `git mv`
        #[arg(long)]
        git: bool,
        /// Print the planned renames and rewrites without applying them
        #[arg(long, alias = "dry-run")]
        preview: bool,
        /// Log every rename decision before it is applied
        #[arg(long, short)]
        verbose: bool,
    },
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

/// Map a command result to an exit code, printing errors as diagnostics.
fn finish(result: Result<ExitCode, error::Error>) -> ExitCode {
    return match result {
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
        Ok(code) => code,
    };
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::Update { verbose: true, .. });
    init_logging(verbose);

    return match cli.command {
        Commands::Scan { path, format } => finish(commands::scan(&path, format)),
        Commands::Stub { path, preview } => {
            finish(commands::stub(&path, preview).map(|()| return ExitCode::SUCCESS))
        },
        Commands::Update { path, by_folder, chapter_only, git, preview, verbose: _ } => {
            let options = UpdateOptions { by_folder, chapter_only, git, preview };
            finish(commands::update(&path, options))
        },
    };
}
