//! Tally CLI
//!
//! Command-line tools for tally ledger files.
//!
//! # Commands
//!
//! - `inspect` - Display record counts and sizes
//! - `verify` - Decode every record and report failures
//! - `dump` - Print the ledger contents in readable form

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tally command-line ledger tools.
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the ledger file
    #[arg(global = true, short, long)]
    file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display record counts and sizes
    Inspect {
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Decode every record and report per-record failures
    Verify,

    /// Print the ledger contents in readable form
    Dump {
        /// Maximum number of transactions to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let file = cli.file.ok_or("Ledger file required for inspect")?;
            commands::inspect::run(&file, &format)?;
        }
        Commands::Verify => {
            let file = cli.file.ok_or("Ledger file required for verify")?;
            commands::verify::run(&file)?;
        }
        Commands::Dump { limit } => {
            let file = cli.file.ok_or("Ledger file required for dump")?;
            commands::dump::run(&file, limit)?;
        }
        Commands::Version => {
            println!("tally {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
