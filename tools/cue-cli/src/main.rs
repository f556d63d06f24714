//! Cue CLI - Inspection and extraction tool for cue table containers
//!
//! # Commands
//!
//! - `cue info` - Show the table tree of a container or bank
//! - `cue dump` - Dump a container or bank as JSON
//! - `cue extract` - Write payload cells and audio streams to files
//! - `cue unscramble` - Remove XOR scrambling from a shipped container
//! - `cue scan` - Find containers and banks under a directory
//!
//! # Usage
//!
//! ```bash
//! # Inspect a cue sheet, nested tables and banks included
//! cue info music.acb
//!
//! # Dump as JSON with payload previews (or --full-data for full hex)
//! cue dump music.acb
//!
//! # Pull every stream out of the embedded bank
//! cue extract music.acb -o extracted/
//!
//! # Same commands work on the external streaming bank of a pair
//! cue extract music.awb -o extracted/
//!
//! # Descramble a shipped file for other tools
//! cue unscramble music.acb
//!
//! # Find every container and bank under the assets directory
//! cue scan assets/
//! ```

mod dump;
mod extract;
mod info;
mod scan;
mod unscramble;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cue CLI - Inspection and extraction tool for cue table containers
#[derive(Parser)]
#[command(name = "cue")]
#[command(about = "Inspect and extract cue table containers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the table tree of a container or bank
    Info(info::InfoArgs),

    /// Dump a container or bank as JSON
    Dump(dump::DumpArgs),

    /// Write payload cells and audio streams to files
    Extract(extract::ExtractArgs),

    /// Remove XOR scrambling from a shipped container
    Unscramble(unscramble::UnscrambleArgs),

    /// Find containers and banks under a directory
    Scan(scan::ScanArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info(args) => info::execute(args),
        Commands::Dump(args) => dump::execute(args),
        Commands::Extract(args) => extract::execute(args),
        Commands::Unscramble(args) => unscramble::execute(args),
        Commands::Scan(args) => scan::execute(args),
    }
}
