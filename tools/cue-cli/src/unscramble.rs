//! Unscramble command - remove XOR obfuscation from a shipped container
//!
//! Writes the plain form next to the input so other tools can read it.
//! Already-plain files are copied through unchanged.

use anyhow::{Context, Result};
use clap::Args;
use cue_table::{UTF_SIGNATURE, unscramble};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the unscramble command
#[derive(Args)]
pub struct UnscrambleArgs {
    /// Scrambled container file
    pub file: PathBuf,

    /// Output path (defaults to `<file>.plain`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the unscramble command
pub fn execute(args: UnscrambleArgs) -> Result<()> {
    let mut data = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if data.starts_with(&UTF_SIGNATURE) {
        info!("{} is already plain", args.file.display());
    } else {
        unscramble(&mut data);
        if !data.starts_with(&UTF_SIGNATURE) {
            anyhow::bail!(
                "{} is not a cue table container (no signature after unscrambling)",
                args.file.display()
            );
        }
    }

    let output = args.output.unwrap_or_else(|| default_output(&args.file));
    fs::write(&output, &data)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".plain");
    input.with_file_name(name)
}
