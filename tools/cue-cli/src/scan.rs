//! Scan command - find cue assets under a directory
//!
//! Classification reads only the first four bytes of each file: a table
//! signature carried plainly or under the keystream, or a bank signature
//! (banks are never scrambled).

use anyhow::Result;
use clap::Args;
use cue_awb::AFS2_SIGNATURE;
use cue_table::{UTF_SIGNATURE, unscramble};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Directory to search
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Plain,
    Scrambled,
    Bank,
}

/// Execute the scan command
pub fn execute(args: ScanArgs) -> Result<()> {
    let mut plain = 0usize;
    let mut scrambled = 0usize;
    let mut banks = 0usize;

    for entry in WalkDir::new(&args.dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path()) {
            Some(Form::Plain) => {
                println!("{}  plain", entry.path().display());
                plain += 1;
            }
            Some(Form::Scrambled) => {
                println!("{}  scrambled", entry.path().display());
                scrambled += 1;
            }
            Some(Form::Bank) => {
                println!("{}  audio bank", entry.path().display());
                banks += 1;
            }
            None => {}
        }
    }

    println!(
        "Found {} asset(s) ({plain} plain, {scrambled} scrambled, {banks} bank(s))",
        plain + scrambled + banks
    );
    Ok(())
}

/// Signature check on the first four bytes. Unreadable or short files are
/// simply not assets.
fn classify(path: &Path) -> Option<Form> {
    let mut head = [0u8; 4];
    let mut file = File::open(path).ok()?;
    file.read_exact(&mut head).ok()?;

    if head == UTF_SIGNATURE {
        return Some(Form::Plain);
    }
    if head == AFS2_SIGNATURE {
        return Some(Form::Bank);
    }
    unscramble(&mut head);
    (head == UTF_SIGNATURE).then_some(Form::Scrambled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_table::{AwbBank, UtfColumn, UtfTable, UtfValue};
    use std::fs;

    #[test]
    fn test_classify() {
        let dir = tempfile::tempdir().unwrap();

        let mut table = UtfTable::new("CueSheet");
        table.add_column(UtfColumn::constant("Version", UtfValue::UInt32(1)));
        let bytes = table.to_bytes(true).unwrap();

        let plain = dir.path().join("plain.acb");
        fs::write(&plain, &bytes).unwrap();

        let mut scrambled_bytes = bytes;
        unscramble(&mut scrambled_bytes);
        let scrambled = dir.path().join("scrambled.acb");
        fs::write(&scrambled, &scrambled_bytes).unwrap();

        let mut bank = AwbBank::new(32);
        bank.add_entry(0, vec![0xAA; 3]);
        let awb = dir.path().join("stream.awb");
        fs::write(&awb, bank.to_bytes().unwrap()).unwrap();

        let junk = dir.path().join("junk.bin");
        fs::write(&junk, [0x13u8; 32]).unwrap();

        let short = dir.path().join("short.bin");
        fs::write(&short, [0x40u8; 2]).unwrap();

        assert_eq!(classify(&plain), Some(Form::Plain));
        assert_eq!(classify(&scrambled), Some(Form::Scrambled));
        assert_eq!(classify(&awb), Some(Form::Bank));
        assert_eq!(classify(&junk), None);
        assert_eq!(classify(&short), None);
        assert_eq!(classify(&dir.path().join("missing.bin")), None);
    }
}
