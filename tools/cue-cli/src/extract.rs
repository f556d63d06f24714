//! Extract command - write payload cells and audio streams to files
//!
//! File naming follows the table tree: a cell's file is named after its
//! column (and row for per-row columns), audio bank entries append their
//! wave id, and nested tables prefix their own column name. A standalone
//! AFS2 file extracts its entries under the input file's stem.

use anyhow::{Context, Result};
use clap::Args;
use cue_awb::{AFS2_SIGNATURE, parse_awb};
use cue_table::{AwbBank, ColumnStorage, DataPayload, UtfTable, UtfValue, parse_utf};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// Container or bank file, plain or scrambled
    pub file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "extracted")]
    pub output: PathBuf,
}

/// Execute the extract command
pub fn execute(args: ExtractArgs) -> Result<()> {
    let data = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let mut written = 0;
    if data.starts_with(&AFS2_SIGNATURE) {
        let stem = args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stream".to_owned());
        extract_bank(&parse_awb(&data)?, &args.output, &stem, &mut written)?;
    } else {
        extract_table(&parse_utf(&data)?, &args.output, "", &mut written)?;
    }
    println!(
        "Extracted {} file(s) to {}",
        written,
        args.output.display()
    );
    Ok(())
}

fn extract_table(table: &UtfTable, dir: &Path, prefix: &str, written: &mut usize) -> Result<()> {
    for column in &table.columns {
        match &column.storage {
            ColumnStorage::Zero => {}
            ColumnStorage::Constant(value) => {
                let stem = format!("{prefix}{}", column.name);
                extract_value(value, dir, &stem, written)?;
            }
            ColumnStorage::PerRow(values) => {
                for (row, value) in values.iter().enumerate() {
                    let stem = format!("{prefix}{}_{row}", column.name);
                    extract_value(value, dir, &stem, written)?;
                }
            }
        }
    }
    Ok(())
}

fn extract_value(value: &UtfValue, dir: &Path, stem: &str, written: &mut usize) -> Result<()> {
    match value {
        UtfValue::Data(DataPayload::Blob(bytes)) if !bytes.is_empty() => {
            write_file(&dir.join(format!("{stem}.bin")), bytes, written)?;
        }
        UtfValue::Data(DataPayload::Table(nested)) => {
            extract_table(nested, dir, &format!("{stem}_"), written)?;
        }
        UtfValue::Data(DataPayload::AudioBank(bank)) => {
            extract_bank(bank, dir, stem, written)?;
        }
        _ => {}
    }
    Ok(())
}

fn extract_bank(bank: &AwbBank, dir: &Path, stem: &str, written: &mut usize) -> Result<()> {
    for entry in &bank.entries {
        write_file(
            &dir.join(format!("{stem}_{}.bin", entry.id)),
            &entry.data,
            written,
        )?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8], written: &mut usize) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    *written += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_table::{UtfColumn, ValueType};

    fn create_test_sheet() -> UtfTable {
        let mut bank = AwbBank::new(32);
        bank.add_entry(0, vec![0x11; 10]).add_entry(7, vec![0x22; 4]);

        let mut cues = UtfTable::new("Cue");
        cues.add_column(
            UtfColumn::per_row(
                "Waveform",
                ValueType::Data,
                vec![
                    UtfValue::Data(DataPayload::Blob(vec![0xAA, 0xBB])),
                    UtfValue::Data(DataPayload::Blob(Vec::new())),
                ],
            )
            .unwrap(),
        );
        cues.declared_row_count = 2;

        let mut sheet = UtfTable::new("CueSheet");
        sheet
            .add_column(UtfColumn::constant(
                "Header",
                UtfValue::Data(DataPayload::Blob(vec![0x01, 0x02, 0x03])),
            ))
            .add_column(UtfColumn::constant(
                "CueTable",
                UtfValue::Data(DataPayload::Table(Box::new(cues))),
            ))
            .add_column(UtfColumn::constant(
                "AwbFile",
                UtfValue::Data(DataPayload::AudioBank(bank)),
            ));
        sheet
    }

    #[test]
    fn test_extract_tree() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sheet.acb");
        let output = dir.path().join("out");
        fs::write(&input, create_test_sheet().to_bytes(true).unwrap()).unwrap();

        execute(ExtractArgs {
            file: input,
            output: output.clone(),
        })
        .unwrap();

        assert_eq!(fs::read(output.join("Header.bin")).unwrap(), vec![0x01, 0x02, 0x03]);
        assert_eq!(
            fs::read(output.join("CueTable_Waveform_0.bin")).unwrap(),
            vec![0xAA, 0xBB]
        );
        assert_eq!(fs::read(output.join("AwbFile_0.bin")).unwrap(), vec![0x11; 10]);
        assert_eq!(fs::read(output.join("AwbFile_7.bin")).unwrap(), vec![0x22; 4]);

        // Empty payloads produce no file.
        assert!(!output.join("CueTable_Waveform_1.bin").exists());
        assert_eq!(fs::read_dir(&output).unwrap().count(), 4);
    }

    #[test]
    fn test_extract_standalone_bank() {
        let mut bank = AwbBank::new(32);
        bank.add_entry(3, vec![0x5A; 6]);

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("music.awb");
        let output = dir.path().join("out");
        fs::write(&input, bank.to_bytes().unwrap()).unwrap();

        execute(ExtractArgs {
            file: input,
            output: output.clone(),
        })
        .unwrap();

        assert_eq!(fs::read(output.join("music_3.bin")).unwrap(), vec![0x5A; 6]);
    }
}
