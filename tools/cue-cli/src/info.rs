//! Info command - print the table tree of a container
//!
//! Nested tables and embedded audio banks are printed inline, indented
//! under the cell that carries them. Standalone AFS2 bank files (the
//! `.awb` half of a sheet/bank pair) are recognized by signature.

use anyhow::{Context, Result};
use clap::Args;
use cue_awb::{AFS2_SIGNATURE, parse_awb};
use cue_table::{AwbBank, ColumnStorage, DataPayload, UtfTable, UtfValue, parse_utf};
use std::fs;
use std::path::PathBuf;

/// Arguments for the info command
#[derive(Args)]
pub struct InfoArgs {
    /// Container or bank file, plain or scrambled
    pub file: PathBuf,
}

/// Execute the info command
pub fn execute(args: InfoArgs) -> Result<()> {
    let data = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    println!("=== {} ===", args.file.display());
    println!("  Size: {} bytes", data.len());
    if data.starts_with(&AFS2_SIGNATURE) {
        print_bank(&parse_awb(&data)?, 1);
    } else {
        print_table(&parse_utf(&data)?, 1);
    }
    Ok(())
}

fn print_table(table: &UtfTable, depth: usize) {
    let pad = "  ".repeat(depth);
    println!(
        "{pad}Table: {}",
        table.name.as_deref().unwrap_or("(unnamed)")
    );
    match table.row_count() {
        Ok(rows) => println!("{pad}Rows: {rows}"),
        Err(_) => println!("{pad}Rows: (columns disagree)"),
    }
    println!("{pad}Columns: {}", table.columns.len());

    for column in &table.columns {
        match &column.storage {
            ColumnStorage::Zero => {
                println!("{pad}  {} ({}, Zero)", column.name, column.value_type);
            }
            ColumnStorage::Constant(value) => {
                println!(
                    "{pad}  {} ({}, Constant): {}",
                    column.name,
                    column.value_type,
                    preview(value)
                );
                print_nested(value, depth + 2);
            }
            ColumnStorage::PerRow(values) => {
                let shown: Vec<String> = values.iter().take(4).map(preview).collect();
                let ellipsis = if values.len() > 4 { ", ..." } else { "" };
                println!(
                    "{pad}  {} ({}, PerRow): [{}{}]",
                    column.name,
                    column.value_type,
                    shown.join(", "),
                    ellipsis
                );
                for value in values {
                    print_nested(value, depth + 2);
                }
            }
        }
    }
}

fn print_nested(value: &UtfValue, depth: usize) {
    match value {
        UtfValue::Data(DataPayload::Table(nested)) => print_table(nested, depth),
        UtfValue::Data(DataPayload::AudioBank(bank)) => print_bank(bank, depth),
        _ => {}
    }
}

fn print_bank(bank: &AwbBank, depth: usize) {
    let pad = "  ".repeat(depth);
    println!(
        "{pad}Audio bank: {} entries, alignment {}",
        bank.len(),
        bank.alignment
    );
    for entry in &bank.entries {
        println!("{pad}  #{}: {} bytes", entry.id, entry.data.len());
    }
}

/// One-line rendering of a cell value.
fn preview(value: &UtfValue) -> String {
    match value {
        UtfValue::UInt8(v) => v.to_string(),
        UtfValue::Int8(v) => v.to_string(),
        UtfValue::UInt16(v) => v.to_string(),
        UtfValue::Int16(v) => v.to_string(),
        UtfValue::UInt32(v) => v.to_string(),
        UtfValue::Int32(v) => v.to_string(),
        UtfValue::UInt64(v) => v.to_string(),
        UtfValue::Int64(v) => v.to_string(),
        UtfValue::Float32(v) => v.to_string(),
        UtfValue::Float64(v) => v.to_string(),
        UtfValue::String(s) => format!("{s:?}"),
        UtfValue::Guid(guid) => guid.iter().map(|b| format!("{b:02X}")).collect(),
        UtfValue::Data(DataPayload::Blob(bytes)) => format!("[blob, {} bytes]", bytes.len()),
        UtfValue::Data(DataPayload::Table(nested)) => format!(
            "[table {}]",
            nested.name.as_deref().unwrap_or("(unnamed)")
        ),
        UtfValue::Data(DataPayload::AudioBank(bank)) => {
            format!("[audio bank, {} entries]", bank.len())
        }
    }
}
