//! Dump command - serialize a container to JSON
//!
//! Payload cells print as size/preview descriptors unless `--full-data`
//! is set, which inlines complete payloads as hex. Nested tables dump
//! recursively; audio banks dump entry by entry, whether embedded in a
//! cell or read from a standalone AFS2 file.

use anyhow::{Context, Result};
use clap::Args;
use cue_awb::{AFS2_SIGNATURE, parse_awb};
use cue_table::{AwbBank, ColumnStorage, DataPayload, UtfColumn, UtfTable, UtfValue, parse_utf};
use serde::Serialize;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;

/// Arguments for the dump command
#[derive(Args)]
pub struct DumpArgs {
    /// Container or bank file, plain or scrambled
    pub file: PathBuf,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Inline full payload bytes as hex instead of previews
    #[arg(long)]
    pub full_data: bool,
}

#[derive(Serialize)]
struct TableDump {
    name: Option<String>,
    rows: u32,
    columns: Vec<ColumnDump>,
}

#[derive(Serialize)]
struct ColumnDump {
    name: String,
    value_type: &'static str,
    storage: &'static str,
    /// Empty for zero storage, one element for a constant, row-many
    /// otherwise
    values: Vec<Value>,
}

/// Execute the dump command
pub fn execute(args: DumpArgs) -> Result<()> {
    let data = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let dump = if data.starts_with(&AFS2_SIGNATURE) {
        bank_json(&parse_awb(&data)?, args.full_data)
    } else {
        serde_json::to_value(table_dump(&parse_utf(&data)?, args.full_data)?)?
    };
    let json = serde_json::to_string_pretty(&dump)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn table_dump(table: &UtfTable, full: bool) -> Result<TableDump> {
    Ok(TableDump {
        name: table.name.clone(),
        rows: table.row_count()?,
        columns: table
            .columns
            .iter()
            .map(|column| column_dump(column, full))
            .collect::<Result<_>>()?,
    })
}

fn column_dump(column: &UtfColumn, full: bool) -> Result<ColumnDump> {
    let values = match &column.storage {
        ColumnStorage::Zero => Vec::new(),
        ColumnStorage::Constant(value) => vec![value_json(value, full)?],
        ColumnStorage::PerRow(values) => values
            .iter()
            .map(|value| value_json(value, full))
            .collect::<Result<_>>()?,
    };
    Ok(ColumnDump {
        name: column.name.clone(),
        value_type: column.value_type.name(),
        storage: column.storage_kind().name(),
        values,
    })
}

fn value_json(value: &UtfValue, full: bool) -> Result<Value> {
    Ok(match value {
        UtfValue::UInt8(v) => json!(v),
        UtfValue::Int8(v) => json!(v),
        UtfValue::UInt16(v) => json!(v),
        UtfValue::Int16(v) => json!(v),
        UtfValue::UInt32(v) => json!(v),
        UtfValue::Int32(v) => json!(v),
        UtfValue::UInt64(v) => json!(v),
        UtfValue::Int64(v) => json!(v),
        UtfValue::Float32(v) => json!(v),
        UtfValue::Float64(v) => json!(v),
        UtfValue::String(s) => json!(s),
        UtfValue::Guid(guid) => json!(hex_string(guid)),
        UtfValue::Data(DataPayload::Blob(bytes)) => {
            if full {
                json!({ "blob": hex_string(bytes) })
            } else {
                json!({ "blob": {
                    "size": bytes.len(),
                    "preview": hex_string(&bytes[..bytes.len().min(16)]),
                }})
            }
        }
        UtfValue::Data(DataPayload::Table(nested)) => {
            json!({ "table": table_dump(nested, full)? })
        }
        UtfValue::Data(DataPayload::AudioBank(bank)) => bank_json(bank, full),
    })
}

fn bank_json(bank: &AwbBank, full: bool) -> Value {
    let entries: Vec<Value> = bank
        .entries
        .iter()
        .map(|entry| {
            if full {
                json!({ "id": entry.id, "data": hex_string(&entry.data) })
            } else {
                json!({ "id": entry.id, "size": entry.data.len() })
            }
        })
        .collect();
    json!({ "awb": { "alignment": bank.alignment, "entries": entries } })
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
