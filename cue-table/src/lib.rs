//! Cue-Table: @UTF cue table container codec for Cuebank
//!
//! This crate reads and writes the big-endian tabular container used by
//! game audio-cue banks. A container is one table: named, typed columns
//! over a shared row space, with variable-length strings and binary
//! payloads carried in trailing pools. Payload cells can nest further
//! tables or embed AFS2 audio banks, so one file describes a whole cue
//! sheet with its streams.
//!
//! # Key Features
//!
//! - **Tolerant decoding**: zero-length payload cells are resolved by
//!   offset inference, matching files in the wild whose writers skip
//!   lengths for nested containers
//! - **Scramble aware**: XOR-obfuscated files are detected by signature
//!   and unscrambled transparently
//! - **Deterministic encoding**: the same table always serializes to the
//!   same bytes, with lengths written explicitly
//!
//! # Container Layout
//!
//! ```text
//! 0x00: "@UTF" signature
//! 0x04: size after this prefix (u32 BE)
//!
//! Sub-header (0x18 bytes, offsets below relative to 0x08):
//!   0x00: flags (u8)            0x01: encoding marker (u8)
//!   0x02: rows offset (u16)     0x04: string pool offset (u32)
//!   0x08: data pool offset (u32)
//!   0x0C: table name (u32, string pool ref)
//!   0x10: column count (u16)    0x12: row length (u16)
//!   0x14: row count (u32)
//!
//! Column directory (from 0x20):
//!   flag byte (type nibble | storage nibble), name ref (u32),
//!   then the value inline when the column stores a constant
//!
//! Row records: row-major, per-row columns in directory order
//! String pool: nul-terminated UTF-8, table and column names included
//! Data pool: payload bytes, optionally 32-byte aligned
//! ```
//!
//! # Usage
//!
//! ```
//! use cue_table::{UtfColumn, UtfTable, UtfValue, ValueType, parse_utf};
//!
//! let mut table = UtfTable::new("CueSheet");
//! table
//!     .add_column(UtfColumn::constant("Version", UtfValue::UInt32(16)))
//!     .add_column(
//!         UtfColumn::per_row(
//!             "CueName",
//!             ValueType::String,
//!             vec![
//!                 UtfValue::String("intro".into()),
//!                 UtfValue::String("outro".into()),
//!             ],
//!         )
//!         .unwrap(),
//!     );
//! table.declared_row_count = 2;
//!
//! let bytes = table.to_bytes(true).unwrap();
//! let decoded = parse_utf(&bytes).unwrap();
//! assert_eq!(decoded, table);
//! assert_eq!(decoded.value_as::<String>("CueName", 1).unwrap(), "outro");
//! ```

mod bytes;
mod error;
mod layout;
mod parser;
mod scramble;
mod table;
mod writer;

pub use cue_awb::{AwbBank, AwbEntry, AwbError};
pub use error::UtfError;
pub use parser::{parse_utf, parse_utf_at};
pub use scramble::{SCRAMBLE_MULT, SCRAMBLE_SEED, unscramble};
pub use table::{
    CellValue, ColumnStorage, DataPayload, StorageKind, UtfColumn, UtfTable, UtfValue, ValueType,
};

// =============================================================================
// Constants
// =============================================================================

/// Container magic
pub const UTF_SIGNATURE: [u8; 4] = *b"@UTF";

/// Bytes before the sub-header: signature plus the size field
pub const UTF_PREFIX_SIZE: usize = 8;

/// Sub-header size; the column directory starts right after it
pub const UTF_HEADER_SIZE: usize = 0x18;

/// Pool alignment used by padded encodes
pub const UTF_PAD_ALIGNMENT: usize = 32;

/// Column name reserved for embedded AFS2 audio banks. Payloads under any
/// other name stay raw blobs even when they carry the AFS2 signature.
pub const AWB_COLUMN_NAME: &str = "AwbFile";
