//! Error type shared by the table codec.

use crate::table::ValueType;
use cue_awb::AwbError;

/// Errors from decoding, encoding, or editing a cue table.
///
/// Every failure is fatal to the operation that raised it: the codec never
/// retries and never returns a partially decoded table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UtfError {
    /// A read would cross the end of the buffer
    #[error("read of {count} bytes at offset 0x{offset:X} is out of range")]
    OutOfRange { offset: usize, count: usize },
    /// A row index past the table's row count
    #[error("row {row} is out of range for a table of {rows} rows")]
    RowIndexOutOfRange { row: u32, rows: u32 },
    /// The buffer carries no table signature, plain or scrambled
    #[error("missing @UTF signature")]
    InvalidSignature,
    /// A string-pool entry is not valid UTF-8
    #[error("invalid UTF-8 in string at offset 0x{offset:X}")]
    InvalidString { offset: usize },
    /// A directory flag byte names a value type this codec does not know
    #[error("unknown column value type 0x{0:X}")]
    UnknownValueType(u8),
    /// A directory flag byte names a storage kind this codec does not know
    #[error("unknown column storage kind 0x{0:X}")]
    UnknownStorageKind(u8),
    /// Walking a row record did not land on the declared record width
    #[error("row records walk to {walked} bytes but the header declares {declared}")]
    RowLayoutMismatch { declared: u16, walked: usize },
    /// A per-row column disagrees with the table's row count
    #[error("column \"{column}\" holds {actual} rows but the table has {expected}")]
    RowCountMismatch {
        column: String,
        expected: u32,
        actual: u32,
    },
    /// A row serialized to a different width than its siblings
    #[error("row {row} encoded to {actual} bytes, expected {expected}")]
    InconsistentRow {
        row: u32,
        expected: usize,
        actual: usize,
    },
    /// An encoded section outgrew the header field that must address it
    #[error("encoded table exceeds a size field's range ({size})")]
    TableTooLarge { size: usize },
    /// A value of the wrong type was read from or written to a column
    #[error("column \"{column}\": expected a {expected} value, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ValueType,
        actual: ValueType,
    },
    /// The column stores no values at all
    #[error("column \"{column}\" stores no values")]
    ValueMissing { column: String },
    /// No column under that name
    #[error("no column named \"{0}\"")]
    NoSuchColumn(String),
    /// An embedded audio bank failed to parse or serialize
    #[error("embedded audio bank: {0}")]
    Awb(#[from] AwbError),
}
