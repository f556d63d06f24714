//! Logical cue tables: typed columns over a shared row space.
//!
//! A table is an ordered set of columns. Each column declares a value type
//! and one of three storage kinds: `Zero` (no value anywhere), `Constant`
//! (one value standing in for every row), or `PerRow` (one value per row).
//! Column order is significant; the container encodes and infers data
//! lengths in directory order.

use crate::error::UtfError;
use cue_awb::AwbBank;
use std::fmt;

// =============================================================================
// Column Type Codes
// =============================================================================

/// Value type of a column, stored in the high nibble of the directory
/// flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueType {
    UInt8 = 0x0,
    Int8 = 0x1,
    UInt16 = 0x2,
    Int16 = 0x3,
    UInt32 = 0x4,
    Int32 = 0x5,
    UInt64 = 0x6,
    Int64 = 0x7,
    Float32 = 0x8,
    Float64 = 0x9,
    /// u32 reference into the string pool
    String = 0xA,
    /// u32 data-pool offset plus u32 byte length
    Data = 0xB,
    /// 16 raw bytes
    Guid = 0xC,
}

impl ValueType {
    /// Decode the high nibble of a directory flag byte.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x0 => Self::UInt8,
            0x1 => Self::Int8,
            0x2 => Self::UInt16,
            0x3 => Self::Int16,
            0x4 => Self::UInt32,
            0x5 => Self::Int32,
            0x6 => Self::UInt64,
            0x7 => Self::Int64,
            0x8 => Self::Float32,
            0x9 => Self::Float64,
            0xA => Self::String,
            0xB => Self::Data,
            0xC => Self::Guid,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Bytes this type occupies in a row record or an inline constant.
    pub fn width(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 | Self::String => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 | Self::Data => 8,
            Self::Guid => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UInt8 => "UInt8",
            Self::Int8 => "Int8",
            Self::UInt16 => "UInt16",
            Self::Int16 => "Int16",
            Self::UInt32 => "UInt32",
            Self::Int32 => "Int32",
            Self::UInt64 => "UInt64",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Data => "Data",
            Self::Guid => "Guid",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage kind of a column, stored in the low nibble of the directory
/// flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageKind {
    /// Flag and name only; the column stores no value anywhere
    Zero = 0x1,
    /// One inline value in the directory stands in for every row
    Constant = 0x3,
    /// One value per row in the row records
    PerRow = 0x5,
}

impl StorageKind {
    /// Decode the low nibble of a directory flag byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x1 => Some(Self::Zero),
            0x3 => Some(Self::Constant),
            0x5 => Some(Self::PerRow),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Zero => "Zero",
            Self::Constant => "Constant",
            Self::PerRow => "PerRow",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Values
// =============================================================================

/// One cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum UtfValue {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Data(DataPayload),
    Guid([u8; 16]),
}

impl UtfValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::UInt8(_) => ValueType::UInt8,
            Self::Int8(_) => ValueType::Int8,
            Self::UInt16(_) => ValueType::UInt16,
            Self::Int16(_) => ValueType::Int16,
            Self::UInt32(_) => ValueType::UInt32,
            Self::Int32(_) => ValueType::Int32,
            Self::UInt64(_) => ValueType::UInt64,
            Self::Int64(_) => ValueType::Int64,
            Self::Float32(_) => ValueType::Float32,
            Self::Float64(_) => ValueType::Float64,
            Self::String(_) => ValueType::String,
            Self::Data(_) => ValueType::Data,
            Self::Guid(_) => ValueType::Guid,
        }
    }
}

/// What a decoded `Data` cell turned out to hold.
///
/// The decoder sniffs the first bytes of every materialized cell: nested
/// tables decode recursively, and cells owned by the reserved audio-bank
/// column decode as AFS2 banks. Everything else stays raw. An empty cell
/// is an empty blob.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    /// Raw bytes, possibly empty
    Blob(Vec<u8>),
    /// A nested table
    Table(Box<UtfTable>),
    /// An embedded AFS2 audio bank
    AudioBank(AwbBank),
}

impl DataPayload {
    /// Empty payloads encode as a (0, 0) offset/length pair.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Blob(bytes) if bytes.is_empty())
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Per-column storage. The enum makes "a column never mixes storage kinds"
/// structural rather than a runtime rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnStorage {
    Zero,
    Constant(UtfValue),
    PerRow(Vec<UtfValue>),
}

/// One named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct UtfColumn {
    /// Column name, resolved through the string pool
    pub name: String,
    /// Declared value type; every stored value matches it
    pub value_type: ValueType,
    /// Where the column's values live
    pub storage: ColumnStorage,
}

impl UtfColumn {
    /// A column that stores no values anywhere.
    pub fn zero(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            storage: ColumnStorage::Zero,
        }
    }

    /// A column whose single value stands in for every row.
    pub fn constant(name: impl Into<String>, value: UtfValue) -> Self {
        Self {
            name: name.into(),
            value_type: value.value_type(),
            storage: ColumnStorage::Constant(value),
        }
    }

    /// A column with one value per row. Every value must match the declared
    /// type.
    pub fn per_row(
        name: impl Into<String>,
        value_type: ValueType,
        values: Vec<UtfValue>,
    ) -> Result<Self, UtfError> {
        let name = name.into();
        for value in &values {
            if value.value_type() != value_type {
                return Err(UtfError::TypeMismatch {
                    column: name,
                    expected: value_type,
                    actual: value.value_type(),
                });
            }
        }
        Ok(Self {
            name,
            value_type,
            storage: ColumnStorage::PerRow(values),
        })
    }

    pub fn storage_kind(&self) -> StorageKind {
        match self.storage {
            ColumnStorage::Zero => StorageKind::Zero,
            ColumnStorage::Constant(_) => StorageKind::Constant,
            ColumnStorage::PerRow(_) => StorageKind::PerRow,
        }
    }

    /// Row count this column contributes, `None` unless it stores per-row
    /// values.
    pub fn rows(&self) -> Option<u32> {
        match &self.storage {
            ColumnStorage::PerRow(values) => Some(values.len() as u32),
            _ => None,
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

/// A decoded (or hand-built) cue table.
#[derive(Debug, Clone, PartialEq)]
pub struct UtfTable {
    /// Table name; `None` round-trips as an empty name string
    pub name: Option<String>,
    /// Row count carried by the header, kept even when no column stores
    /// rows (schema tables do this)
    pub declared_row_count: u32,
    /// Columns in directory order
    pub columns: Vec<UtfColumn>,
}

impl UtfTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            declared_row_count: 0,
            columns: Vec::new(),
        }
    }

    pub fn unnamed() -> Self {
        Self {
            name: None,
            declared_row_count: 0,
            columns: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: UtfColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&UtfColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut UtfColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The table's row count: the length every `PerRow` column agrees on,
    /// or the declared count when no column stores rows.
    ///
    /// # Errors
    /// `RowCountMismatch` when two `PerRow` columns disagree
    pub fn row_count(&self) -> Result<u32, UtfError> {
        let mut rows: Option<u32> = None;
        for column in &self.columns {
            let Some(len) = column.rows() else { continue };
            match rows {
                None => rows = Some(len),
                Some(expected) if expected != len => {
                    return Err(UtfError::RowCountMismatch {
                        column: column.name.clone(),
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(rows.unwrap_or(self.declared_row_count))
    }

    /// Read one cell.
    ///
    /// A `Constant` column answers for any row index; a `PerRow` column
    /// bounds-checks against the table's row count.
    pub fn value(&self, column: &str, row: u32) -> Result<&UtfValue, UtfError> {
        let found = self
            .column(column)
            .ok_or_else(|| UtfError::NoSuchColumn(column.to_owned()))?;
        match &found.storage {
            ColumnStorage::Zero => Err(UtfError::ValueMissing {
                column: found.name.clone(),
            }),
            ColumnStorage::Constant(value) => Ok(value),
            ColumnStorage::PerRow(values) => {
                values.get(row as usize).ok_or(UtfError::RowIndexOutOfRange {
                    row,
                    rows: values.len() as u32,
                })
            }
        }
    }

    /// Read one cell as a concrete Rust type.
    ///
    /// # Errors
    /// `TypeMismatch` when the column's declared type does not extract to
    /// `T`; the table is never mutated
    ///
    /// # Example
    /// ```
    /// use cue_table::{UtfColumn, UtfTable, UtfValue};
    ///
    /// let mut table = UtfTable::new("Header");
    /// table.add_column(UtfColumn::constant("Version", UtfValue::UInt32(16)));
    /// assert_eq!(table.value_as::<u32>("Version", 0).unwrap(), 16);
    /// assert!(table.value_as::<i8>("Version", 0).is_err());
    /// ```
    pub fn value_as<T: CellValue>(&self, column: &str, row: u32) -> Result<T, UtfError> {
        let value = self.value(column, row)?;
        T::from_value(value).ok_or_else(|| UtfError::TypeMismatch {
            column: column.to_owned(),
            expected: T::TYPE,
            actual: value.value_type(),
        })
    }

    /// Write one cell.
    ///
    /// Writing a divergent value into a `Constant` column promotes the
    /// column to `PerRow` first: the constant is replicated across the
    /// current row count, then the addressed row is replaced. Writing the
    /// identical value is a no-op. The row index is bounds-checked against
    /// the row count for every storage kind, and the value type must match
    /// the column's declared type; on any error the table is left untouched.
    pub fn set_value(&mut self, column: &str, row: u32, value: UtfValue) -> Result<(), UtfError> {
        let rows = self.row_count()?;
        let index = self
            .column_index(column)
            .ok_or_else(|| UtfError::NoSuchColumn(column.to_owned()))?;
        let target = &mut self.columns[index];

        if value.value_type() != target.value_type {
            return Err(UtfError::TypeMismatch {
                column: target.name.clone(),
                expected: target.value_type,
                actual: value.value_type(),
            });
        }

        match &mut target.storage {
            ColumnStorage::Zero => Err(UtfError::ValueMissing {
                column: target.name.clone(),
            }),
            ColumnStorage::Constant(current) => {
                if row >= rows {
                    return Err(UtfError::RowIndexOutOfRange { row, rows });
                }
                if *current == value {
                    return Ok(());
                }
                let mut values = vec![current.clone(); rows as usize];
                values[row as usize] = value;
                target.storage = ColumnStorage::PerRow(values);
                Ok(())
            }
            ColumnStorage::PerRow(values) => {
                let slot = values
                    .get_mut(row as usize)
                    .ok_or(UtfError::RowIndexOutOfRange { row, rows })?;
                *slot = value;
                Ok(())
            }
        }
    }
}

// =============================================================================
// Typed Extraction
// =============================================================================

/// Rust types a cell can be read out as via [`UtfTable::value_as`].
pub trait CellValue: Sized {
    /// The column type this extraction requires.
    const TYPE: ValueType;

    /// Extract from a matching value; `None` on any other variant.
    fn from_value(value: &UtfValue) -> Option<Self>;
}

impl CellValue for u8 {
    const TYPE: ValueType = ValueType::UInt8;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::UInt8(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for i8 {
    const TYPE: ValueType = ValueType::Int8;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Int8(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for u16 {
    const TYPE: ValueType = ValueType::UInt16;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::UInt16(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for i16 {
    const TYPE: ValueType = ValueType::Int16;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Int16(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for u32 {
    const TYPE: ValueType = ValueType::UInt32;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::UInt32(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for i32 {
    const TYPE: ValueType = ValueType::Int32;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Int32(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for u64 {
    const TYPE: ValueType = ValueType::UInt64;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for i64 {
    const TYPE: ValueType = ValueType::Int64;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for f32 {
    const TYPE: ValueType = ValueType::Float32;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Float32(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for f64 {
    const TYPE: ValueType = ValueType::Float64;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Float64(v) => Some(*v),
            _ => None,
        }
    }
}

impl CellValue for String {
    const TYPE: ValueType = ValueType::String;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl CellValue for [u8; 16] {
    const TYPE: ValueType = ValueType::Guid;
    fn from_value(value: &UtfValue) -> Option<Self> {
        match value {
            UtfValue::Guid(v) => Some(*v),
            _ => None,
        }
    }
}
