//! Table decoding: recursive descent over the container sections.
//!
//! A decode runs in one pass per section: header, column directory with
//! inline constants, row records, then a length-inference pass over the
//! collected data-cell descriptors, and finally payload materialization
//! (which recurses into nested tables and embedded audio banks).

use crate::bytes::{
    read_bytes, read_cstring, read_f32, read_f64, read_i8, read_i16, read_i32, read_i64, read_u8,
    read_u16, read_u32, read_u64,
};
use crate::error::UtfError;
use crate::layout::{DataCell, infer_lengths, is_awb_column, sniff_container};
use crate::scramble::unscramble;
use crate::table::{ColumnStorage, DataPayload, StorageKind, UtfColumn, UtfTable, UtfValue, ValueType};
use crate::{UTF_HEADER_SIZE, UTF_PREFIX_SIZE, UTF_SIGNATURE};
use cue_awb::{AFS2_SIGNATURE, parse_awb};

/// Decode a table from the start of a buffer.
///
/// # Arguments
/// * `data` - The container bytes, plain or whole-buffer scrambled
///
/// # Returns
/// The decoded table, including recursively decoded nested tables and
/// embedded audio banks
///
/// # Errors
/// Returns `UtfError` when no signature is found even after unscrambling,
/// or when any section is malformed or truncated
///
/// # Example
/// ```
/// use cue_table::{UtfColumn, UtfTable, UtfValue, parse_utf};
///
/// let mut table = UtfTable::new("Header");
/// table.add_column(UtfColumn::constant("Version", UtfValue::UInt32(16)));
///
/// let bytes = table.to_bytes(true).unwrap();
/// let decoded = parse_utf(&bytes).unwrap();
/// assert_eq!(decoded.value_as::<u32>("Version", 0).unwrap(), 16);
/// ```
pub fn parse_utf(data: &[u8]) -> Result<UtfTable, UtfError> {
    parse_utf_at(data, 0)
}

/// Decode a table embedded at `start` in a larger buffer.
///
/// When the signature is absent, the remainder of the buffer is
/// unscrambled once into a copy and checked again; a second miss is
/// `InvalidSignature`. The table's own size field bounds the container,
/// so trailing bytes after it are ignored.
pub fn parse_utf_at(data: &[u8], start: usize) -> Result<UtfTable, UtfError> {
    let head = read_bytes(data, start, 4)?;
    if head == UTF_SIGNATURE {
        return decode_table(data, start);
    }

    // The scramble keystream runs over the whole remainder, signature
    // included.
    let mut copy = data[start..].to_vec();
    unscramble(&mut copy);
    if copy[..4] != UTF_SIGNATURE {
        return Err(UtfError::InvalidSignature);
    }
    decode_table(&copy, 0)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a plain (already unscrambled) table starting at `start`.
///
/// Nested tables recurse through here directly: their cells were
/// unscrambled together with the outer container, and materialization only
/// recurses when the plain signature is present.
fn decode_table(data: &[u8], start: usize) -> Result<UtfTable, UtfError> {
    let magic = read_bytes(data, start, 4)?;
    if magic != UTF_SIGNATURE {
        return Err(UtfError::InvalidSignature);
    }
    let size = read_u32(data, start + 4)? as usize;
    let base = start + UTF_PREFIX_SIZE;
    let container_end = base + size;
    if container_end > data.len() {
        return Err(UtfError::OutOfRange {
            offset: start,
            count: UTF_PREFIX_SIZE + size,
        });
    }

    // Sub-header; all offsets in it are relative to `base`. The two lead
    // bytes (flags and encoding marker) are not interpreted.
    let rows_offset = read_u16(data, base + 0x02)? as usize;
    let strings_offset = read_u32(data, base + 0x04)? as usize;
    let data_offset = read_u32(data, base + 0x08)? as usize;
    let name_offset = read_u32(data, base + 0x0C)? as usize;
    let column_count = read_u16(data, base + 0x10)?;
    let row_length = read_u16(data, base + 0x12)?;
    let row_count = read_u32(data, base + 0x14)?;

    let rows_start = base + rows_offset;
    let strings_start = base + strings_offset;
    let data_start = base + data_offset;

    // The declared row records must fit inside the container.
    let rows_size = row_count as usize * row_length as usize;
    if rows_start + rows_size > container_end {
        return Err(UtfError::OutOfRange {
            offset: rows_start,
            count: rows_size,
        });
    }

    // An empty string pool means the table carries no strings at all;
    // otherwise the name is the string at name_offset, with the empty
    // string meaning "unnamed".
    let name = if strings_start < data_start {
        match read_cstring(data, strings_start + name_offset)? {
            s if s.is_empty() => None,
            s => Some(s),
        }
    } else {
        None
    };

    let mut decoder = Decoder {
        data,
        strings_start,
        data_start,
        cells: Vec::new(),
    };

    // Column directory, constants inline. The region check bounds the
    // declared count only when records occupy bytes, so per-row storage
    // is never pre-sized for a zero record width.
    let row_capacity = if row_length > 0 { row_count as usize } else { 0 };
    let mut columns = Vec::with_capacity(column_count as usize);
    let mut cursor = base + UTF_HEADER_SIZE;
    for index in 0..column_count as usize {
        let flag = read_u8(data, cursor)?;
        cursor += 1;
        let type_code = flag >> 4;
        let storage_code = flag & 0x0F;
        let value_type =
            ValueType::from_code(type_code).ok_or(UtfError::UnknownValueType(type_code))?;
        let storage_kind =
            StorageKind::from_code(storage_code).ok_or(UtfError::UnknownStorageKind(storage_code))?;
        let name_ref = read_u32(data, cursor)? as usize;
        cursor += 4;
        let name = read_cstring(data, strings_start + name_ref)?;

        let storage = match storage_kind {
            StorageKind::Zero => ColumnStorage::Zero,
            StorageKind::Constant => {
                let value = decoder.read_cell(cursor, value_type, index, None)?;
                cursor += value_type.width();
                ColumnStorage::Constant(value)
            }
            StorageKind::PerRow => ColumnStorage::PerRow(Vec::with_capacity(row_capacity)),
        };
        columns.push(UtfColumn {
            name,
            value_type,
            storage,
        });
    }

    // The per-record layout must walk to exactly the declared width.
    let per_row: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.storage_kind() == StorageKind::PerRow)
        .map(|(i, _)| i)
        .collect();
    let walked: usize = per_row.iter().map(|&i| columns[i].value_type.width()).sum();
    if walked != row_length as usize {
        return Err(UtfError::RowLayoutMismatch {
            declared: row_length,
            walked,
        });
    }

    // Row records, row-major, PerRow columns in directory order. Together
    // with the constants above this collects data-cell descriptors in
    // canonical write order.
    if !per_row.is_empty() {
        for row in 0..row_count {
            let mut field = rows_start + row as usize * row_length as usize;
            for &index in &per_row {
                let value_type = columns[index].value_type;
                let value = decoder.read_cell(field, value_type, index, Some(row))?;
                field += value_type.width();
                if let ColumnStorage::PerRow(values) = &mut columns[index].storage {
                    values.push(value);
                }
            }
        }
    }

    // Resolve zero-length cells, then materialize payloads.
    let mut cells = decoder.cells;
    let pool_len = container_end.saturating_sub(data_start) as u32;
    infer_lengths(&mut cells, pool_len, |cell| {
        sniff_container(data, cell.abs_offset)
    });

    for cell in &cells {
        let payload = if cell.length == 0 {
            DataPayload::Blob(Vec::new())
        } else {
            let bytes = read_bytes(data, cell.abs_offset, cell.length as usize)?;
            if bytes.starts_with(&UTF_SIGNATURE) {
                DataPayload::Table(Box::new(decode_table(data, cell.abs_offset)?))
            } else if bytes.starts_with(&AFS2_SIGNATURE) && is_awb_column(&columns, cell.column) {
                DataPayload::AudioBank(parse_awb(bytes)?)
            } else {
                DataPayload::Blob(bytes.to_vec())
            }
        };
        let column = &mut columns[cell.column];
        match (&mut column.storage, cell.row) {
            (ColumnStorage::Constant(value), None) => *value = UtfValue::Data(payload),
            (ColumnStorage::PerRow(values), Some(row)) => {
                values[row as usize] = UtfValue::Data(payload);
            }
            _ => {}
        }
    }

    Ok(UtfTable {
        name,
        declared_row_count: row_count,
        columns,
    })
}

/// Section anchors plus the descriptor accumulator for one table.
struct Decoder<'a> {
    data: &'a [u8],
    strings_start: usize,
    data_start: usize,
    cells: Vec<DataCell>,
}

impl Decoder<'_> {
    /// Read one cell value at `at`.
    ///
    /// Data cells only record a descriptor here; the returned placeholder
    /// is replaced once lengths are inferred.
    fn read_cell(
        &mut self,
        at: usize,
        value_type: ValueType,
        column: usize,
        row: Option<u32>,
    ) -> Result<UtfValue, UtfError> {
        Ok(match value_type {
            ValueType::UInt8 => UtfValue::UInt8(read_u8(self.data, at)?),
            ValueType::Int8 => UtfValue::Int8(read_i8(self.data, at)?),
            ValueType::UInt16 => UtfValue::UInt16(read_u16(self.data, at)?),
            ValueType::Int16 => UtfValue::Int16(read_i16(self.data, at)?),
            ValueType::UInt32 => UtfValue::UInt32(read_u32(self.data, at)?),
            ValueType::Int32 => UtfValue::Int32(read_i32(self.data, at)?),
            ValueType::UInt64 => UtfValue::UInt64(read_u64(self.data, at)?),
            ValueType::Int64 => UtfValue::Int64(read_i64(self.data, at)?),
            ValueType::Float32 => UtfValue::Float32(read_f32(self.data, at)?),
            ValueType::Float64 => UtfValue::Float64(read_f64(self.data, at)?),
            ValueType::String => {
                let name_ref = read_u32(self.data, at)? as usize;
                UtfValue::String(read_cstring(self.data, self.strings_start + name_ref)?)
            }
            ValueType::Data => {
                let rel_offset = read_u32(self.data, at)?;
                let length = read_u32(self.data, at + 4)?;
                self.cells.push(DataCell {
                    rel_offset,
                    abs_offset: self.data_start + rel_offset as usize,
                    length,
                    column,
                    row,
                });
                UtfValue::Data(DataPayload::Blob(Vec::new()))
            }
            ValueType::Guid => {
                let bytes = read_bytes(self.data, at, 16)?;
                let mut guid = [0u8; 16];
                guid.copy_from_slice(bytes);
                UtfValue::Guid(guid)
            }
        })
    }
}
