//! Table serialization: sequential sections with back-patched offsets.
//!
//! The encoder emits sections in file order (prefix, sub-header, column
//! directory, row records, string pool, data pool), reserving placeholder
//! bytes for every offset that is not yet known and patching them once the
//! owning section lands. Strings and payloads are flushed in
//! first-encounter order, which is exactly the canonical order the decoder
//! infers lengths in.

use crate::bytes::{patch_u16, patch_u32, push_u16, push_u32, push_u64};
use crate::error::UtfError;
use crate::table::{ColumnStorage, DataPayload, UtfColumn, UtfTable, UtfValue};
use crate::{UTF_PAD_ALIGNMENT, UTF_PREFIX_SIZE, UTF_SIGNATURE};
use hashbrown::HashMap;

impl UtfTable {
    /// Serialize the table to container bytes.
    ///
    /// With `pad` set, the string pool is aligned to the 32-byte boundary
    /// and every data payload is padded out to it as well; nested tables
    /// inherit the flag. The row count written is the larger of the
    /// declared count and the per-row columns' length, and the row area
    /// offset is recorded even when no row records follow it.
    ///
    /// Encoding is deterministic: the same table and flag produce
    /// byte-identical output. Lengths are always written explicitly, so
    /// the output never relies on inference (but stays decodable by it).
    ///
    /// # Errors
    /// `RowCountMismatch` when a per-row column disagrees with the table's
    /// row count, `TypeMismatch` when a stored value contradicts its
    /// column's declared type, `InconsistentRow` when rows serialize to
    /// different widths, `TableTooLarge` when a section outgrows a header
    /// field
    pub fn to_bytes(&self, pad: bool) -> Result<Vec<u8>, UtfError> {
        TableWriter::encode(self, pad)
    }
}

/// Output buffer plus everything queued for the pool sections.
struct TableWriter {
    out: Vec<u8>,
    pad: bool,
    /// Pool strings in first-encounter order
    strings: Vec<String>,
    /// Dedup index into `strings`
    string_ids: HashMap<String, usize>,
    /// (placeholder position, string id) pairs to patch on flush
    string_refs: Vec<(usize, usize)>,
    /// (placeholder position, payload bytes) pairs to flush
    blobs: Vec<(usize, Vec<u8>)>,
}

impl TableWriter {
    fn encode(table: &UtfTable, pad: bool) -> Result<Vec<u8>, UtfError> {
        let rows = validated_row_count(table)?;
        let per_row: Vec<&UtfColumn> = table
            .columns
            .iter()
            .filter(|c| matches!(c.storage, ColumnStorage::PerRow(_)))
            .collect();
        let row_length: usize = per_row.iter().map(|c| c.value_type.width()).sum();
        if row_length > u16::MAX as usize {
            return Err(UtfError::TableTooLarge { size: row_length });
        }
        if table.columns.len() > u16::MAX as usize {
            return Err(UtfError::TableTooLarge {
                size: table.columns.len(),
            });
        }

        let mut w = TableWriter {
            out: Vec::new(),
            pad,
            strings: Vec::new(),
            string_ids: HashMap::new(),
            string_refs: Vec::new(),
            blobs: Vec::new(),
        };

        // ========== Prefix and sub-header ==========
        w.out.extend_from_slice(&UTF_SIGNATURE);
        push_u32(&mut w.out, 0); // total size, patched last
        w.out.push(0x00); // flags
        w.out.push(0x01); // encoding marker: UTF-8
        let rows_offset_at = w.reserve_u16();
        let strings_offset_at = w.reserve_u32();
        let data_offset_at = w.reserve_u32();
        let name_at = w.reserve_u32();
        // The name is always the first pool string, so unnamed tables
        // write an empty one and the reference stays zero.
        w.queue_string(name_at, table.name.as_deref().unwrap_or(""));
        push_u16(&mut w.out, table.columns.len() as u16);
        let row_length_at = w.reserve_u16();
        push_u32(&mut w.out, rows);

        // ========== Column directory ==========
        for column in &table.columns {
            w.out
                .push((column.value_type.code() << 4) | column.storage_kind().code());
            let name_ref_at = w.reserve_u32();
            w.queue_string(name_ref_at, &column.name);
            if let ColumnStorage::Constant(value) = &column.storage {
                w.write_value(value, column)?;
            }
        }

        // ========== Row records ==========
        // The row area offset is patched even when zero rows follow.
        let rows_start = w.out.len() - UTF_PREFIX_SIZE;
        if rows_start > u16::MAX as usize {
            return Err(UtfError::TableTooLarge { size: rows_start });
        }
        patch_u16(&mut w.out, rows_offset_at, rows_start as u16);
        patch_u16(&mut w.out, row_length_at, row_length as u16);

        for row in 0..rows {
            let row_start = w.out.len();
            for column in &per_row {
                let ColumnStorage::PerRow(values) = &column.storage else {
                    continue;
                };
                w.write_value(&values[row as usize], column)?;
            }
            let written = w.out.len() - row_start;
            if written != row_length {
                return Err(UtfError::InconsistentRow {
                    row,
                    expected: row_length,
                    actual: written,
                });
            }
        }

        // ========== String pool ==========
        let strings_rel = (w.out.len() - UTF_PREFIX_SIZE) as u32;
        patch_u32(&mut w.out, strings_offset_at, strings_rel);
        let pool_base = w.out.len();
        let mut offsets = Vec::with_capacity(w.strings.len());
        for s in &w.strings {
            offsets.push((w.out.len() - pool_base) as u32);
            w.out.extend_from_slice(s.as_bytes());
            w.out.push(0);
        }
        for &(at, id) in &w.string_refs {
            patch_u32(&mut w.out, at, offsets[id]);
        }
        if w.pad {
            let fill = (UTF_PAD_ALIGNMENT - w.out.len() % UTF_PAD_ALIGNMENT) % UTF_PAD_ALIGNMENT;
            w.out.resize(w.out.len() + fill, 0);
        }

        // ========== Data pool ==========
        let data_rel = (w.out.len() - UTF_PREFIX_SIZE) as u32;
        patch_u32(&mut w.out, data_offset_at, data_rel);
        let pool_base = w.out.len();
        let blobs = std::mem::take(&mut w.blobs);
        for (at, bytes) in &blobs {
            if bytes.len() > u32::MAX as usize {
                return Err(UtfError::TableTooLarge { size: bytes.len() });
            }
            let blob_rel = (w.out.len() - pool_base) as u32;
            patch_u32(&mut w.out, *at, blob_rel);
            patch_u32(&mut w.out, at + 4, bytes.len() as u32);
            w.out.extend_from_slice(bytes);
            if w.pad {
                // A payload that ends on the boundary still gets a full
                // block of padding (reference-writer quirk).
                let fill = UTF_PAD_ALIGNMENT - w.out.len() % UTF_PAD_ALIGNMENT;
                w.out.resize(w.out.len() + fill, 0);
            }
        }

        // ========== Final alignment and size ==========
        let fill = (4 - w.out.len() % 4) % 4;
        w.out.resize(w.out.len() + fill, 0);
        let total = w.out.len() - UTF_PREFIX_SIZE;
        if total > u32::MAX as usize {
            return Err(UtfError::TableTooLarge { size: total });
        }
        patch_u32(&mut w.out, 4, total as u32);

        Ok(w.out)
    }

    /// Emit one value. The variant must match the column's declared type;
    /// strings and data payloads only reserve their references here.
    fn write_value(&mut self, value: &UtfValue, column: &UtfColumn) -> Result<(), UtfError> {
        if value.value_type() != column.value_type {
            return Err(UtfError::TypeMismatch {
                column: column.name.clone(),
                expected: column.value_type,
                actual: value.value_type(),
            });
        }
        match value {
            UtfValue::UInt8(v) => self.out.push(*v),
            UtfValue::Int8(v) => self.out.push(*v as u8),
            UtfValue::UInt16(v) => push_u16(&mut self.out, *v),
            UtfValue::Int16(v) => push_u16(&mut self.out, *v as u16),
            UtfValue::UInt32(v) => push_u32(&mut self.out, *v),
            UtfValue::Int32(v) => push_u32(&mut self.out, *v as u32),
            UtfValue::UInt64(v) => push_u64(&mut self.out, *v),
            UtfValue::Int64(v) => push_u64(&mut self.out, *v as u64),
            UtfValue::Float32(v) => push_u32(&mut self.out, v.to_bits()),
            UtfValue::Float64(v) => push_u64(&mut self.out, v.to_bits()),
            UtfValue::String(s) => {
                let at = self.reserve_u32();
                self.queue_string(at, s);
            }
            UtfValue::Data(payload) => {
                let at = self.reserve_u32();
                self.reserve_u32();
                self.queue_blob(at, payload)?;
            }
            UtfValue::Guid(guid) => self.out.extend_from_slice(guid),
        }
        Ok(())
    }

    fn reserve_u16(&mut self) -> usize {
        let at = self.out.len();
        push_u16(&mut self.out, 0);
        at
    }

    fn reserve_u32(&mut self) -> usize {
        let at = self.out.len();
        push_u32(&mut self.out, 0);
        at
    }

    /// Record a string reference, deduplicating identical strings into one
    /// pool entry.
    fn queue_string(&mut self, patch_at: usize, s: &str) {
        let id = match self.string_ids.get(s) {
            Some(&id) => id,
            None => {
                let id = self.strings.len();
                self.string_ids.insert(s.to_owned(), id);
                self.strings.push(s.to_owned());
                id
            }
        };
        self.string_refs.push((patch_at, id));
    }

    /// Queue a payload for the data pool. Empty payloads keep their (0, 0)
    /// placeholder and never touch the pool; nested tables and banks are
    /// serialized here, in encounter order.
    fn queue_blob(&mut self, patch_at: usize, payload: &DataPayload) -> Result<(), UtfError> {
        let bytes = match payload {
            DataPayload::Blob(bytes) => bytes.clone(),
            DataPayload::Table(nested) => nested.to_bytes(self.pad)?,
            DataPayload::AudioBank(bank) => bank.to_bytes()?,
        };
        if !bytes.is_empty() {
            self.blobs.push((patch_at, bytes));
        }
        Ok(())
    }
}

/// The row count to write: the larger of the declared count and the
/// per-row columns' shared length. Every per-row column must match it.
fn validated_row_count(table: &UtfTable) -> Result<u32, UtfError> {
    let mut rows = table.declared_row_count;
    for column in &table.columns {
        if let Some(len) = column.rows() {
            rows = rows.max(len);
        }
    }
    for column in &table.columns {
        if let Some(len) = column.rows()
            && len != rows
        {
            return Err(UtfError::RowCountMismatch {
                column: column.name.clone(),
                expected: rows,
                actual: len,
            });
        }
    }
    Ok(rows)
}
