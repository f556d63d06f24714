//! AFS2 bank decoding.

use crate::{AFS2_HEADER_SIZE, AFS2_MAX_ENTRIES, AFS2_SIGNATURE, AwbBank, AwbEntry, AwbError, align_up};

/// Parse a complete AFS2 container.
///
/// # Arguments
/// * `data` - The full container, starting at the "AFS2" magic
///
/// # Returns
/// The decoded bank with entries in stored order
///
/// # Errors
/// Returns `AwbError` when the header is malformed, the index does not fit,
/// or any entry extends past the end of the buffer
pub fn parse_awb(data: &[u8]) -> Result<AwbBank, AwbError> {
    if data.len() < AFS2_HEADER_SIZE {
        return Err(AwbError::TooSmall(data.len()));
    }
    if data[0..4] != AFS2_SIGNATURE {
        return Err(AwbError::InvalidMagic);
    }

    let version = data[4];
    if version != 1 && version != 2 {
        return Err(AwbError::UnsupportedVersion(version));
    }
    let offset_size = data[5];
    if offset_size != 2 && offset_size != 4 {
        return Err(AwbError::UnsupportedOffsetSize(offset_size));
    }
    let id_size = read_u16_le(data, 0x06);
    if id_size != 2 {
        return Err(AwbError::UnsupportedIdSize(id_size));
    }
    let count = read_u32_le(data, 0x08) as usize;
    if count > AFS2_MAX_ENTRIES {
        return Err(AwbError::TooManyEntries(count));
    }
    let alignment = read_u16_le(data, 0x0C);
    let subkey = read_u16_le(data, 0x0E);

    let ids_start = AFS2_HEADER_SIZE;
    let offsets_start = ids_start + count * 2;
    let index_end = offsets_start + (count + 1) * offset_size as usize;
    if index_end > data.len() {
        return Err(AwbError::TruncatedIndex);
    }

    let read_offset = |i: usize| -> usize {
        let at = offsets_start + i * offset_size as usize;
        match offset_size {
            2 => read_u16_le(data, at) as usize,
            _ => read_u32_le(data, at) as usize,
        }
    };

    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let id = read_u16_le(data, ids_start + i * 2);
        // Stored offsets are the unpadded end of the previous entry.
        let start = align_up(read_offset(i), alignment);
        let end = read_offset(i + 1);
        if end < start {
            return Err(AwbError::EntryOutOfOrder { index: i });
        }
        if end > data.len() {
            return Err(AwbError::TruncatedData { index: i });
        }
        entries.push(AwbEntry {
            id,
            data: data[start..end].to_vec(),
        });
    }

    Ok(AwbBank {
        version,
        offset_size,
        alignment,
        subkey,
        entries,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
