//! Primitive big-endian reads and writes over raw buffers.
//!
//! Every multi-byte integer and float in the table container is big-endian.
//! Reads are bounds-checked and fail with [`UtfError::OutOfRange`]; they
//! never truncate silently. Writes append to a growable buffer; the
//! `patch_*` functions overwrite placeholder bytes the encoder reserved
//! earlier.

use crate::error::UtfError;

// =============================================================================
// Reads
// =============================================================================

/// Borrow `count` bytes at `offset`, or fail without reading anything.
pub fn read_bytes(data: &[u8], offset: usize, count: usize) -> Result<&[u8], UtfError> {
    offset
        .checked_add(count)
        .filter(|&end| end <= data.len())
        .map(|end| &data[offset..end])
        .ok_or(UtfError::OutOfRange { offset, count })
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, UtfError> {
    let bytes = read_bytes(data, offset, 1)?;
    Ok(bytes[0])
}

pub fn read_i8(data: &[u8], offset: usize) -> Result<i8, UtfError> {
    Ok(read_u8(data, offset)? as i8)
}

pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, UtfError> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub fn read_i16(data: &[u8], offset: usize) -> Result<i16, UtfError> {
    Ok(read_u16(data, offset)? as i16)
}

pub fn read_u32(data: &[u8], offset: usize) -> Result<u32, UtfError> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn read_i32(data: &[u8], offset: usize) -> Result<i32, UtfError> {
    Ok(read_u32(data, offset)? as i32)
}

pub fn read_u64(data: &[u8], offset: usize) -> Result<u64, UtfError> {
    let bytes = read_bytes(data, offset, 8)?;
    Ok(u64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

pub fn read_i64(data: &[u8], offset: usize) -> Result<i64, UtfError> {
    Ok(read_u64(data, offset)? as i64)
}

pub fn read_f32(data: &[u8], offset: usize) -> Result<f32, UtfError> {
    Ok(f32::from_bits(read_u32(data, offset)?))
}

pub fn read_f64(data: &[u8], offset: usize) -> Result<f64, UtfError> {
    Ok(f64::from_bits(read_u64(data, offset)?))
}

/// Read a nul-terminated UTF-8 string starting at `offset`.
///
/// Fails with `OutOfRange` when no terminator exists before the end of the
/// buffer, and `InvalidString` when the bytes are not UTF-8.
pub fn read_cstring(data: &[u8], offset: usize) -> Result<String, UtfError> {
    let tail = data.get(offset..).ok_or(UtfError::OutOfRange {
        offset,
        count: 1,
    })?;
    let nul = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(UtfError::OutOfRange {
            offset: data.len(),
            count: 1,
        })?;
    core::str::from_utf8(&tail[..nul])
        .map(str::to_owned)
        .map_err(|_| UtfError::InvalidString { offset })
}

// =============================================================================
// Writes
// =============================================================================

pub fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Overwrite a previously reserved u16 placeholder.
///
/// Reservations are recorded at positions the encoder has already written,
/// so the range is always in bounds.
pub fn patch_u16(out: &mut [u8], offset: usize, value: u16) {
    out[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Overwrite a previously reserved u32 placeholder.
pub fn patch_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];

        assert_eq!(read_u8(&data, 0).unwrap(), 0x12);
        assert_eq!(read_u16(&data, 0).unwrap(), 0x1234);
        assert_eq!(read_u32(&data, 0).unwrap(), 0x1234_5678);
        assert_eq!(read_u64(&data, 0).unwrap(), 0x1234_5678_9ABC_DEF0);
        assert_eq!(read_u16(&data, 3).unwrap(), 0x789A);
    }

    #[test]
    fn test_read_signed_and_floats() {
        assert_eq!(read_i8(&[0xFF], 0).unwrap(), -1);
        assert_eq!(read_i16(&[0xFF, 0xFE], 0).unwrap(), -2);
        assert_eq!(read_i32(&[0xFF, 0xFF, 0xFF, 0xFD], 0).unwrap(), -3);

        let bits = 1.5f32.to_bits().to_be_bytes();
        assert_eq!(read_f32(&bits, 0).unwrap(), 1.5);
        let bits = (-2.25f64).to_bits().to_be_bytes();
        assert_eq!(read_f64(&bits, 0).unwrap(), -2.25);
    }

    #[test]
    fn test_read_out_of_range() {
        let data = [0u8; 4];

        assert_eq!(
            read_u32(&data, 1),
            Err(UtfError::OutOfRange { offset: 1, count: 4 })
        );
        assert_eq!(
            read_u8(&data, 4),
            Err(UtfError::OutOfRange { offset: 4, count: 1 })
        );
        assert!(read_bytes(&data, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_read_cstring() {
        let data = b"ab\0cd\0";

        assert_eq!(read_cstring(data, 0).unwrap(), "ab");
        assert_eq!(read_cstring(data, 3).unwrap(), "cd");
        assert_eq!(read_cstring(data, 2).unwrap(), "");
    }

    #[test]
    fn test_read_cstring_unterminated() {
        assert!(matches!(
            read_cstring(b"abc", 0),
            Err(UtfError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_read_cstring_invalid_utf8() {
        assert_eq!(
            read_cstring(&[0xFF, 0xFE, 0x00], 0),
            Err(UtfError::InvalidString { offset: 0 })
        );
    }

    #[test]
    fn test_push_and_patch() {
        let mut out = Vec::new();
        push_u16(&mut out, 0xBEEF);
        push_u32(&mut out, 0);
        push_u64(&mut out, 1);
        assert_eq!(out.len(), 14);
        assert_eq!(out[0], 0xBE);

        patch_u32(&mut out, 2, 0xDEAD_BEEF);
        assert_eq!(read_u32(&out, 2).unwrap(), 0xDEAD_BEEF);
        patch_u16(&mut out, 0, 0x1234);
        assert_eq!(read_u16(&out, 0).unwrap(), 0x1234);
    }
}
