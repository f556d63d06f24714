//! AFS2 bank serialization.

use crate::{AFS2_HEADER_SIZE, AFS2_MAX_ENTRIES, AFS2_SIGNATURE, AwbBank, AwbError, align_up};

impl AwbBank {
    /// Serialize the bank back to container bytes.
    ///
    /// Stored offsets are the unpadded end of the previous entry and the
    /// gaps up to the alignment are zero-filled, so a parse/serialize pass
    /// over a canonical container reproduces it byte for byte.
    ///
    /// # Errors
    /// Returns `AwbError` when the bank parameters are unsupported or a
    /// payload offset does not fit the stored offset width
    pub fn to_bytes(&self) -> Result<Vec<u8>, AwbError> {
        if self.version != 1 && self.version != 2 {
            return Err(AwbError::UnsupportedVersion(self.version));
        }
        if self.offset_size != 2 && self.offset_size != 4 {
            return Err(AwbError::UnsupportedOffsetSize(self.offset_size));
        }
        if self.entries.len() > AFS2_MAX_ENTRIES {
            return Err(AwbError::TooManyEntries(self.entries.len()));
        }

        let count = self.entries.len();
        let offsets_start = AFS2_HEADER_SIZE + count * 2;
        let index_end = offsets_start + (count + 1) * self.offset_size as usize;

        let mut out = Vec::with_capacity(index_end);
        out.extend_from_slice(&AFS2_SIGNATURE);
        out.push(self.version);
        out.push(self.offset_size);
        push_u16_le(&mut out, 2); // id width
        push_u32_le(&mut out, count as u32);
        push_u16_le(&mut out, self.alignment);
        push_u16_le(&mut out, self.subkey);

        for entry in &self.entries {
            push_u16_le(&mut out, entry.id);
        }

        // Offset row is back-patched once payload positions are known.
        out.resize(index_end, 0);

        let mut offsets = Vec::with_capacity(count + 1);
        for entry in &self.entries {
            offsets.push(out.len());
            let aligned = align_up(out.len(), self.alignment);
            out.resize(aligned, 0);
            out.extend_from_slice(&entry.data);
        }
        offsets.push(out.len());

        for (i, &offset) in offsets.iter().enumerate() {
            let at = offsets_start + i * self.offset_size as usize;
            match self.offset_size {
                2 => {
                    if offset > u16::MAX as usize {
                        return Err(AwbError::OffsetOverflow(offset));
                    }
                    out[at..at + 2].copy_from_slice(&(offset as u16).to_le_bytes());
                }
                _ => {
                    if offset > u32::MAX as usize {
                        return Err(AwbError::OffsetOverflow(offset));
                    }
                    out[at..at + 4].copy_from_slice(&(offset as u32).to_le_bytes());
                }
            }
        }

        Ok(out)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn push_u16_le(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_awb;

    fn create_test_bank() -> AwbBank {
        let mut bank = AwbBank::new(32);
        bank.add_entry(7, vec![0xAA; 5]).add_entry(9, vec![0xBB; 3]);
        bank
    }

    #[test]
    fn test_layout_positions() {
        let bytes = create_test_bank().to_bytes().unwrap();

        // Index: 16-byte header + 2 ids + 3 u32 offsets = 0x20.
        // Entry 0 lands right on the boundary, entry 1 at the next one.
        assert_eq!(bytes.len(), 0x43);
        assert_eq!(bytes[0x20], 0xAA);
        assert_eq!(bytes[0x40], 0xBB);
        // Stored offsets: index end, entry 0 end, container end.
        assert_eq!(bytes[0x14..0x18], 0x20u32.to_le_bytes());
        assert_eq!(bytes[0x18..0x1C], 0x25u32.to_le_bytes());
        assert_eq!(bytes[0x1C..0x20], 0x43u32.to_le_bytes());
        // Alignment gap is zero-filled.
        assert!(bytes[0x25..0x40].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_roundtrip() {
        let bank = create_test_bank();
        let bytes = bank.to_bytes().unwrap();
        let parsed = parse_awb(&bytes).unwrap();

        assert_eq!(parsed, bank);
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let bank = create_test_bank();
        let first = bank.to_bytes().unwrap();
        let second = parse_awb(&first).unwrap().to_bytes().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_roundtrip_empty() {
        let bank = AwbBank::new(32);
        let bytes = bank.to_bytes().unwrap();

        assert_eq!(bytes.len(), AFS2_HEADER_SIZE + 4);
        assert_eq!(parse_awb(&bytes).unwrap(), bank);
    }

    #[test]
    fn test_roundtrip_u16_offsets() {
        let mut bank = AwbBank::new(4);
        bank.offset_size = 2;
        bank.add_entry(1, vec![1, 2, 3]).add_entry(2, vec![4]);

        let bytes = bank.to_bytes().unwrap();
        let parsed = parse_awb(&bytes).unwrap();

        assert_eq!(parsed, bank);
    }

    #[test]
    fn test_roundtrip_version2_subkey() {
        let mut bank = AwbBank::new(32);
        bank.version = 2;
        bank.subkey = 0x1234;
        bank.add_entry(0, vec![0x10; 40]);

        let parsed = parse_awb(&bank.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.version, 2);
        assert_eq!(parsed.subkey, 0x1234);
    }

    #[test]
    fn test_offset_overflow_u16() {
        let mut bank = AwbBank::new(1);
        bank.offset_size = 2;
        bank.add_entry(0, vec![0; 0x1_0000]);

        assert!(matches!(
            bank.to_bytes(),
            Err(AwbError::OffsetOverflow(_))
        ));
    }

    #[test]
    fn test_unaligned_bank() {
        // Alignment 0 packs payloads back to back.
        let mut bank = AwbBank::new(0);
        bank.add_entry(1, vec![0x11]).add_entry(2, vec![0x22]);

        let bytes = bank.to_bytes().unwrap();
        let index_end = AFS2_HEADER_SIZE + 2 * 2 + 3 * 4;
        assert_eq!(bytes[index_end], 0x11);
        assert_eq!(bytes[index_end + 1], 0x22);
        assert_eq!(parse_awb(&bytes).unwrap(), bank);
    }
}
