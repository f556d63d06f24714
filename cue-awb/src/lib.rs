//! Cue-AWB: AFS2 (AWB) indexed audio container
//!
//! AFS2 is the audio half of the cue-bank format family: a flat archive of
//! audio payloads addressed by 16-bit cue ids. Cue tables embed whole AFS2
//! banks inside data cells (the `cue-table` crate hands those cells to this
//! crate and never looks inside them).
//!
//! **Payloads are opaque bytes.** Decoding the audio inside them (HCA, ADX,
//! ATRAC9) is deliberately out of scope.
//!
//! Unlike the big-endian table container, AFS2 is **little-endian**
//! throughout.
//!
//! # Container Format
//!
//! ```text
//! Header (16 bytes):
//!   0x00: "AFS2" magic
//!   0x04: version (u8, 1 or 2)
//!   0x05: offset width in bytes (u8, 4 or 2)
//!   0x06: id width in bytes (u16 LE, always 2)
//!   0x08: entry count (u32 LE)
//!   0x0C: payload alignment (u16 LE)
//!   0x0E: subkey (u16 LE, version 2 only, else 0)
//!
//! Index:
//!   entry ids:  count x u16 LE
//!   offsets:    (count + 1) x offset-width LE, ascending; the extra final
//!               offset is the container end
//!
//! Payloads:
//!   entry i starts at offsets[i] rounded up to the alignment and ends at
//!   offsets[i + 1]. Stored offsets are the unpadded end of the previous
//!   entry; readers align them up, writers fill the gap with zeroes.
//! ```
//!
//! # Usage
//!
//! ```
//! use cue_awb::{AwbBank, parse_awb};
//!
//! let mut bank = AwbBank::new(32);
//! bank.add_entry(0, vec![0xAA; 100]);
//! bank.add_entry(1, vec![0xBB; 50]);
//!
//! let bytes = bank.to_bytes().unwrap();
//! let parsed = parse_awb(&bytes).unwrap();
//! assert_eq!(parsed, bank);
//! ```

mod parser;
mod writer;

pub use parser::parse_awb;

// =============================================================================
// Constants
// =============================================================================

/// AFS2 container magic
pub const AFS2_SIGNATURE: [u8; 4] = *b"AFS2";

/// Fixed header size preceding the id row
pub const AFS2_HEADER_SIZE: usize = 0x10;

/// Upper bound on entries (ids are u16, a bank can never index more)
pub const AFS2_MAX_ENTRIES: usize = 0x1_0000;

// =============================================================================
// Types
// =============================================================================

/// A parsed AFS2 bank: container parameters plus id-addressed payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwbBank {
    /// Container version (1, or 2 when a subkey is carried)
    pub version: u8,
    /// Width of stored offsets in bytes (4, or 2 for tiny banks)
    pub offset_size: u8,
    /// Payload alignment in bytes (0x20 in the wild; 0 or 1 means none)
    pub alignment: u16,
    /// Per-bank stream subkey (version 2 only; opaque to this crate)
    pub subkey: u16,
    /// Entries in stored order
    pub entries: Vec<AwbEntry>,
}

/// One payload in a bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwbEntry {
    /// Cue id (the key cue tables refer to this payload by)
    pub id: u16,
    /// Opaque audio payload
    pub data: Vec<u8>,
}

impl AwbBank {
    /// Create an empty version-1 bank with u32 offsets and the given
    /// payload alignment.
    pub fn new(alignment: u16) -> Self {
        Self {
            version: 1,
            offset_size: 4,
            alignment,
            subkey: 0,
            entries: Vec::new(),
        }
    }

    /// Append a payload under a cue id.
    pub fn add_entry(&mut self, id: u16, data: Vec<u8>) -> &mut Self {
        self.entries.push(AwbEntry { id, data });
        self
    }

    /// Look up an entry by cue id.
    ///
    /// Banks hold a few dozen entries at most, so this is a linear scan.
    pub fn entry(&self, id: u16) -> Option<&AwbEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Number of entries in the bank.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the bank holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Errors from parsing or serializing an AFS2 bank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AwbError {
    /// Buffer ends before the fixed header does
    #[error("buffer too small for AFS2 header ({0} bytes)")]
    TooSmall(usize),
    /// First four bytes are not the AFS2 magic
    #[error("missing AFS2 magic")]
    InvalidMagic,
    /// Version byte is neither 1 nor 2
    #[error("unsupported AFS2 version {0}")]
    UnsupportedVersion(u8),
    /// Stored offset width is neither 2 nor 4
    #[error("unsupported offset width {0} (expected 2 or 4)")]
    UnsupportedOffsetSize(u8),
    /// Stored id width is not 2
    #[error("unsupported id width {0} (expected 2)")]
    UnsupportedIdSize(u16),
    /// Declared entry count exceeds the 16-bit id space
    #[error("entry count {0} exceeds the 16-bit id space")]
    TooManyEntries(usize),
    /// Id and offset rows extend past the end of the container
    #[error("id and offset rows extend past the end of the container")]
    TruncatedIndex,
    /// An entry payload extends past the end of the container
    #[error("container truncated inside entry {index}")]
    TruncatedData { index: usize },
    /// Offsets are not ascending
    #[error("entry {index} ends before it starts (offsets not ascending)")]
    EntryOutOfOrder { index: usize },
    /// A computed offset does not fit the stored offset width
    #[error("offset 0x{0:X} does not fit the stored offset width")]
    OffsetOverflow(usize),
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Round an offset up to the next multiple of `alignment`.
#[inline]
pub(crate) fn align_up(offset: usize, alignment: u16) -> usize {
    if alignment <= 1 {
        return offset;
    }
    offset.div_ceil(alignment as usize) * alignment as usize
}
