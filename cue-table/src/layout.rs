//! Canonical cell order and data-length inference.
//!
//! Data cells carry an offset into the data pool and a byte length, but
//! reference encoders routinely store a zero length for cells holding
//! nested containers. The real length is recoverable because payloads are
//! flushed in one canonical order: every Constant cell in directory order,
//! then row 0's PerRow cells in directory order, then row 1's, and so on.
//! A cell's payload therefore ends where the next cell's begins.
//!
//! The decoder collects one descriptor per data cell in exactly that
//! order, resolves lengths here, then materializes payloads and discards
//! the descriptors.

use crate::table::UtfColumn;
use crate::{AWB_COLUMN_NAME, UTF_SIGNATURE};
use cue_awb::AFS2_SIGNATURE;

/// One unresolved data cell, in canonical write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataCell {
    /// Offset relative to the data-pool start, as stored in the cell
    pub rel_offset: u32,
    /// Absolute buffer offset of the payload
    pub abs_offset: usize,
    /// Length as stored; zero means "infer or empty"
    pub length: u32,
    /// Directory index of the owning column
    pub column: usize,
    /// Owning row for PerRow cells, `None` for Constant cells
    pub row: Option<u32>,
}

/// True when the buffer holds a recognized container signature at `offset`.
pub(crate) fn sniff_container(data: &[u8], offset: usize) -> bool {
    data.get(offset..offset + 4)
        .is_some_and(|head| head == UTF_SIGNATURE || head == AFS2_SIGNATURE)
}

/// True when an AFS2 payload in this column should decode as an audio bank.
///
/// Only the reserved column name qualifies; other columns can carry AFS2
/// header fragments that must stay raw.
pub(crate) fn is_awb_column(columns: &[UtfColumn], column: usize) -> bool {
    columns[column].name == AWB_COLUMN_NAME
}

/// Resolve zero declared lengths against neighbouring offsets.
///
/// Only cells whose stored length is zero *and* whose payload starts with a
/// container signature are resolved (`is_container` answers for a cell); a
/// zero length without a signature is a genuinely empty cell. `pool_len`
/// is the container end expressed relative to the data-pool start.
///
/// For an eligible cell:
/// - next cell's offset nonzero: length is the offset gap. Adjacent cells
///   at the same offset alias one payload and resolve to zero here; the
///   forward scan is not entered in that case.
/// - next cell's offset zero: scan forward past all zero-offset cells to
///   the first nonzero one; if none exists the payload runs to the
///   container end.
/// - last cell: runs to the container end, unless its own offset is zero
///   after some earlier cell had a nonzero one (then it is empty).
///
/// Subtractions saturate so that malformed non-ascending offsets resolve
/// to empty cells instead of huge bogus lengths.
pub(crate) fn infer_lengths(
    cells: &mut [DataCell],
    pool_len: u32,
    is_container: impl Fn(&DataCell) -> bool,
) {
    let mut saw_nonzero = false;
    for i in 0..cells.len() {
        let cell = cells[i];
        if cell.length == 0 && is_container(&cell) {
            let inferred = if i + 1 < cells.len() {
                let next = cells[i + 1];
                if next.rel_offset != 0 {
                    next.rel_offset.saturating_sub(cell.rel_offset)
                } else {
                    match cells[i + 1..].iter().find(|c| c.rel_offset != 0) {
                        Some(next) => next.rel_offset.saturating_sub(cell.rel_offset),
                        None => pool_len.saturating_sub(cell.rel_offset),
                    }
                }
            } else if cell.rel_offset == 0 && saw_nonzero {
                0
            } else {
                pool_len.saturating_sub(cell.rel_offset)
            };
            cells[i].length = inferred;
        }
        if cell.rel_offset != 0 {
            saw_nonzero = true;
        }
    }
}
