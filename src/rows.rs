//! Row table over a caller-supplied output buffer.
//!
//! Row `i` of the image lives at `i * stride .. (i + 1) * stride` of the
//! buffer: no padding, no gaps, no overlap. The table borrows the buffer
//! for a single decode call.

use std::ops::Range;

use crate::error::PngReadError;

/// Byte ranges of `height` rows spaced `stride` bytes apart.
pub fn row_ranges(height: usize, stride: usize) -> impl ExactSizeIterator<Item = Range<usize>> {
    (0..height).map(move |i| i * stride..(i + 1) * stride)
}

/// Mutable per-row views into one contiguous buffer.
pub(crate) struct RowTable<'a> {
    rows: Vec<&'a mut [u8]>,
}

impl<'a> RowTable<'a> {
    /// Split the first `height * stride` bytes of `buffer` into rows.
    pub(crate) fn new(
        buffer: &'a mut [u8],
        height: usize,
        stride: usize,
    ) -> Result<Self, PngReadError> {
        let needed = height
            .checked_mul(stride)
            .ok_or(PngReadError::InvalidOperation("row table size overflows"))?;
        if buffer.len() < needed {
            return Err(PngReadError::BufferTooSmall {
                needed,
                actual: buffer.len(),
            });
        }
        if stride == 0 {
            return Err(PngReadError::InvalidOperation("row stride is zero"));
        }
        let mut rest = &mut buffer[..needed];
        let mut consumed = 0;
        let mut rows = Vec::with_capacity(height);
        for range in row_ranges(height, stride) {
            debug_assert_eq!(range.start, consumed);
            let (row, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rows.push(row);
            rest = tail;
            consumed = range.end;
        }
        Ok(Self { rows })
    }

    pub(crate) fn height(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        self.rows.get_mut(y).map(|row| &mut **row)
    }
}
