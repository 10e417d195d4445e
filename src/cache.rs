//! Reusable decode buffer.
//!
//! Repeated loads of same-or-smaller images reuse one RGB byte buffer and
//! one row-offset table. Both only ever grow. The row offsets are derived
//! from the buffer and the current image dimensions, and are recomputed on
//! every [`DecodeCache::ensure_capacity`] call.

use crate::error::SnapshotError;

/// Bytes per decoded pixel (8-bit RGB).
pub const DECODE_BYTES_PER_PIXEL: usize = 3;

/// Bytes a `width` x `height` image needs from the cache: its RGB rows plus
/// one row offset per row. Saturates rather than overflowing.
pub(crate) fn footprint(width: u32, height: u32) -> u64 {
    let rows = u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(DECODE_BYTES_PER_PIXEL as u64);
    let offsets = u64::from(height).saturating_mul(size_of::<usize>() as u64);
    rows.saturating_add(offsets)
}

/// Decode buffer shared by consecutive loads.
///
/// Owned by whoever issues decode requests and passed into each load.
/// Not synchronized: one decode at a time per cache.
///
/// After a failed load the cache describes no image (zero width and
/// height, no rows) but keeps its allocations for the next load.
#[derive(Debug, Default)]
pub struct DecodeCache {
    buffer: Vec<u8>,
    row_offsets: Vec<usize>,
    width: u32,
    height: u32,
    pitch: usize,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for a `width` x `height` RGB image.
    ///
    /// Reallocates only when the image needs more bytes (or rows) than the
    /// cache currently holds; the dimensions, pitch and row offsets always
    /// reflect the new image.
    pub fn ensure_capacity(&mut self, width: u32, height: u32) -> Result<(), SnapshotError> {
        let pitch = (width as usize)
            .checked_mul(DECODE_BYTES_PER_PIXEL)
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;
        let required = pitch
            .checked_mul(height as usize)
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;

        if required > self.buffer.len() {
            let mut buffer = Vec::new();
            buffer.try_reserve_exact(required)?;
            buffer.resize(required, 0);
            log::debug!(
                "decode buffer grows from {} to {required} bytes",
                self.buffer.len()
            );
            self.buffer = buffer;
        } else {
            log::trace!(
                "decode buffer reused ({required} of {} bytes)",
                self.buffer.len()
            );
        }

        let rows = height as usize;
        if rows > self.row_offsets.len() {
            let mut row_offsets = Vec::new();
            row_offsets.try_reserve_exact(rows)?;
            row_offsets.resize(rows, 0);
            self.row_offsets = row_offsets;
        }

        self.width = width;
        self.height = height;
        self.pitch = pitch;

        for (row, offset) in self.row_offsets[..rows].iter_mut().enumerate() {
            *offset = row * pitch;
        }
        Ok(())
    }

    /// Drop the current image's dimensions, keeping both allocations.
    pub(crate) fn forget_image(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pitch = 0;
    }

    /// Allocated size of the pixel buffer, in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of rows the offset table can hold.
    pub fn row_capacity(&self) -> usize {
        self.row_offsets.len()
    }

    /// Width of the most recently sized image.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the most recently sized image.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row of the current image.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Byte offset of each row of the current image, one per row.
    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets[..self.height as usize]
    }

    /// RGB bytes of row `index` of the current image.
    pub fn row(&self, index: usize) -> &[u8] {
        let start = self.row_offsets()[index];
        &self.buffer[start..start + self.pitch]
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut [u8] {
        let start = self.row_offsets[..self.height as usize][index];
        &mut self.buffer[start..start + self.pitch]
    }

    /// Rows of the current image, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height as usize).map(move |i| self.row(i))
    }
}
