//! Pixel read-back from a renderer's framebuffer or from a surface.

use crate::error::SnapshotError;
use crate::pixel::PixelLayout;
use crate::rect::Rect;
use crate::surface::{Renderer, Surface};

/// Bytes per captured sample (alpha, blue, green, red).
const CAPTURE_BYTES_PER_PIXEL: usize = 4;

/// A block of pixels read back for saving.
///
/// Samples are laid out as [`PixelLayout::Abgr8`], rows packed with no
/// padding. `row_offsets` is derived from the dimensions when the capture is
/// taken and never changes afterwards.
#[derive(Clone, Debug)]
pub struct Capture {
    pixels: Vec<u8>,
    row_offsets: Vec<usize>,
    width: u32,
    height: u32,
}

impl Capture {
    /// Read back the renderer's visible image.
    pub fn from_renderer<R: Renderer + ?Sized>(renderer: &R) -> Result<Self, SnapshotError> {
        let rect = renderer.image_rect();
        let mut capture = Self::alloc(rect)?;
        let pitch = capture.pitch();
        renderer.read_framebuffer(&mut capture.pixels, pitch, rect);
        log::debug!("captured {}x{} framebuffer", rect.width, rect.height);
        Ok(capture)
    }

    /// Read back `region` of `surface`, or the whole surface when `region`
    /// is empty.
    ///
    /// Fails with [`SnapshotError::EmptyCapture`] if that leaves no pixels,
    /// as for a zero-sized surface.
    pub fn from_surface<S: Surface + ?Sized>(
        surface: &S,
        region: Rect,
    ) -> Result<Self, SnapshotError> {
        let rect = region.resolve_within(surface.width(), surface.height())?;
        let mut capture = Self::alloc(rect)?;
        let pitch = capture.pitch();
        surface.read_pixels(&mut capture.pixels, pitch, rect);
        log::debug!(
            "captured {}x{} at {},{} from surface",
            rect.width,
            rect.height,
            rect.x,
            rect.y
        );
        Ok(capture)
    }

    /// Zero-filled storage for `rect`; empty rectangles have nothing to
    /// read back and are refused before any allocation.
    fn alloc(rect: Rect) -> Result<Self, SnapshotError> {
        let (width, height) = (rect.width, rect.height);
        if rect.is_empty() {
            return Err(SnapshotError::EmptyCapture { width, height });
        }
        let pitch = (width as usize)
            .checked_mul(CAPTURE_BYTES_PER_PIXEL)
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;
        let len = pitch
            .checked_mul(height as usize)
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);

        let mut row_offsets = Vec::new();
        row_offsets.try_reserve_exact(height as usize)?;
        row_offsets.extend((0..height as usize).map(|row| row * pitch));

        Ok(Self {
            pixels,
            row_offsets,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * CAPTURE_BYTES_PER_PIXEL
    }

    pub fn layout(&self) -> PixelLayout {
        PixelLayout::Abgr8
    }

    /// Raw samples, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Byte offset of each row within [`Capture::pixels`].
    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }
}
