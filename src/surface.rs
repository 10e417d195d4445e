//! Collaborator interfaces for renderer-owned pixel storage.
//!
//! [`Surface`] is a 2-D buffer of native 32-bit pixels with its own source
//! rectangle. [`Renderer`] owns the visible framebuffer and the RGB to
//! native-pixel mapping. [`ImgSurface`] is an in-memory implementation of
//! both, backed by an [`imgref::ImgVec`].

use imgref::ImgVec;
use rgb::RGB8;

use crate::pixel::NativeFormat;
use crate::rect::Rect;

/// A renderer-owned surface of native packed pixels.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Grow the surface so that at least `width` x `height` pixels fit.
    fn resize(&mut self, width: u32, height: u32);

    /// Set the origin of the active source rectangle.
    fn set_src_pos(&mut self, x: u32, y: u32);

    /// Set the size of the active source rectangle.
    fn set_src_size(&mut self, width: u32, height: u32);

    /// Pixel storage and its row pitch, in pixels.
    fn base_mut(&mut self) -> (&mut [u32], usize);

    /// Read back `rect` as 4-byte alpha-first, blue-first samples.
    ///
    /// Row `i` of the rectangle starts at `buffer[i * pitch]`.
    fn read_pixels(&self, buffer: &mut [u8], pitch: usize, rect: Rect);
}

/// The renderer side of a capture: visible framebuffer and pixel mapping.
pub trait Renderer {
    /// The rectangle of the framebuffer that holds the visible image.
    fn image_rect(&self) -> Rect;

    /// Read back `rect` of the framebuffer as 4-byte alpha-first,
    /// blue-first samples, `pitch` bytes per row.
    fn read_framebuffer(&self, buffer: &mut [u8], pitch: usize, rect: Rect);

    /// Map an RGB triple to the renderer's native pixel value.
    fn map_rgb(&self, rgb: RGB8) -> u32;
}

/// In-memory surface of native pixels.
///
/// Doubles as a [`Renderer`] whose visible image is the active source
/// rectangle, or the whole surface while no source size is set.
#[derive(Clone, Debug)]
pub struct ImgSurface {
    pixels: ImgVec<u32>,
    format: NativeFormat,
    src: Rect,
}

impl ImgSurface {
    /// Create a zero-filled surface. Either dimension may be zero.
    pub fn new(width: u32, height: u32, format: NativeFormat) -> Self {
        Self {
            pixels: blank(width as usize, height as usize),
            format,
            src: Rect::default(),
        }
    }

    /// Fill a surface by mapping each position through `f`.
    pub fn from_fn(
        width: u32,
        height: u32,
        format: NativeFormat,
        mut f: impl FnMut(u32, u32) -> RGB8,
    ) -> Self {
        let mut surface = Self::new(width, height, format);
        let stride = surface.pixels.stride();
        let buf = &mut surface.pixels.buf_mut()[..];
        for y in 0..height {
            for x in 0..width {
                buf[y as usize * stride + x as usize] = format.map_rgb(f(x, y));
            }
        }
        surface
    }

    pub fn format(&self) -> NativeFormat {
        self.format
    }

    /// The active source rectangle.
    pub fn src_rect(&self) -> Rect {
        self.src
    }

    /// Native pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels.buf()[y as usize * self.pixels.stride() + x as usize]
    }

    /// RGB value of the pixel at (`x`, `y`).
    pub fn rgb(&self, x: u32, y: u32) -> RGB8 {
        self.format.unpack(self.pixel(x, y))
    }

    pub fn as_img(&self) -> &ImgVec<u32> {
        &self.pixels
    }

    fn read_rect_abgr(&self, buffer: &mut [u8], pitch: usize, rect: Rect) {
        let width = rect.width as usize * 4;
        let region = self.pixels.as_ref().sub_image(
            rect.x as usize,
            rect.y as usize,
            rect.width as usize,
            rect.height as usize,
        );
        for (src_row, dst_row) in region.rows().zip(buffer.chunks_mut(pitch)) {
            for (&px, out) in src_row.iter().zip(dst_row[..width].chunks_exact_mut(4)) {
                self.format.write_abgr(px, out);
            }
        }
    }
}

/// imgref wants a non-zero stride even for an empty image.
fn blank(width: usize, height: usize) -> ImgVec<u32> {
    let stride = width.max(1);
    ImgVec::new_stride(vec![0; stride * height], width, height, stride)
}

impl Surface for ImgSurface {
    fn width(&self) -> u32 {
        self.pixels.width() as u32
    }

    fn height(&self) -> u32 {
        self.pixels.height() as u32
    }

    fn resize(&mut self, width: u32, height: u32) {
        let w = self.pixels.width().max(width as usize);
        let h = self.pixels.height().max(height as usize);
        if (w, h) != (self.pixels.width(), self.pixels.height()) {
            log::debug!("surface grows to {w}x{h}");
            self.pixels = blank(w, h);
        }
    }

    fn set_src_pos(&mut self, x: u32, y: u32) {
        self.src.x = x;
        self.src.y = y;
    }

    fn set_src_size(&mut self, width: u32, height: u32) {
        self.src.width = width;
        self.src.height = height;
    }

    fn base_mut(&mut self) -> (&mut [u32], usize) {
        let stride = self.pixels.stride();
        (&mut self.pixels.buf_mut()[..], stride)
    }

    fn read_pixels(&self, buffer: &mut [u8], pitch: usize, rect: Rect) {
        self.read_rect_abgr(buffer, pitch, rect);
    }
}

impl Renderer for ImgSurface {
    fn image_rect(&self) -> Rect {
        if self.src.is_empty() {
            Rect::with_size(self.width(), self.height())
        } else {
            self.src
        }
    }

    fn read_framebuffer(&self, buffer: &mut [u8], pitch: usize, rect: Rect) {
        self.read_rect_abgr(buffer, pitch, rect);
    }

    fn map_rgb(&self, rgb: RGB8) -> u32 {
        self.format.map_rgb(rgb)
    }
}
