use crate::error::SnapshotError;

/// A pixel rectangle on a surface or framebuffer.
///
/// An empty rectangle (zero width or height) stands for "the whole surface"
/// when passed as a capture region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `width` x `height`.
    pub const fn with_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Resolve a capture region against a surface of `width` x `height`.
    ///
    /// Empty regions expand to the full extent; regions reaching past the
    /// surface edge are rejected.
    pub(crate) fn resolve_within(self, width: u32, height: u32) -> Result<Rect, SnapshotError> {
        if self.is_empty() {
            return Ok(Rect::with_size(width, height));
        }
        if self.right() > u64::from(width) || self.bottom() > u64::from(height) {
            return Err(SnapshotError::InvalidRegion {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                bound_width: width,
                bound_height: height,
            });
        }
        Ok(self)
    }
}
