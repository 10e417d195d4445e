use rgb::RGB8;

/// Byte layout of a caller-supplied pixel buffer handed to the encoder.
///
/// Read-back from a renderer delivers [`PixelLayout::Abgr8`]; the other
/// layouts exist for callers that already hold pixels in another order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelLayout {
    /// 4 bytes: alpha, blue, green, red.
    #[default]
    Abgr8,
    /// 4 bytes: alpha, red, green, blue.
    Argb8,
    /// 4 bytes: blue, green, red, alpha.
    Bgra8,
    /// 4 bytes: red, green, blue, alpha.
    Rgba8,
    /// 3 bytes: red, green, blue.
    Rgb8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Abgr8 | Self::Argb8 | Self::Bgra8 | Self::Rgba8 => 4,
        }
    }

    /// Byte offsets of the red, green and blue samples within one pixel.
    pub(crate) fn rgb_offsets(&self) -> [usize; 3] {
        match self {
            Self::Abgr8 => [3, 2, 1],
            Self::Argb8 => [1, 2, 3],
            Self::Bgra8 => [2, 1, 0],
            Self::Rgba8 | Self::Rgb8 => [0, 1, 2],
        }
    }

    /// Pack one row of this layout into 8-bit RGB triples.
    ///
    /// `src` must hold at least `dst.len() / 3` pixels.
    pub(crate) fn pack_rgb_row(&self, src: &[u8], dst: &mut [u8]) {
        let [r, g, b] = self.rgb_offsets();
        for (px, out) in src
            .chunks_exact(self.bytes_per_pixel())
            .zip(dst.chunks_exact_mut(3))
        {
            out[0] = px[r];
            out[1] = px[g];
            out[2] = px[b];
        }
    }
}

/// Channel positions of a native packed 32-bit pixel.
///
/// Maps decoded RGB triples into the surface's pixel format and unpacks
/// surface pixels during read-back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeFormat {
    pub r_shift: u32,
    pub g_shift: u32,
    pub b_shift: u32,
    /// `None` for formats with an unused fourth byte.
    pub a_shift: Option<u32>,
}

impl NativeFormat {
    /// `0xAARRGGBB`
    pub const ARGB8888: Self = Self {
        r_shift: 16,
        g_shift: 8,
        b_shift: 0,
        a_shift: Some(24),
    };

    /// `0xAABBGGRR`
    pub const ABGR8888: Self = Self {
        r_shift: 0,
        g_shift: 8,
        b_shift: 16,
        a_shift: Some(24),
    };

    /// `0x00RRGGBB`
    pub const XRGB8888: Self = Self {
        r_shift: 16,
        g_shift: 8,
        b_shift: 0,
        a_shift: None,
    };

    /// Map an RGB triple to an opaque native pixel.
    pub fn map_rgb(&self, rgb: RGB8) -> u32 {
        let alpha = self.a_shift.map_or(0, |s| 0xFF << s);
        alpha
            | (u32::from(rgb.r) << self.r_shift)
            | (u32::from(rgb.g) << self.g_shift)
            | (u32::from(rgb.b) << self.b_shift)
    }

    /// Extract the RGB triple from a native pixel.
    pub fn unpack(&self, pixel: u32) -> RGB8 {
        RGB8 {
            r: (pixel >> self.r_shift) as u8,
            g: (pixel >> self.g_shift) as u8,
            b: (pixel >> self.b_shift) as u8,
        }
    }

    /// Write a native pixel as the 4-byte alpha-first, blue-first sample
    /// that renderer read-back produces.
    pub(crate) fn write_abgr(&self, pixel: u32, out: &mut [u8]) {
        let rgb = self.unpack(pixel);
        out[0] = self.a_shift.map_or(0xFF, |s| (pixel >> s) as u8);
        out[1] = rgb.b;
        out[2] = rgb.g;
        out[3] = rgb.r;
    }
}

impl Default for NativeFormat {
    fn default() -> Self {
        Self::ARGB8888
    }
}
