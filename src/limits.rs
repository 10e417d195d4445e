use crate::cache::footprint;
use crate::error::SnapshotError;

/// Bounds on the images a load will accept.
///
/// Checked once the PNG header is read, before the decode cache grows or
/// any image data is inflated. `None` leaves a bound open, and the default
/// accepts everything.
///
/// ```
/// use zensnap::Limits;
///
/// let thumbnails = Limits {
///     max_width: Some(256),
///     max_height: Some(256),
///     ..Limits::default()
/// };
/// # let _ = thumbnails;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum width * height.
    pub max_pixels: Option<u64>,
    /// Maximum decode cache one image may need (RGB rows plus the row-offset
    /// table). Also caps the codec's own working memory.
    pub max_memory_bytes: Option<u64>,
}

impl Limits {
    /// Whether a `width` x `height` image may be decoded.
    pub(crate) fn check_decode(&self, width: u32, height: u32) -> Result<(), SnapshotError> {
        let pixels = u64::from(width) * u64::from(height);
        let bounds = [
            ("width", u64::from(width), self.max_width),
            ("height", u64::from(height), self.max_height),
            ("pixel count", pixels, self.max_pixels),
            ("decode cache bytes", footprint(width, height), self.max_memory_bytes),
        ];
        match bounds
            .into_iter()
            .find(|&(_, value, max)| max.is_some_and(|max| value > max))
        {
            Some((what, value, Some(max))) => Err(SnapshotError::LimitExceeded(format!(
                "{width}x{height} image: {what} {value} over limit {max}"
            ))),
            _ => Ok(()),
        }
    }

    /// Memory cap handed to the `png` decoder.
    pub(crate) fn codec_limits(&self) -> png::Limits {
        png::Limits {
            bytes: self
                .max_memory_bytes
                .map_or(usize::MAX, |b| usize::try_from(b).unwrap_or(usize::MAX)),
        }
    }
}
