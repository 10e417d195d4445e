use std::path::PathBuf;

use enough::StopReason;

/// Errors from loading a PNG into a surface or saving pixels as PNG.
///
/// Every failure aborts the whole load/save call. The `Display` text is the
/// descriptive message meant for the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("couldn't open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not enough memory: {0}")]
    OutOfMemory(String),

    #[error("unsupported PNG image: {0}")]
    Unsupported(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("invalid comment: {0}")]
    InvalidComment(String),

    #[error("region {x},{y} {width}x{height} lies outside the {bound_width}x{bound_height} surface")]
    InvalidRegion {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bound_width: u32,
        bound_height: u32,
    },

    #[error("nothing to capture: image is {width}x{height}")]
    EmptyCapture { width: u32, height: u32 },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for SnapshotError {
    fn from(r: StopReason) -> Self {
        SnapshotError::Cancelled(r)
    }
}

impl From<std::collections::TryReserveError> for SnapshotError {
    fn from(e: std::collections::TryReserveError) -> Self {
        SnapshotError::OutOfMemory(e.to_string())
    }
}
