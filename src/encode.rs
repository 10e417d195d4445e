//! PNG save pipeline: captured pixels → RGB packer → codec → stream.

use std::io::Write;
use std::path::Path;

use enough::Stop;

use crate::capture::Capture;
use crate::error::SnapshotError;
use crate::io::{CodecWriter, Operation, Session, Stage, create_file, encoding_failure};
use crate::pixel::PixelLayout;
use crate::text::{Comment, write_comments};

/// Builder for PNG saves.
///
/// Output is always 8-bit RGB, non-interlaced. Input samples in
/// [`EncodeRequest::with_layout`] order are reordered and stripped to RGB
/// before compression.
///
/// # Example
///
/// ```
/// use zensnap::{Comment, EncodeRequest, PixelLayout, Unstoppable};
///
/// let pixels = [0xFF, 0x00, 0x00, 0xFF]; // one red pixel, A B G R
/// let png = EncodeRequest::new()
///     .with_comment(Comment::new("Software", "zensnap")?)
///     .encode_to_vec(&pixels, 1, 1, Unstoppable)?;
/// assert_eq!(&png[1..4], b"PNG");
/// # Ok::<(), zensnap::SnapshotError>(())
/// ```
#[derive(Clone, Debug)]
pub struct EncodeRequest {
    comments: Vec<Comment>,
    layout: PixelLayout,
    compression: png::Compression,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeRequest {
    /// Request for alpha-first, blue-first samples with default compression.
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            layout: PixelLayout::Abgr8,
            compression: png::Compression::Default,
        }
    }

    /// Append comments, kept in the given order.
    pub fn with_comments(mut self, comments: impl IntoIterator<Item = Comment>) -> Self {
        self.comments.extend(comments);
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Byte layout of the pixel buffers passed to [`EncodeRequest::encode`].
    pub fn with_layout(mut self, layout: PixelLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_compression(mut self, compression: png::Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Encode a tightly packed `width` x `height` buffer to `out`.
    ///
    /// Returns the number of bytes handed to `out`.
    pub fn encode<W: Write>(
        &self,
        out: W,
        pixels: &[u8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<u64, SnapshotError> {
        let pitch = (width as usize)
            .checked_mul(self.layout.bytes_per_pixel())
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;
        let needed = pitch
            .checked_mul(height as usize)
            .ok_or(SnapshotError::DimensionsTooLarge { width, height })?;
        if pixels.len() < needed {
            return Err(SnapshotError::BufferTooSmall {
                needed,
                actual: pixels.len(),
            });
        }
        let row_offsets: Vec<usize> = (0..height as usize).map(|row| row * pitch).collect();
        self.encode_rows(out, pixels, &row_offsets, self.layout, width, height, &stop)
    }

    /// Encode a captured block to `out`, ignoring the configured layout.
    pub fn encode_capture<W: Write>(
        &self,
        out: W,
        capture: &Capture,
        stop: impl Stop,
    ) -> Result<u64, SnapshotError> {
        self.encode_rows(
            out,
            capture.pixels(),
            capture.row_offsets(),
            capture.layout(),
            capture.width(),
            capture.height(),
            &stop,
        )
    }

    /// Encode a tightly packed buffer into memory.
    pub fn encode_to_vec(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stop: impl Stop,
    ) -> Result<Vec<u8>, SnapshotError> {
        let mut out = Vec::new();
        self.encode(&mut out, pixels, width, height, stop)?;
        Ok(out)
    }

    /// Encode a captured block into a new file at `path`.
    ///
    /// A failure after the file was created may leave a truncated file
    /// behind.
    pub fn save_capture(
        &self,
        path: impl AsRef<Path>,
        capture: &Capture,
        stop: impl Stop,
    ) -> Result<u64, SnapshotError> {
        let path = path.as_ref();
        let mut file = create_file(path)?;
        self.encode_capture(&mut file, capture, stop)
            .inspect_err(|e| {
                log::warn!("saving {} failed, file may be incomplete: {e}", path.display())
            })
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_rows<W: Write>(
        &self,
        out: W,
        pixels: &[u8],
        row_offsets: &[usize],
        layout: PixelLayout,
        width: u32,
        height: u32,
        stop: &dyn Stop,
    ) -> Result<u64, SnapshotError> {
        let mut session = Session::begin(Operation::Save);
        let mut sink = CodecWriter::new(out);
        let result = self.write_png(
            &mut sink,
            &mut session,
            pixels,
            row_offsets,
            layout,
            width,
            height,
            stop,
        );
        if result.is_err() && sink.committed() > 0 {
            log::warn!(
                "save aborted at {:?} after {} bytes reached the stream",
                session.stage(),
                sink.committed()
            );
        }
        result.map(|()| sink.committed())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_png<W: Write>(
        &self,
        sink: &mut CodecWriter<W>,
        session: &mut Session,
        pixels: &[u8],
        row_offsets: &[usize],
        layout: PixelLayout,
        width: u32,
        height: u32,
        stop: &dyn Stop,
    ) -> Result<(), SnapshotError> {
        if width == 0 || height == 0 {
            return Err(Operation::Save.failure(format_args!(
                "image has no pixels ({width}x{height})"
            )));
        }
        if row_offsets.len() != height as usize {
            return Err(Operation::Save.failure(format_args!(
                "{} row offsets for {height} rows",
                row_offsets.len()
            )));
        }

        let src_pitch = width as usize * layout.bytes_per_pixel();
        let rgb_pitch = width as usize * 3;
        if let Some(&last) = row_offsets.last() {
            let needed = last + src_pitch;
            if pixels.len() < needed {
                return Err(SnapshotError::BufferTooSmall {
                    needed,
                    actual: pixels.len(),
                });
            }
        }

        let mut encoder = png::Encoder::new(&mut *sink, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(self.compression);
        session.advance(Stage::ContextCreated);

        write_comments(&mut encoder, &self.comments)?;

        // Channel reorder and alpha/filler strip happen before any byte is
        // written, so a cancelled save leaves the stream untouched.
        let mut packed = Vec::new();
        packed.try_reserve_exact(rgb_pitch * height as usize)?;
        packed.resize(rgb_pitch * height as usize, 0);
        for (row_idx, (dst, &start)) in packed
            .chunks_exact_mut(rgb_pitch)
            .zip(row_offsets)
            .enumerate()
        {
            if row_idx % 16 == 0 {
                stop.check()?;
            }
            layout.pack_rgb_row(&pixels[start..start + src_pitch], dst);
        }

        let mut writer = encoder.write_header().map_err(encoding_failure)?;
        session.advance(Stage::HeaderExchanged);

        writer.write_image_data(&packed).map_err(encoding_failure)?;
        session.advance(Stage::PixelDataTransferred);

        writer.finish().map_err(encoding_failure)?;
        sink.flush().map_err(|e| Operation::Save.failure(e))?;
        session.advance(Stage::Finalized);
        log::debug!(
            "encoded {width}x{height} PNG, {} bytes, {} comment(s)",
            sink.committed(),
            self.comments.len()
        );
        Ok(())
    }
}
