//! PNG load pipeline: stream → codec → decode cache → surface.

use std::io::Read;

use enough::{Stop, StopReason};
use rgb::RGB8;

use crate::cache::DecodeCache;
use crate::convert::load_into_surface;
use crate::error::SnapshotError;
use crate::io::{CodecReader, Operation, Session, Stage, decoding_failure};
use crate::limits::Limits;
use crate::surface::Surface;
use crate::text::{Comment, read_comments};

/// Header facts about a PNG stream, read without decoding pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub color_type: png::ColorType,
    pub bit_depth: png::BitDepth,
    pub interlaced: bool,
    /// Text chunks that precede the image data.
    pub comments: Vec<Comment>,
}

impl ImageInfo {
    /// Whether a load of this image would be accepted.
    pub fn is_supported(&self) -> bool {
        check_color_type(self.color_type).is_ok() && !self.interlaced
    }
}

/// Read the PNG header from `reader`.
pub fn probe<R: Read>(reader: R) -> Result<ImageInfo, SnapshotError> {
    let mut input = CodecReader::new(reader);
    let info = {
        let decoder = png::Decoder::new(&mut input);
        decoder.read_info().map(|r| {
            let info = r.info();
            ImageInfo {
                width: info.width,
                height: info.height,
                color_type: info.color_type,
                bit_depth: info.bit_depth,
                interlaced: info.interlaced,
                comments: read_comments(info),
            }
        })
    };
    info.map_err(|e| decoding_failure(e, input.consumed()))
}

/// Summary of a successful load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// Every text chunk in the file, in file order, including those after
    /// the image data.
    pub comments: Vec<Comment>,
}

/// Builder for one PNG load.
///
/// # Example
///
/// ```no_run
/// use zensnap::{DecodeCache, DecodeRequest, ImgSurface, NativeFormat, Unstoppable};
///
/// let file = std::io::BufReader::new(std::fs::File::open("logo.png")?);
/// let mut cache = DecodeCache::new();
/// let mut surface = ImgSurface::new(1, 1, NativeFormat::ARGB8888);
/// let format = surface.format();
/// let loaded = DecodeRequest::new(file).decode_into(
///     &mut cache,
///     &mut surface,
///     |rgb| format.map_rgb(rgb),
///     Unstoppable,
/// )?;
/// println!("{}x{}", loaded.width, loaded.height);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DecodeRequest<R> {
    reader: R,
    limits: Option<Limits>,
}

impl<R: Read> DecodeRequest<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Decode into `cache` as 8-bit RGB rows without touching any surface.
    pub fn decode(
        self,
        cache: &mut DecodeCache,
        stop: impl Stop,
    ) -> Result<LoadedImage, SnapshotError> {
        self.decode_with(cache, &stop)
    }

    /// Decode, then transcode the image into `surface` through `map`.
    ///
    /// The surface is only modified after the whole image decoded.
    pub fn decode_into<S, F>(
        self,
        cache: &mut DecodeCache,
        surface: &mut S,
        map: F,
        stop: impl Stop,
    ) -> Result<LoadedImage, SnapshotError>
    where
        S: Surface + ?Sized,
        F: Fn(RGB8) -> u32,
    {
        let loaded = self.decode_with(cache, &stop)?;
        stop.check()?;
        load_into_surface(cache, surface, map);
        Ok(loaded)
    }

    fn decode_with(
        self,
        cache: &mut DecodeCache,
        stop: &dyn Stop,
    ) -> Result<LoadedImage, SnapshotError> {
        let mut session = Session::begin(Operation::Load);
        let mut input = CodecReader::new(self.reader);
        let result = read_image(&mut input, self.limits.as_ref(), cache, &mut session, stop);
        if result.is_err() {
            cache.forget_image();
        }
        result.map_err(|failure| match failure {
            LoadFailure::Codec(e) => decoding_failure(e, input.consumed()),
            LoadFailure::Other(e) => e,
        })
    }
}

/// Codec errors are kept raw until the reader is released, so the
/// message can report how far into the stream the failure happened.
enum LoadFailure {
    Codec(png::DecodingError),
    Other(SnapshotError),
}

impl From<png::DecodingError> for LoadFailure {
    fn from(e: png::DecodingError) -> Self {
        LoadFailure::Codec(e)
    }
}

impl From<SnapshotError> for LoadFailure {
    fn from(e: SnapshotError) -> Self {
        LoadFailure::Other(e)
    }
}

impl From<StopReason> for LoadFailure {
    fn from(r: StopReason) -> Self {
        LoadFailure::Other(SnapshotError::Cancelled(r))
    }
}

fn check_color_type(color_type: png::ColorType) -> Result<(), SnapshotError> {
    #[allow(unreachable_patterns)]
    match color_type {
        png::ColorType::Rgb | png::ColorType::Rgba | png::ColorType::Indexed => Ok(()),
        png::ColorType::Grayscale | png::ColorType::GrayscaleAlpha => Err(
            SnapshotError::Unsupported("greyscale PNG images not supported".into()),
        ),
        other => Err(SnapshotError::Unsupported(format!(
            "unknown color type {other:?}"
        ))),
    }
}

fn read_image<R: Read>(
    input: &mut CodecReader<R>,
    limits: Option<&Limits>,
    cache: &mut DecodeCache,
    session: &mut Session,
    stop: &dyn Stop,
) -> Result<LoadedImage, LoadFailure> {
    let codec_limits = limits.map_or(png::Limits { bytes: usize::MAX }, Limits::codec_limits);
    let mut decoder = png::Decoder::new_with_limits(input, codec_limits);
    // 16-bit to 8-bit, sub-byte samples unpacked, palettes expanded to RGB.
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    session.advance(Stage::ContextCreated);

    let mut reader = decoder.read_info()?;
    let info = reader.info();
    let (width, height) = (info.width, info.height);
    check_color_type(info.color_type)?;
    if info.interlaced {
        return Err(
            SnapshotError::Unsupported("interlaced PNG images not supported".into()).into(),
        );
    }
    session.advance(Stage::HeaderExchanged);

    if let Some(limits) = limits {
        limits.check_decode(width, height)?;
    }

    let channels = match reader.output_color_type() {
        (png::ColorType::Rgb, png::BitDepth::Eight) => 3,
        (png::ColorType::Rgba, png::BitDepth::Eight) => 4,
        (color, depth) => {
            return Err(SnapshotError::Unsupported(format!(
                "codec produced {color:?} at {depth:?} bits"
            ))
            .into());
        }
    };

    cache.ensure_capacity(width, height)?;
    log::debug!("decoding {width}x{height} PNG ({channels} channels)");

    for row_idx in 0..height as usize {
        if row_idx % 16 == 0 {
            stop.check()?;
        }
        let row = reader
            .next_row()?
            .ok_or_else(|| Operation::Load.failure("image data ended early"))?;
        let dst = cache.row_mut(row_idx);
        if channels == 3 {
            dst.copy_from_slice(&row.data()[..dst.len()]);
        } else {
            // Alpha is dropped; surfaces hold opaque pixels.
            for (out, px) in dst.chunks_exact_mut(3).zip(row.data().chunks_exact(4)) {
                out.copy_from_slice(&px[..3]);
            }
        }
    }
    session.advance(Stage::PixelDataTransferred);

    // Trailing chunks up to IEND: CRCs are verified and text after the
    // image data is collected.
    reader.finish()?;
    let comments = read_comments(reader.info());
    session.advance(Stage::Finalized);

    Ok(LoadedImage {
        width,
        height,
        comments,
    })
}
