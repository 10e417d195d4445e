use std::io::{self, Read};
use std::path::PathBuf;

use enough::Unstoppable;
use zensnap::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("zensnap-{}-{name}.png", std::process::id()))
}

fn gradient(width: u32, height: u32, format: NativeFormat) -> ImgSurface {
    ImgSurface::from_fn(width, height, format, |x, y| RGB8 {
        r: (x * 13) as u8,
        g: (y * 7) as u8,
        b: (x ^ y) as u8,
    })
}

/// Deterministic xorshift noise; compresses poorly so IDAT spans most of the file.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

fn surface_snapshot(surface: &ImgSurface) -> (Vec<u32>, Rect, u32, u32) {
    (
        surface.as_img().buf().to_vec(),
        surface.src_rect(),
        Surface::width(surface),
        Surface::height(surface),
    )
}

/// Encode a plain PNG with the codec directly, bypassing this crate.
fn raw_png(width: u32, height: u32, color: png::ColorType, depth: png::BitDepth, data: &[u8]) -> Vec<u8> {
    raw_png_with(width, height, color, depth, data, |_| {})
}

fn raw_png_with(
    width: u32,
    height: u32,
    color: png::ColorType,
    depth: png::BitDepth,
    data: &[u8],
    configure: impl FnOnce(&mut png::Encoder<'_, &mut Vec<u8>>),
) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(depth);
        configure(&mut encoder);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
    }
    out
}

fn text_chunk_count(data: &[u8]) -> usize {
    let mut count = 0;
    let mut pos = 8;
    while pos + 8 <= data.len() {
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        if &data[pos + 4..pos + 8] == b"tEXt" {
            count += 1;
        }
        pos += 12 + len;
    }
    count
}

/// Frame `data` as a PNG chunk of type `kind`, CRC included.
fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = !0u32;
    for &byte in kind.iter().chain(data) {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    let mut chunk = Vec::with_capacity(data.len() + 12);
    chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
    chunk.extend_from_slice(kind);
    chunk.extend_from_slice(data);
    chunk.extend_from_slice(&(!crc).to_be_bytes());
    chunk
}

// ── Round trips ──────────────────────────────────────────────────────

#[test]
fn abgr_buffer_roundtrip_through_native_mapping() {
    let (w, h) = (7u32, 5u32);
    let pixels = noise((w * h * 4) as usize, 0x1234_5678);

    let encoded = EncodeRequest::new()
        .encode_to_vec(&pixels, w, h, Unstoppable)
        .unwrap();

    let format = NativeFormat::ABGR8888;
    let mut surface = ImgSurface::new(1, 1, format);
    let mut cache = DecodeCache::new();
    let loaded = DecodeRequest::new(&encoded[..])
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
        .unwrap();
    assert_eq!((loaded.width, loaded.height), (w, h));

    for y in 0..h {
        for x in 0..w {
            let off = ((y * w + x) * 4) as usize;
            let expected = format.map_rgb(RGB8 {
                r: pixels[off + 3],
                g: pixels[off + 2],
                b: pixels[off + 1],
            });
            assert_eq!(surface.pixel(x, y), expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn every_layout_encodes_the_same_image() {
    let rgb = [10u8, 20, 30, 40, 50, 60];
    let layouts: [(PixelLayout, Vec<u8>); 5] = [
        (PixelLayout::Rgb8, rgb.to_vec()),
        (PixelLayout::Rgba8, vec![10, 20, 30, 255, 40, 50, 60, 255]),
        (PixelLayout::Bgra8, vec![30, 20, 10, 255, 60, 50, 40, 255]),
        (PixelLayout::Argb8, vec![255, 10, 20, 30, 255, 40, 50, 60]),
        (PixelLayout::Abgr8, vec![255, 30, 20, 10, 255, 60, 50, 40]),
    ];

    for (layout, pixels) in layouts {
        let encoded = EncodeRequest::new()
            .with_layout(layout)
            .encode_to_vec(&pixels, 2, 1, Unstoppable)
            .unwrap();
        let mut cache = DecodeCache::new();
        DecodeRequest::new(&encoded[..])
            .decode(&mut cache, Unstoppable)
            .unwrap();
        assert_eq!(cache.row(0), &rgb[..], "{layout:?}");
    }
}

#[test]
fn written_header_is_8bit_rgb_non_interlaced() {
    let pixels = vec![0u8; 3 * 2 * 4];
    let encoded = EncodeRequest::new()
        .encode_to_vec(&pixels, 3, 2, Unstoppable)
        .unwrap();
    let info = probe(&encoded[..]).unwrap();
    assert_eq!((info.width, info.height), (3, 2));
    assert_eq!(info.color_type, png::ColorType::Rgb);
    assert_eq!(info.bit_depth, png::BitDepth::Eight);
    assert!(!info.interlaced);
    assert!(info.is_supported());
}

// ── Comments ─────────────────────────────────────────────────────────

#[test]
fn comments_written_in_order_without_extras() {
    let comments = [
        Comment::new("Title", "Test").unwrap(),
        Comment::new("Author", "X").unwrap(),
    ];
    let encoded = EncodeRequest::new()
        .with_comments(comments.iter().cloned())
        .encode_to_vec(&[0; 4], 1, 1, Unstoppable)
        .unwrap();

    assert_eq!(text_chunk_count(&encoded), 2);
    let info = probe(&encoded[..]).unwrap();
    assert_eq!(info.comments, comments);

    let mut cache = DecodeCache::new();
    let loaded = DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(loaded.comments, comments);
}

#[test]
fn no_comments_means_no_text_chunks() {
    let encoded = EncodeRequest::new()
        .encode_to_vec(&[0; 16], 2, 2, Unstoppable)
        .unwrap();
    assert_eq!(text_chunk_count(&encoded), 0);
    assert!(probe(&encoded[..]).unwrap().comments.is_empty());
}

#[test]
fn duplicate_keys_are_kept() {
    let comments = vec![
        Comment::new("Note", "first").unwrap(),
        Comment::new("Note", "second").unwrap(),
    ];
    let encoded = EncodeRequest::new()
        .with_comments(comments.clone())
        .encode_to_vec(&[0; 4], 1, 1, Unstoppable)
        .unwrap();
    assert_eq!(probe(&encoded[..]).unwrap().comments, comments);
}

// ── Surfaces and regions ─────────────────────────────────────────────

#[test]
fn region_save_reloads_pixel_for_pixel() {
    let format = NativeFormat::ARGB8888;
    let source = gradient(20, 15, format);
    let region = Rect::new(3, 4, 7, 5);
    let path = temp_path("region");

    let mut bridge = PngBridge::new(&source);
    bridge.save_surface(&path, &source, region, &[]).unwrap();

    let mut target = ImgSurface::new(2, 2, format);
    let loaded = bridge.load_image(&path, &mut target).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!((loaded.width, loaded.height), (7, 5));
    assert_eq!(target.src_rect(), Rect::with_size(7, 5));
    for y in 0..5 {
        for x in 0..7 {
            assert_eq!(target.pixel(x, y), source.pixel(x + 3, y + 4), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn empty_region_saves_full_surface() {
    let source = gradient(11, 6, NativeFormat::XRGB8888);
    let path = temp_path("full");

    let bridge = PngBridge::new(&source);
    bridge
        .save_surface(&path, &source, Rect::default(), &[])
        .unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let info = probe(file).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!((info.width, info.height), (11, 6));
}

#[test]
fn framebuffer_save_captures_visible_image() {
    let format = NativeFormat::ARGB8888;
    let mut framebuffer = gradient(32, 24, format);
    framebuffer.set_src_pos(8, 4);
    framebuffer.set_src_size(16, 10);
    let path = temp_path("framebuffer");
    let comments = [Comment::new("Software", "zensnap").unwrap()];

    let mut bridge = PngBridge::new(&framebuffer);
    let written = bridge.save_image(&path, &comments).unwrap();
    assert_eq!(written, std::fs::metadata(&path).unwrap().len());

    let mut target = ImgSurface::new(1, 1, format);
    let loaded = bridge.load_image(&path, &mut target).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!((loaded.width, loaded.height), (16, 10));
    assert_eq!(loaded.comments, comments);
    assert_eq!(target.pixel(0, 0), framebuffer.pixel(8, 4));
    assert_eq!(target.pixel(15, 9), framebuffer.pixel(23, 13));
}

#[test]
fn region_outside_surface_creates_no_file() {
    let source = gradient(8, 8, NativeFormat::ARGB8888);
    let path = temp_path("outside");
    let bridge = PngBridge::new(&source);
    let err = bridge
        .save_surface(&path, &source, Rect::new(4, 4, 8, 8), &[])
        .unwrap_err();
    assert!(matches!(err, SnapshotError::InvalidRegion { .. }));
    assert!(!path.exists());
}

#[test]
fn empty_surface_save_is_refused_before_file_creation() {
    let empty = ImgSurface::new(0, 0, NativeFormat::ARGB8888);
    let path = temp_path("empty-surface");
    let bridge = PngBridge::new(&empty);

    let err = bridge
        .save_surface(&path, &empty, Rect::default(), &[])
        .unwrap_err();
    assert!(matches!(err, SnapshotError::EmptyCapture { .. }), "{err}");
    assert!(!path.exists());

    let err = bridge.save_image(&path, &[]).unwrap_err();
    assert!(matches!(err, SnapshotError::EmptyCapture { .. }), "{err}");
    assert!(!path.exists());
}

#[test]
fn smaller_image_leaves_surface_size_alone() {
    let format = NativeFormat::ARGB8888;
    let encoded = EncodeRequest::new()
        .with_layout(PixelLayout::Rgb8)
        .encode_to_vec(&[1, 2, 3, 4, 5, 6], 2, 1, Unstoppable)
        .unwrap();

    let mut surface = ImgSurface::new(64, 64, format);
    let mut cache = DecodeCache::new();
    DecodeRequest::new(&encoded[..])
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
        .unwrap();
    assert_eq!((Surface::width(&surface), Surface::height(&surface)), (64, 64));
    assert_eq!(surface.src_rect(), Rect::with_size(2, 1));
    assert_eq!(surface.rgb(1, 0), RGB8 { r: 4, g: 5, b: 6 });
}

// ── Input normalization ──────────────────────────────────────────────

#[test]
fn palette_image_expands_to_rgb() {
    let encoded = raw_png_with(
        3,
        1,
        png::ColorType::Indexed,
        png::BitDepth::Eight,
        &[2, 0, 1],
        |e| e.set_palette(vec![255, 0, 0, 0, 255, 0, 0, 0, 255]),
    );
    let mut cache = DecodeCache::new();
    DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(cache.row(0), &[0, 0, 255, 255, 0, 0, 0, 255, 0][..]);
}

#[test]
fn sub_byte_palette_is_unpacked() {
    // Four 2-bit indices in one byte: 3, 2, 1, 0.
    let encoded = raw_png_with(
        4,
        1,
        png::ColorType::Indexed,
        png::BitDepth::Two,
        &[0b11_10_01_00],
        |e| e.set_palette(vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3]),
    );
    let mut cache = DecodeCache::new();
    DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(cache.row(0), &[3, 3, 3, 2, 2, 2, 1, 1, 1, 0, 0, 0][..]);
}

#[test]
fn sixteen_bit_rgb_is_stripped_to_eight() {
    let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
    let encoded = raw_png(1, 1, png::ColorType::Rgb, png::BitDepth::Sixteen, &data);
    let mut cache = DecodeCache::new();
    DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(cache.row(0), &[0x12, 0x56, 0x9A][..]);
}

#[test]
fn rgba_image_drops_alpha() {
    let data = [1, 2, 3, 0, 4, 5, 6, 128];
    let encoded = raw_png(2, 1, png::ColorType::Rgba, png::BitDepth::Eight, &data);
    let mut cache = DecodeCache::new();
    DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(cache.row(0), &[1, 2, 3, 4, 5, 6][..]);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn greyscale_is_rejected_without_touching_surface() {
    for color in [png::ColorType::Grayscale, png::ColorType::GrayscaleAlpha] {
        let samples = if color == png::ColorType::Grayscale { 4 } else { 8 };
        let encoded = raw_png(2, 2, color, png::BitDepth::Eight, &vec![77; samples]);

        let format = NativeFormat::ARGB8888;
        let mut surface = gradient(3, 3, format);
        let before = surface_snapshot(&surface);
        let mut cache = DecodeCache::new();
        let err = DecodeRequest::new(&encoded[..])
            .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
            .unwrap_err();

        assert!(matches!(err, SnapshotError::Unsupported(_)), "{color:?}: {err}");
        assert_eq!(surface_snapshot(&surface), before);
        assert!(!probe(&encoded[..]).unwrap().is_supported());
    }
}

/// Serves `limit` bytes of `data`, then fails every read.
struct FailingReader<'a> {
    data: &'a [u8],
    limit: usize,
}

impl Read for FailingReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.limit == 0 {
            return Err(io::Error::other("device unplugged"));
        }
        let n = buf.len().min(self.limit).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        self.limit -= n;
        Ok(n)
    }
}

#[test]
fn stream_failure_mid_read_aborts_before_surface() {
    let pixels = noise(16 * 16 * 4, 0xDEAD_BEEF);
    let encoded = EncodeRequest::new()
        .encode_to_vec(&pixels, 16, 16, Unstoppable)
        .unwrap();

    let format = NativeFormat::ARGB8888;
    let mut surface = gradient(4, 4, format);
    let before = surface_snapshot(&surface);
    let mut cache = DecodeCache::new();
    let reader = FailingReader {
        data: &encoded,
        limit: encoded.len() / 2,
    };
    let err = DecodeRequest::new(reader)
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
        .unwrap_err();

    assert!(matches!(err, SnapshotError::Decode(_)), "{err}");
    assert!(err.to_string().starts_with("decode failed:"));
    assert_eq!(surface_snapshot(&surface), before);
}

#[test]
fn truncated_file_fails_to_decode() {
    let encoded = EncodeRequest::new()
        .encode_to_vec(&noise(8 * 8 * 4, 7), 8, 8, Unstoppable)
        .unwrap();
    let truncated = &encoded[..encoded.len() / 2];
    let mut cache = DecodeCache::new();
    let err = DecodeRequest::new(truncated)
        .decode(&mut cache, Unstoppable)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Decode(_)), "{err}");
}

fn sample_png() -> Vec<u8> {
    EncodeRequest::new()
        .encode_to_vec(&noise(4 * 4 * 4, 99), 4, 4, Unstoppable)
        .unwrap()
}

fn assert_load_rejected(data: &[u8]) {
    let format = NativeFormat::ARGB8888;
    let mut surface = gradient(3, 3, format);
    let before = surface_snapshot(&surface);
    let mut cache = DecodeCache::new();
    let err = DecodeRequest::new(data)
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Decode(_)), "{err}");
    assert_eq!(surface_snapshot(&surface), before);
}

#[test]
fn missing_end_chunk_fails_the_load() {
    let encoded = sample_png();
    assert_eq!(&encoded[encoded.len() - 8..encoded.len() - 4], b"IEND");
    assert_load_rejected(&encoded[..encoded.len() - 12]);
}

#[test]
fn corrupt_end_chunk_crc_fails_the_load() {
    let mut encoded = sample_png();
    let last = encoded.len() - 1;
    encoded[last] ^= 0x01;
    assert_load_rejected(&encoded);
}

#[test]
fn text_after_image_data_is_collected() {
    let encoded = sample_png();
    let (body, iend) = encoded.split_at(encoded.len() - 12);
    let mut spliced = body.to_vec();
    spliced.extend(png_chunk(b"tEXt", b"Comment\0written late"));
    spliced.extend_from_slice(iend);

    // Only the header is read by probe; the late chunk comes with a load.
    assert!(probe(&spliced[..]).unwrap().comments.is_empty());

    let mut cache = DecodeCache::new();
    let loaded = DecodeRequest::new(&spliced[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!(loaded.comments, [Comment::new("Comment", "written late").unwrap()]);
}

#[test]
fn failed_load_leaves_cache_without_an_image() {
    let mut cache = DecodeCache::new();
    let encoded = sample_png();
    DecodeRequest::new(&encoded[..])
        .decode(&mut cache, Unstoppable)
        .unwrap();
    assert_eq!((cache.width(), cache.height()), (4, 4));

    DecodeRequest::new(&encoded[..encoded.len() - 12])
        .decode(&mut cache, Unstoppable)
        .unwrap_err();
    assert_eq!((cache.width(), cache.height()), (0, 0));
    assert!(cache.row_offsets().is_empty());
    assert_eq!(cache.capacity(), 4 * 4 * DECODE_BYTES_PER_PIXEL);
}

#[test]
fn garbage_is_a_decode_failure() {
    let err = probe(&b"definitely not a png file"[..]).unwrap_err();
    assert!(matches!(err, SnapshotError::Decode(_)), "{err}");
}

#[test]
fn missing_file_is_an_open_failure() {
    let source = gradient(1, 1, NativeFormat::ARGB8888);
    let mut bridge = PngBridge::new(&source);
    let mut target = ImgSurface::new(1, 1, NativeFormat::ARGB8888);
    let err = bridge
        .load_image(temp_path("missing-file"), &mut target)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Open { .. }), "{err}");
}

#[test]
fn limits_reject_before_surface_changes() {
    let encoded = EncodeRequest::new()
        .encode_to_vec(&[0; 10 * 10 * 4], 10, 10, Unstoppable)
        .unwrap();
    let format = NativeFormat::ARGB8888;
    let mut surface = ImgSurface::new(2, 2, format);
    let before = surface_snapshot(&surface);
    let mut cache = DecodeCache::new();
    let err = DecodeRequest::new(&encoded[..])
        .with_limits(Limits {
            max_pixels: Some(50),
            ..Limits::default()
        })
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), Unstoppable)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::LimitExceeded(_)), "{err}");
    assert_eq!(surface_snapshot(&surface), before);
    assert_eq!(cache.capacity(), 0);
}

#[test]
fn short_pixel_buffer_is_rejected() {
    let err = EncodeRequest::new()
        .encode_to_vec(&[0; 15], 2, 2, Unstoppable)
        .unwrap_err();
    assert!(matches!(
        err,
        SnapshotError::BufferTooSmall {
            needed: 16,
            actual: 15
        }
    ));
}

#[test]
fn zero_sized_image_is_an_encode_failure() {
    let err = EncodeRequest::new()
        .encode_to_vec(&[], 0, 4, Unstoppable)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Encode(_)), "{err}");
}

/// Accepts `limit` bytes, then fails every write.
struct FailingWriter {
    limit: usize,
}

impl io::Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.limit == 0 {
            return Err(io::Error::other("disk full"));
        }
        let n = buf.len().min(self.limit);
        self.limit -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn stream_failure_mid_write_is_an_encode_failure() {
    let pixels = vec![0xC3; 32 * 32 * 4];
    let err = EncodeRequest::new()
        .encode(FailingWriter { limit: 40 }, &pixels, 32, 32, Unstoppable)
        .unwrap_err();
    assert!(matches!(err, SnapshotError::Encode(_)), "{err}");
}
