//! # zensnap
//!
//! PNG screenshots from, and PNG images into, renderer-owned pixel surfaces.
//!
//! PNG compression, filtering and chunk framing are done by the
//! [`png`] crate. This crate handles everything around it:
//!
//! - streaming the codec from and to files, with every codec failure
//!   surfaced as one [`SnapshotError`]
//! - converting decoded 8-bit RGB into a surface's native packed pixels
//! - reusing one decode buffer across loads ([`DecodeCache`])
//! - capturing the renderer's framebuffer or any rectangle of a surface
//!   ([`Capture`]) and packing alpha-first, blue-first samples into RGB
//! - writing `tEXt` comments ([`Comment`])
//!
//! ## Supported images
//!
//! Loads accept 8- or 16-bit RGB, RGBA and palette images (alpha is
//! dropped). Greyscale and interlaced images are rejected. Saves always
//! write 8-bit RGB, non-interlaced.
//!
//! ## Non-Goals
//!
//! - Palette or greyscale output
//! - Animated PNG
//! - Streaming decode of partial images
//!
//! ## Usage
//!
//! ```no_run
//! use zensnap::{Comment, ImgSurface, NativeFormat, PngBridge, Rect};
//!
//! let framebuffer = ImgSurface::new(320, 240, NativeFormat::ARGB8888);
//! let mut bridge = PngBridge::new(&framebuffer);
//!
//! // Screenshot of the visible image
//! let comments = [Comment::new("Software", "zensnap")?];
//! bridge.save_image("snapshot.png", &comments)?;
//!
//! // Load a static image into an offscreen surface
//! let mut surface = ImgSurface::new(1, 1, NativeFormat::ARGB8888);
//! let loaded = bridge.load_image("logo.png", &mut surface)?;
//!
//! // Save part of it back out
//! bridge.save_surface("crop.png", &surface, Rect::new(0, 0, 16, 16), &[])?;
//! # let _ = loaded;
//! # Ok::<(), zensnap::SnapshotError>(())
//! ```

#![forbid(unsafe_code)]

mod bridge;
mod cache;
mod capture;
mod convert;
mod decode;
mod encode;
mod error;
mod io;
mod limits;
mod pixel;
mod rect;
mod surface;
mod text;

// Re-exports
pub use bridge::PngBridge;
pub use cache::{DECODE_BYTES_PER_PIXEL, DecodeCache};
pub use capture::Capture;
pub use decode::{DecodeRequest, ImageInfo, LoadedImage, probe};
pub use encode::EncodeRequest;
pub use enough::{Stop, Unstoppable};
pub use error::SnapshotError;
pub use limits::Limits;
pub use pixel::{NativeFormat, PixelLayout};
pub use png;
pub use rect::Rect;
pub use rgb::RGB8;
pub use surface::{ImgSurface, Renderer, Surface};
pub use text::{Comment, MAX_KEYWORD_LEN};
