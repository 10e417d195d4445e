//! File-level load and save against a renderer.

use std::path::Path;

use enough::Unstoppable;

use crate::cache::DecodeCache;
use crate::capture::Capture;
use crate::decode::{DecodeRequest, LoadedImage};
use crate::encode::EncodeRequest;
use crate::error::SnapshotError;
use crate::io::open_file;
use crate::limits::Limits;
use crate::rect::Rect;
use crate::surface::{Renderer, Surface};
use crate::text::Comment;

/// Loads PNG files into surfaces and saves screenshots, on behalf of one
/// renderer.
///
/// Owns the [`DecodeCache`] reused by every load, so a bridge serves one
/// load at a time. Saves allocate per call.
pub struct PngBridge<'r, R: Renderer + ?Sized> {
    renderer: &'r R,
    cache: DecodeCache,
    limits: Option<Limits>,
}

impl<'r, R: Renderer + ?Sized> PngBridge<'r, R> {
    pub fn new(renderer: &'r R) -> Self {
        Self {
            renderer,
            cache: DecodeCache::new(),
            limits: None,
        }
    }

    /// Limits applied to every load.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn cache(&self) -> &DecodeCache {
        &self.cache
    }

    /// Load the PNG at `path` into `surface`, mapping pixels through the
    /// renderer.
    ///
    /// On failure the surface is left untouched.
    pub fn load_image<S: Surface + ?Sized>(
        &mut self,
        path: impl AsRef<Path>,
        surface: &mut S,
    ) -> Result<LoadedImage, SnapshotError> {
        let path = path.as_ref();
        let file = open_file(path)?;
        let mut request = DecodeRequest::new(file);
        if let Some(limits) = &self.limits {
            request = request.with_limits(limits.clone());
        }
        let renderer = self.renderer;
        let loaded = request.decode_into(
            &mut self.cache,
            surface,
            |rgb| renderer.map_rgb(rgb),
            Unstoppable,
        )?;
        log::info!(
            "loaded {} ({}x{})",
            path.display(),
            loaded.width,
            loaded.height
        );
        Ok(loaded)
    }

    /// Save the renderer's visible image to `path`.
    pub fn save_image(
        &self,
        path: impl AsRef<Path>,
        comments: &[Comment],
    ) -> Result<u64, SnapshotError> {
        let capture = Capture::from_renderer(self.renderer)?;
        save(path.as_ref(), &capture, comments)
    }

    /// Save `region` of `surface` to `path`; an empty region saves the
    /// whole surface.
    pub fn save_surface<S: Surface + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        surface: &S,
        region: Rect,
        comments: &[Comment],
    ) -> Result<u64, SnapshotError> {
        let capture = Capture::from_surface(surface, region)?;
        save(path.as_ref(), &capture, comments)
    }
}

fn save(path: &Path, capture: &Capture, comments: &[Comment]) -> Result<u64, SnapshotError> {
    let written = EncodeRequest::new()
        .with_comments(comments.iter().cloned())
        .save_capture(path, capture, Unstoppable)?;
    log::info!(
        "saved {} ({}x{}, {written} bytes)",
        path.display(),
        capture.width(),
        capture.height()
    );
    Ok(written)
}
