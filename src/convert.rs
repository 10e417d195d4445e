//! Decoded RGB rows to native surface pixels.

use rgb::RGB8;

use crate::cache::DecodeCache;
use crate::surface::Surface;

/// Transcode the image held in `cache` into `surface`.
///
/// Grows the surface if the image does not fit, points its source rectangle
/// at the image, then stores `map(rgb)` for every pixel, row-major from the
/// top left. Pixels outside the image are left alone.
pub(crate) fn load_into_surface<S, F>(
    cache: &DecodeCache,
    surface: &mut S,
    map: F,
) where
    S: Surface + ?Sized,
    F: Fn(RGB8) -> u32,
{
    let (iw, ih) = (cache.width(), cache.height());
    if iw > surface.width() || ih > surface.height() {
        surface.resize(iw, ih);
    }

    // Destination placement belongs to the surface owner.
    surface.set_src_pos(0, 0);
    surface.set_src_size(iw, ih);

    let (base, pitch) = surface.base_mut();
    let width = iw as usize;
    for (src, dst) in cache.rows().zip(base.chunks_mut(pitch)) {
        for (rgb, px) in src.chunks_exact(3).zip(&mut dst[..width]) {
            *px = map(RGB8 {
                r: rgb[0],
                g: rgb[1],
                b: rgb[2],
            });
        }
    }
}
