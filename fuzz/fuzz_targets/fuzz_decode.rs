#![no_main]
use libfuzzer_sys::fuzz_target;
use zensnap::*;

fuzz_target!(|data: &[u8]| {
    // Header probing and full loads must never panic
    let _ = probe(data);

    let limits = Limits {
        max_pixels: Some(4096 * 4096),
        max_memory_bytes: Some(256 * 1024 * 1024),
        ..Limits::default()
    };
    let format = NativeFormat::ARGB8888;
    let mut surface = ImgSurface::new(1, 1, format);
    let before = surface.as_img().buf().clone();
    let mut cache = DecodeCache::new();
    let result = DecodeRequest::new(data)
        .with_limits(limits)
        .decode_into(&mut cache, &mut surface, |rgb| format.map_rgb(rgb), enough::Unstoppable);

    match result {
        Ok(loaded) => {
            assert_eq!(surface.src_rect(), Rect::with_size(loaded.width, loaded.height));
        }
        Err(_) => assert_eq!(surface.as_img().buf(), &before, "failed load touched surface"),
    }
});
