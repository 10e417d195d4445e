#![no_main]
use libfuzzer_sys::fuzz_target;
use zensnap::*;

fuzz_target!(|data: &[u8]| {
    // Anything we can decode must survive a save and reload unchanged
    let limits = Limits {
        max_pixels: Some(1024 * 1024),
        ..Limits::default()
    };
    let mut cache = DecodeCache::new();
    let Ok(loaded) = DecodeRequest::new(data)
        .with_limits(limits)
        .decode(&mut cache, enough::Unstoppable)
    else {
        return;
    };
    if loaded.width == 0 || loaded.height == 0 {
        return;
    }
    let pixels: Vec<u8> = cache.rows().flatten().copied().collect();

    let reencoded = EncodeRequest::new()
        .with_layout(PixelLayout::Rgb8)
        .encode_to_vec(&pixels, loaded.width, loaded.height, enough::Unstoppable)
        .expect("decoded image failed to re-encode");

    let mut cache2 = DecodeCache::new();
    let reloaded = DecodeRequest::new(&reencoded[..])
        .decode(&mut cache2, enough::Unstoppable)
        .expect("re-encoded data failed to decode");

    let pixels2: Vec<u8> = cache2.rows().flatten().copied().collect();
    assert_eq!(pixels, pixels2, "roundtrip pixel mismatch");
    assert_eq!((loaded.width, loaded.height), (reloaded.width, reloaded.height));
});
