//! Fuzz target for decoding a complete Olympus TIFF.
//!
//! Run with:
//!   cargo +nightly fuzz run tiff_decode

#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use olympus_scalebar::metadata::decode_olympus_tiff;

fuzz_target!(|data: &[u8]| {
    // Cap input size; a declared image size can still be large, but the
    // decoder enforces its own buffer limits.
    if data.len() > 4 * 1024 * 1024 {
        return;
    }

    let _ = decode_olympus_tiff(data, Path::new("fuzz.tif"));
});
