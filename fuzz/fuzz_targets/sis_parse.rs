//! Fuzz target for Olympus SIS block parsing.
//!
//! The input is treated as a whole file with the SIS header at offset 0,
//! so sub-tag offsets may point anywhere in (or past) the data.
//!
//! Run with:
//!   cargo +nightly fuzz run sis_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use olympus_scalebar::metadata::sis::fuzz_parse_sis;

fuzz_target!(|data: &[u8]| {
    // Only panics matter; malformed blocks are expected to error.
    let _ = fuzz_parse_sis(data);
});
