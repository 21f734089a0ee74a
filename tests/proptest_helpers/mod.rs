#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use olympus_scalebar::calibration::SCALE_CATALOG;

pub const EPS_REL: f64 = 1e-9;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(256);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Pixel sizes in meters, spread over several orders of magnitude
/// (0.001 nm/px to 10 µm/px).
pub fn arb_pixel_size() -> impl Strategy<Value = f64> {
    (-3.0f64..4.0).prop_map(|exp| 10f64.powf(exp) * 1e-9)
}

pub fn arb_width() -> impl Strategy<Value = u32> {
    1u32..20_000
}

pub fn arb_catalog_length() -> impl Strategy<Value = f64> {
    (0..SCALE_CATALOG.len()).prop_map(|i| SCALE_CATALOG[i])
}

/// One tenth of the physical image width in nanometers.
pub fn threshold_nm(width: u32, pixel_size: f64) -> f64 {
    width as f64 * pixel_size * 1e9 / 10.0
}
