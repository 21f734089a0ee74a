//! Physical calibration and scale-bar sizing.
//!
//! This module turns per-pixel calibration into a scale-bar length:
//! [`select_scale_length`] picks a round physical length from
//! [`SCALE_CATALOG`], and [`pixel_length`] converts it back to pixels on the
//! same (horizontal) axis.
//!
//! # Example
//!
//! ```
//! use olympus_scalebar::calibration::{pixel_length, select_scale_length};
//!
//! // 2000 px wide at 5 nm/px is 10 µm across; a tenth of that is 1 µm.
//! let length_nm = select_scale_length(2000, 5e-9).unwrap();
//! assert_eq!(length_nm, 1000.0);
//! assert!((pixel_length(length_nm, 5e-9).unwrap() - 200.0).abs() < 1e-9);
//! ```

use serde::Serialize;

use crate::error::ScalebarError;

/// Allowed physical scale-bar lengths in nanometers, ascending.
pub const SCALE_CATALOG: [f64; 18] = [
    0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0,
    10000.0, 20000.0, 50000.0,
];

/// Rendering resolution used when an image carries no `XResolution` tag.
pub const DEFAULT_DPI: f64 = 300.0;

/// Largest `XResolution` taken at face value; anything above is treated
/// like a missing tag.
pub const MAX_DPI: f64 = 9600.0;

/// The scale bar never covers more than this fraction of the image width.
pub const WIDTH_FRACTION_DIVISOR: f64 = 10.0;

const NM_PER_METER: f64 = 1e9;

/// Physical size of one pixel along each axis, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ImageCalibration {
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    /// Objective magnification. Reported only, never used for sizing.
    pub magnification: f64,
}

impl ImageCalibration {
    /// Creates a calibration, rejecting pixel sizes that are zero, negative,
    /// NaN or infinite.
    pub fn new(
        pixel_size_x: f64,
        pixel_size_y: f64,
        magnification: f64,
    ) -> Result<Self, ScalebarError> {
        check_pixel_size("x", pixel_size_x)?;
        check_pixel_size("y", pixel_size_y)?;
        Ok(Self {
            pixel_size_x,
            pixel_size_y,
            magnification,
        })
    }

    /// Nanometers per pixel along the horizontal axis.
    pub fn nm_per_pixel_x(&self) -> f64 {
        self.pixel_size_x * NM_PER_METER
    }

    /// Nanometers per pixel along the vertical axis.
    pub fn nm_per_pixel_y(&self) -> f64 {
        self.pixel_size_y * NM_PER_METER
    }
}

/// Pixel grid dimensions plus the optional display resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    /// Pixels per inch from the `XResolution` tag, if present.
    pub dpi: Option<f64>,
}

impl ImageFrame {
    /// Creates a frame; both dimensions must be at least one pixel.
    pub fn new(width: u32, height: u32, dpi: Option<f64>) -> Result<Self, ScalebarError> {
        if width == 0 || height == 0 {
            return Err(ScalebarError::InvalidGeometry(format!(
                "image dimensions {}x{} (must be positive)",
                width, height
            )));
        }
        Ok(Self { width, height, dpi })
    }

    /// The resolution used to scale label text, falling back to
    /// [`DEFAULT_DPI`] when the tag is absent or outside `(0, MAX_DPI]`.
    pub fn effective_dpi(&self) -> f64 {
        match self.dpi {
            Some(dpi) if dpi > 0.0 && dpi <= MAX_DPI => dpi,
            _ => DEFAULT_DPI,
        }
    }
}

fn check_pixel_size(axis: &str, value: f64) -> Result<(), ScalebarError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScalebarError::DegenerateCalibration(format!(
            "pixel size {} is {} (must be positive and finite)",
            axis, value
        )))
    }
}

/// Picks the largest catalog length (nm) not exceeding a tenth of the
/// image's physical width.
///
/// `pixel_size_x` is in meters per pixel. Fails when the pixel size is not a
/// positive finite number, when the width is zero, or when even the
/// smallest catalog entry is too long for the image.
pub fn select_scale_length(pixel_width: u32, pixel_size_x: f64) -> Result<f64, ScalebarError> {
    check_pixel_size("x", pixel_size_x)?;
    if pixel_width == 0 {
        return Err(ScalebarError::InvalidGeometry(
            "image width is 0 (must be positive)".to_string(),
        ));
    }

    let image_width_nm = pixel_width as f64 * pixel_size_x * NM_PER_METER;
    let threshold_nm = image_width_nm / WIDTH_FRACTION_DIVISOR;

    SCALE_CATALOG
        .iter()
        .rev()
        .copied()
        .find(|&length| length <= threshold_nm)
        .ok_or(ScalebarError::ScaleBelowCatalog {
            threshold_nm,
            min_nm: SCALE_CATALOG[0],
        })
}

/// Converts a physical length (nm) to a pixel count on the horizontal axis.
///
/// The result is not rounded.
pub fn pixel_length(physical_length_nm: f64, pixel_size_x: f64) -> Result<f64, ScalebarError> {
    check_pixel_size("x", pixel_size_x)?;
    Ok(physical_length_nm / (pixel_size_x * NM_PER_METER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_strictly_ascending() {
        assert!(SCALE_CATALOG.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn selects_one_micron_for_ten_micron_wide_image() {
        assert_eq!(select_scale_length(2000, 5e-9).unwrap(), 1000.0);
    }

    #[test]
    fn selects_ten_nm_for_hundred_nm_wide_image() {
        assert_eq!(select_scale_length(100, 1e-9).unwrap(), 10.0);
    }

    #[test]
    fn selects_entry_below_threshold_between_catalog_values() {
        // 1024 px at 3 nm/px: threshold 307.2 nm -> 200 nm
        assert_eq!(select_scale_length(1024, 3e-9).unwrap(), 200.0);
    }

    #[test]
    fn exact_threshold_is_selected() {
        // threshold is exactly 0.1 nm
        assert_eq!(select_scale_length(1, 1e-9).unwrap(), 0.1);
    }

    #[test]
    fn caps_at_largest_catalog_entry() {
        // 10 mm wide image
        assert_eq!(select_scale_length(10_000, 1e-6).unwrap(), 50000.0);
    }

    #[test]
    fn threshold_below_catalog_fails() {
        let err = select_scale_length(5, 1e-10).unwrap_err();
        assert!(matches!(err, ScalebarError::ScaleBelowCatalog { .. }));
    }

    #[test]
    fn rejects_degenerate_pixel_sizes() {
        for bad in [0.0, -1e-9, f64::NAN, f64::INFINITY] {
            let err = select_scale_length(1000, bad).unwrap_err();
            assert!(
                matches!(err, ScalebarError::DegenerateCalibration(_)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_zero_width() {
        let err = select_scale_length(0, 1e-9).unwrap_err();
        assert!(matches!(err, ScalebarError::InvalidGeometry(_)));
    }

    #[test]
    fn pixel_length_converts_on_x_axis() {
        let px = pixel_length(1000.0, 5e-9).unwrap();
        assert!((px - 200.0).abs() < 1e-9);
    }

    #[test]
    fn pixel_length_is_not_rounded() {
        let px = pixel_length(200.0, 3e-9).unwrap();
        assert!((px - 66.666_666_666).abs() < 1e-6);
    }

    #[test]
    fn calibration_rejects_zero_y() {
        let err = ImageCalibration::new(1e-9, 0.0, 10.0).unwrap_err();
        assert!(err.to_string().contains("pixel size y"));
    }

    #[test]
    fn calibration_reports_nm_per_pixel() {
        let cal = ImageCalibration::new(5e-9, 2.5e-9, 100.0).unwrap();
        assert!((cal.nm_per_pixel_x() - 5.0).abs() < 1e-12);
        assert!((cal.nm_per_pixel_y() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        assert!(ImageFrame::new(0, 10, None).is_err());
        assert!(ImageFrame::new(10, 0, None).is_err());
    }

    #[test]
    fn frame_falls_back_to_default_dpi() {
        assert_eq!(ImageFrame::new(1, 1, None).unwrap().effective_dpi(), 300.0);
        assert_eq!(
            ImageFrame::new(1, 1, Some(0.0)).unwrap().effective_dpi(),
            300.0
        );
        assert_eq!(
            ImageFrame::new(1, 1, Some(96.0)).unwrap().effective_dpi(),
            96.0
        );
    }

    #[test]
    fn implausible_dpi_falls_back_to_default() {
        for bad in [f64::NAN, f64::INFINITY, MAX_DPI + 1.0, u32::MAX as f64] {
            assert_eq!(
                ImageFrame::new(1, 1, Some(bad)).unwrap().effective_dpi(),
                DEFAULT_DPI,
                "{bad} should fall back"
            );
        }
        assert_eq!(
            ImageFrame::new(1, 1, Some(MAX_DPI)).unwrap().effective_dpi(),
            MAX_DPI
        );
    }
}
