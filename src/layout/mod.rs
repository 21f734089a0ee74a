//! Pixel-space layout of the scale bar and its label.
//!
//! All geometry scales with the image height so annotations stay in
//! proportion across images of different resolution. The bar is anchored
//! to the bottom-right corner; the label is centered above it.

mod label;

pub use label::{format_general, format_label, MICRON_THRESHOLD_NM};

use serde::Serialize;

use crate::calibration::{pixel_length, select_scale_length, ImageCalibration, ImageFrame};
use crate::error::ScalebarError;

/// Tunable layout constants.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Gap between the bar and the right/bottom image edges, in pixels.
    pub padding: u32,
    /// Bar thickness as a fraction of the image height.
    pub thickness_ratio: f64,
    /// Minimum bar thickness in pixels.
    pub min_thickness: u32,
    /// Label font size (points) as a fraction of the image height.
    pub font_ratio: f64,
    /// Minimum label font size in points.
    pub min_font_size: u32,
    /// Gap between label and bar, as a fraction of the font size.
    pub label_gap_ratio: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            padding: 20,
            thickness_ratio: 0.0035,
            min_thickness: 2,
            font_ratio: 0.02,
            min_font_size: 8,
            label_gap_ratio: 0.5,
        }
    }
}

/// A point in image pixel space; (0, 0) is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Everything needed to draw one scale bar.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScaleBarSpec {
    /// Physical bar length in nanometers (a catalog value).
    pub length_nm: f64,
    /// Bar length in pixels, unrounded.
    pub pixel_length: f64,
    pub bar_thickness: u32,
    pub padding: u32,
    /// Top-left corner of the bar rectangle.
    pub bar_anchor: PixelPoint,
    /// Horizontal center and bottom edge of the label.
    pub label_anchor: PixelPoint,
    /// Label size in points.
    pub font_size: u32,
    pub label: String,
    /// Shared bar and label color, as given by the caller.
    pub color: String,
}

/// Bar thickness in pixels for an image of the given height.
pub fn bar_thickness(image_height: u32, opts: &LayoutOptions) -> u32 {
    let scaled = (image_height as f64 * opts.thickness_ratio).round() as u32;
    scaled.max(opts.min_thickness)
}

/// Label font size in points for an image of the given height.
pub fn font_size(image_height: u32, opts: &LayoutOptions) -> u32 {
    let scaled = (image_height as f64 * opts.font_ratio).round() as u32;
    scaled.max(opts.min_font_size)
}

/// Computes bar and label geometry for an already chosen length.
///
/// `pixel_length` must be the conversion of `length_nm` on the image's
/// horizontal axis. `color` is passed through untouched; only emptiness is
/// rejected here.
pub fn compute_layout(
    frame: &ImageFrame,
    length_nm: f64,
    pixel_length: f64,
    color: &str,
    opts: &LayoutOptions,
) -> Result<ScaleBarSpec, ScalebarError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(ScalebarError::InvalidGeometry(format!(
            "image dimensions {}x{} (must be positive)",
            frame.width, frame.height
        )));
    }
    if !(pixel_length.is_finite() && pixel_length > 0.0) {
        return Err(ScalebarError::InvalidGeometry(format!(
            "bar length {} px (must be positive)",
            pixel_length
        )));
    }
    if color.trim().is_empty() {
        return Err(ScalebarError::InvalidColor(color.to_string()));
    }

    let width = frame.width as f64;
    let height = frame.height as f64;
    let thickness = bar_thickness(frame.height, opts);
    let font_size = font_size(frame.height, opts);
    let padding = opts.padding as f64;

    let bar_x = width - pixel_length - padding;
    let bar_y = height - thickness as f64 - padding;
    let label_x = bar_x + pixel_length / 2.0;
    let label_bottom = bar_y - font_size as f64 * opts.label_gap_ratio;

    Ok(ScaleBarSpec {
        length_nm,
        pixel_length,
        bar_thickness: thickness,
        padding: opts.padding,
        bar_anchor: PixelPoint::new(bar_x, bar_y),
        label_anchor: PixelPoint::new(label_x, label_bottom),
        font_size,
        label: format_label(length_nm),
        color: color.to_string(),
    })
}

/// Runs the whole sizing pipeline for one image: length selection, pixel
/// conversion, then layout.
pub fn plan_scale_bar(
    frame: &ImageFrame,
    calibration: &ImageCalibration,
    color: &str,
    opts: &LayoutOptions,
) -> Result<ScaleBarSpec, ScalebarError> {
    let length_nm = select_scale_length(frame.width, calibration.pixel_size_x)?;
    let pixels = pixel_length(length_nm, calibration.pixel_size_x)?;
    compute_layout(frame, length_nm, pixels, color, opts)
}
