//! Compositing the scale bar onto the image and writing the result.
//!
//! Source samples are mapped to an 8-bit RGB canvas, the bar and label are
//! drawn in the chosen color, and the canvas is written as an RGB8 TIFF.
//! Output goes through a temporary file in the destination directory that
//! is only renamed into place once fully written.

mod color;
mod font;

pub use color::{parse_color, ScaleColor};
pub use font::LabelFont;

use std::io::{Cursor, Write};
use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tiff::encoder::{colortype, Rational, TiffEncoder};
use tiff::tags::ResolutionUnit;

use crate::calibration::ImageFrame;
use crate::error::ScalebarError;
use crate::layout::ScaleBarSpec;
use crate::metadata::SourcePixels;

/// Typographic points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Builds the 8-bit display canvas from source samples.
///
/// 16-bit samples use the full `0..=65535` range; 8-bit samples pass
/// through unchanged.
pub fn display_canvas(pixels: &SourcePixels, frame: &ImageFrame) -> Result<RgbImage, ScalebarError> {
    let raw: Vec<u8> = match pixels {
        SourcePixels::Gray8(v) => v.iter().flat_map(|&g| [g, g, g]).collect(),
        SourcePixels::Gray16(v) => v
            .iter()
            .map(|&g| (g >> 8) as u8)
            .flat_map(|g| [g, g, g])
            .collect(),
        SourcePixels::Rgb8(v) => v.clone(),
        SourcePixels::Rgb16(v) => v.iter().map(|&s| (s >> 8) as u8).collect(),
    };

    RgbImage::from_raw(frame.width, frame.height, raw).ok_or_else(|| {
        ScalebarError::UnsupportedPixels(format!(
            "{} samples do not fill a {}x{} image",
            pixels.sample_count(),
            frame.width,
            frame.height
        ))
    })
}

/// Label height in pixels for a point size at the given resolution.
pub fn label_pixel_height(font_size: u32, dpi: f64) -> u32 {
    ((font_size as f64 * dpi / POINTS_PER_INCH).round() as u32).max(1)
}

/// Draws the bar and its label onto `canvas`.
pub fn draw_scale_bar(
    canvas: &mut RgbImage,
    spec: &ScaleBarSpec,
    color: Rgb<u8>,
    font: &LabelFont,
    dpi: f64,
) {
    let bar = Rect::at(
        spec.bar_anchor.x.round() as i32,
        spec.bar_anchor.y.round() as i32,
    )
    .of_size(
        (spec.pixel_length.round() as u32).max(1),
        spec.bar_thickness.max(1),
    );
    draw_filled_rect_mut(canvas, bar, color);

    // A label taller than the image could never be read anyway.
    let px_height = label_pixel_height(spec.font_size, dpi).min(canvas.height().max(1));
    let (text_w, _) = font.measure(px_height, &spec.label);
    let x = (spec.label_anchor.x - text_w as f64 / 2.0).round() as i32;
    let y = (spec.label_anchor.y - font.line_height(px_height) as f64).round() as i32;
    font.draw(canvas, color, x, y, px_height, &spec.label);
}

/// Encodes `canvas` as an uncompressed RGB8 TIFF with the given resolution.
pub fn encode_tiff(canvas: &RgbImage, dpi: f64) -> Result<Vec<u8>, tiff::TiffError> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer)?;
        let mut image = encoder.new_image::<colortype::RGB8>(canvas.width(), canvas.height())?;
        image.resolution(
            ResolutionUnit::Inch,
            Rational {
                n: (dpi * 100.0).round() as u32,
                d: 100,
            },
        );
        image.write_data(canvas.as_raw())?;
    }
    Ok(buffer.into_inner())
}

/// Writes `canvas` to `path` so that either the complete file appears or
/// nothing does.
pub fn write_tiff_atomic(path: &Path, canvas: &RgbImage, dpi: f64) -> Result<(), ScalebarError> {
    let bytes = encode_tiff(canvas, dpi).map_err(|source| ScalebarError::TiffEncode {
        path: path.to_path_buf(),
        source,
    })?;

    let write_err = |source: std::io::Error| ScalebarError::FileWrite {
        path: path.to_path_buf(),
        source,
    };
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".scalebar-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
