//! Reading Olympus TIFF files.
//!
//! Only the first page is decoded. Calibration comes from the Olympus SIS
//! block ([`sis`]); the optional `XResolution` tag supplies the display
//! resolution.

pub mod sis;

pub use sis::{parse_sis, parse_sis_at, OlympusSis, SisGeneral, SisTimestamp, OLYMPUS_SIS_TAG};

use std::fs;
use std::io::Cursor;
use std::path::Path;

use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::calibration::{ImageCalibration, ImageFrame};
use crate::error::ScalebarError;

/// Sample data of the first page, as stored in the file.
#[derive(Clone, Debug, PartialEq)]
pub enum SourcePixels {
    Gray8(Vec<u8>),
    Gray16(Vec<u16>),
    Rgb8(Vec<u8>),
    Rgb16(Vec<u16>),
}

/// A decoded Olympus image with its calibration.
#[derive(Clone, Debug)]
pub struct OlympusImage {
    pub frame: ImageFrame,
    pub calibration: ImageCalibration,
    pub sis: OlympusSis,
    pub pixels: SourcePixels,
}

/// Reads and decodes an Olympus TIFF file from disk.
pub fn read_olympus_tiff(path: &Path) -> Result<OlympusImage, ScalebarError> {
    let bytes = fs::read(path).map_err(|source| ScalebarError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    decode_olympus_tiff(&bytes, path)
}

/// Decodes an Olympus TIFF held in memory. `path` is used for error
/// messages only.
pub fn decode_olympus_tiff(bytes: &[u8], path: &Path) -> Result<OlympusImage, ScalebarError> {
    let decode_err = |source: tiff::TiffError| ScalebarError::TiffDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(decode_err)?;
    let (width, height) = decoder.dimensions().map_err(decode_err)?;

    let sis_value = decoder
        .find_tag(Tag::Unknown(OLYMPUS_SIS_TAG))
        .map_err(decode_err)?
        .ok_or_else(|| {
            ScalebarError::MissingMetadata(format!(
                "tag {} (Olympus SIS) not found",
                OLYMPUS_SIS_TAG
            ))
        })?;
    let sis = read_sis_value(bytes, sis_value)?;
    let calibration = sis.calibration()?;

    let dpi = decoder
        .find_tag(Tag::XResolution)
        .map_err(decode_err)?
        .and_then(resolution_from_value);
    let frame = ImageFrame::new(width, height, dpi)?;

    let color_type = decoder.colortype().map_err(decode_err)?;
    let data = decoder.read_image().map_err(decode_err)?;
    let pixels = source_pixels(color_type, data, width, height, path)?;

    Ok(OlympusImage {
        frame,
        calibration,
        sis,
        pixels,
    })
}

/// The SIS tag normally holds an offset to the block. Some writers store
/// the block inline as bytes instead; its sub-tag offsets are absolute
/// either way.
fn read_sis_value(file: &[u8], value: Value) -> Result<OlympusSis, ScalebarError> {
    match value {
        Value::Unsigned(offset) | Value::Ifd(offset) => parse_sis_at(file, offset as usize),
        Value::UnsignedBig(offset) | Value::IfdBig(offset) => {
            let offset = usize::try_from(offset).map_err(|_| {
                ScalebarError::MissingMetadata(format!("SIS offset {} out of range", offset))
            })?;
            parse_sis_at(file, offset)
        }
        Value::List(items) => {
            let block = items
                .into_iter()
                .map(|item| match item {
                    Value::Byte(b) => Some(b),
                    _ => None,
                })
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| {
                    ScalebarError::MissingMetadata("SIS tag has an unexpected type".to_string())
                })?;
            parse_sis(file, &block)
        }
        other => Err(ScalebarError::MissingMetadata(format!(
            "SIS tag has an unexpected value {:?}",
            other
        ))),
    }
}

fn resolution_from_value(value: Value) -> Option<f64> {
    let (num, den) = match value {
        Value::Rational(n, d) => (n as f64, d as f64),
        Value::RationalBig(n, d) => (n as f64, d as f64),
        Value::List(mut items) if !items.is_empty() => {
            return resolution_from_value(items.swap_remove(0));
        }
        _ => return None,
    };
    (den != 0.0).then(|| num / den).filter(|dpi| *dpi > 0.0)
}

fn source_pixels(
    color_type: ColorType,
    data: DecodingResult,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<SourcePixels, ScalebarError> {
    let pixel_count = width as usize * height as usize;
    let pixels = match (color_type, data) {
        (ColorType::Gray(8), DecodingResult::U8(v)) => SourcePixels::Gray8(v),
        (ColorType::Gray(16), DecodingResult::U16(v)) => SourcePixels::Gray16(v),
        (ColorType::RGB(8), DecodingResult::U8(v)) => SourcePixels::Rgb8(v),
        (ColorType::RGB(16), DecodingResult::U16(v)) => SourcePixels::Rgb16(v),
        (other, _) => {
            return Err(unsupported(path, format!("{:?}", other)));
        }
    };

    let expected = match pixels {
        SourcePixels::Gray8(_) | SourcePixels::Gray16(_) => pixel_count,
        SourcePixels::Rgb8(_) | SourcePixels::Rgb16(_) => pixel_count * 3,
    };
    if pixels.sample_count() != expected {
        return Err(unsupported(
            path,
            format!(
                "{} samples for a {}x{} image (expected {})",
                pixels.sample_count(),
                width,
                height,
                expected
            ),
        ));
    }
    Ok(pixels)
}

fn unsupported(path: &Path, what: String) -> ScalebarError {
    ScalebarError::UnsupportedPixels(format!("{}: {}", display_name(path), what))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl SourcePixels {
    /// Number of stored samples (pixels × channels).
    pub fn sample_count(&self) -> usize {
        match self {
            SourcePixels::Gray8(v) | SourcePixels::Rgb8(v) => v.len(),
            SourcePixels::Gray16(v) | SourcePixels::Rgb16(v) => v.len(),
        }
    }
}
