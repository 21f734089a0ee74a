//! Olympus SIS metadata block (TIFF tag 33560).
//!
//! The block is a little-endian header followed by typed sub-tags whose
//! offsets are absolute positions in the TIFF file. Only the "general data"
//! sub-tag (type 1) carries calibration; the rest are skipped.

use serde::Serialize;

use crate::calibration::ImageCalibration;
use crate::error::ScalebarError;

/// Private TIFF tag holding the SIS block.
pub const OLYMPUS_SIS_TAG: u16 = 33560;

const SIS_MAGIC: &[u8; 4] = b"SIS0";
const HEADER_LEN: usize = 60;
const ENTRY_LEN: usize = 8;
const GENERAL_DATA_TYPE: i16 = 1;
const GENERAL_DATA_LEN: usize = 112;

/// Parsed contents of an SIS block.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OlympusSis {
    pub name: String,
    pub timestamp: Option<SisTimestamp>,
    pub general: Option<SisGeneral>,
}

/// Acquisition time recorded in the SIS header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SisTimestamp {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

/// The "general data" sub-tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SisGeneral {
    /// Meters per pixel along x.
    pub pixel_size_x: f64,
    /// Meters per pixel along y.
    pub pixel_size_y: f64,
    pub magnification: f64,
    pub camera_name: String,
    pub picture_type: String,
}

impl OlympusSis {
    /// Validated calibration from the general data sub-tag.
    pub fn calibration(&self) -> Result<ImageCalibration, ScalebarError> {
        let general = self.general.as_ref().ok_or_else(|| {
            ScalebarError::MissingMetadata(
                "SIS block has no general data (pixelsizex, pixelsizey, magnification)"
                    .to_string(),
            )
        })?;
        ImageCalibration::new(
            general.pixel_size_x,
            general.pixel_size_y,
            general.magnification,
        )
    }
}

/// Parses an SIS block.
///
/// `block` starts at the SIS header; sub-tag offsets are resolved against
/// `file`, the complete TIFF byte stream.
pub fn parse_sis(file: &[u8], block: &[u8]) -> Result<OlympusSis, ScalebarError> {
    let header = block
        .get(..HEADER_LEN)
        .ok_or_else(|| truncated("SIS header"))?;
    if &header[..4] != SIS_MAGIC {
        return Err(ScalebarError::MissingMetadata(
            "SIS block has an invalid magic number".to_string(),
        ));
    }

    let minute = read_i16(header, 10)?;
    let hour = read_i16(header, 12)?;
    let day = read_i16(header, 14)?;
    let month = read_i16(header, 16)?;
    let year = read_i16(header, 18)?;
    let name = read_cstr(header, 26, 32)?;
    let tag_count = read_i16(header, 58)?.max(0) as usize;

    let mut sis = OlympusSis {
        name,
        timestamp: make_timestamp(year, month, day, hour, minute),
        general: None,
    };

    // The sub-tag table directly follows the fixed header.
    let entries = block
        .get(HEADER_LEN..HEADER_LEN + tag_count * ENTRY_LEN)
        .ok_or_else(|| truncated("SIS sub-tag table"))?;

    for entry in entries.chunks_exact(ENTRY_LEN) {
        let tag_type = read_i16(entry, 0)?;
        let offset = read_u32(entry, 4)? as usize;
        if tag_type == GENERAL_DATA_TYPE {
            sis.general = Some(parse_general(file, offset)?);
        }
    }

    Ok(sis)
}

/// Parses an SIS block located at `offset` inside `file`.
pub fn parse_sis_at(file: &[u8], offset: usize) -> Result<OlympusSis, ScalebarError> {
    let header = file
        .get(offset..)
        .ok_or_else(|| truncated("SIS block offset"))?;
    parse_sis(file, header)
}

/// Fuzzing entry point: treat the input as a file with the block at 0.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_sis(data: &[u8]) -> Result<OlympusSis, ScalebarError> {
    parse_sis_at(data, 0)
}

fn parse_general(file: &[u8], offset: usize) -> Result<SisGeneral, ScalebarError> {
    let block = offset
        .checked_add(GENERAL_DATA_LEN)
        .and_then(|end| file.get(offset..end))
        .ok_or_else(|| truncated("SIS general data"))?;

    let exponent = read_i16(block, 10)?;
    let x_cal = read_f64(block, 12)?;
    let y_cal = read_f64(block, 20)?;
    let magnification = read_f64(block, 36)?;
    let scale = 10f64.powf(exponent as f64);

    Ok(SisGeneral {
        pixel_size_x: x_cal * scale,
        pixel_size_y: y_cal * scale,
        magnification,
        camera_name: read_cstr(block, 46, 34)?,
        picture_type: read_cstr(block, 80, 32)?,
    })
}

fn make_timestamp(year: i16, month: i16, day: i16, hour: i16, minute: i16) -> Option<SisTimestamp> {
    let month = month.checked_add(1)?;
    let valid = (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && (0..24).contains(&hour)
        && (0..60).contains(&minute);
    valid.then(|| SisTimestamp {
        year: 1900 + year as i32,
        month: month as u8,
        day: day as u8,
        hour: hour as u8,
        minute: minute as u8,
    })
}

fn truncated(what: &str) -> ScalebarError {
    ScalebarError::MissingMetadata(format!("{} is truncated", what))
}

fn field<const N: usize>(buf: &[u8], pos: usize) -> Result<[u8; N], ScalebarError> {
    buf.get(pos..pos + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| truncated("SIS field"))
}

fn read_i16(buf: &[u8], pos: usize) -> Result<i16, ScalebarError> {
    field::<2>(buf, pos).map(i16::from_le_bytes)
}

fn read_u32(buf: &[u8], pos: usize) -> Result<u32, ScalebarError> {
    field::<4>(buf, pos).map(u32::from_le_bytes)
}

fn read_f64(buf: &[u8], pos: usize) -> Result<f64, ScalebarError> {
    field::<8>(buf, pos).map(f64::from_le_bytes)
}

fn read_cstr(buf: &[u8], pos: usize, len: usize) -> Result<String, ScalebarError> {
    let bytes = buf
        .get(pos..pos + len)
        .ok_or_else(|| truncated("SIS string"))?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}
