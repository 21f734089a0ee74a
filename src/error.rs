use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scale-bar operations.
///
/// Variants fall into two groups. Per-file failures (metadata, calibration,
/// geometry, decoding and writing) are recorded in the batch report and the
/// run moves on to the next file. Run-level failures (input directory, color,
/// font, strict mode) abort the whole run.
#[derive(Debug, Error)]
pub enum ScalebarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read input directory {path}: {message}")]
    InputDirectory { path: PathBuf, message: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode TIFF {path}: {source}")]
    TiffDecode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Failed to encode TIFF {path}: {source}")]
    TiffEncode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Missing or invalid Olympus metadata: {0}")]
    MissingMetadata(String),

    #[error("Unsupported pixel layout: {0}")]
    UnsupportedPixels(String),

    #[error("Degenerate calibration: {0}")]
    DegenerateCalibration(String),

    #[error(
        "Image too small for a scale bar: one tenth of its width is {threshold_nm} nm, below the smallest bar of {min_nm} nm"
    )]
    ScaleBelowCatalog { threshold_nm: f64, min_nm: f64 },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid output directory name '{0}': must be a single directory name")]
    InvalidOutputDir(String),

    #[error("Invalid color '{0}'")]
    InvalidColor(String),

    #[error("Failed to load font {path}: {message}")]
    FontLoad { path: PathBuf, message: String },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("{failed} of {total} file(s) failed")]
    StrictFailures { failed: usize, total: usize },
}
