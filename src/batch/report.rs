//! Batch report types.
//!
//! One [`FileOutcome`] per input file, so a failure in one file is recorded
//! next to the successes instead of ending the run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::calibration::ImageCalibration;
use crate::layout::ScaleBarSpec;

/// The result of annotating every TIFF in a directory.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            files: Vec::new(),
        }
    }

    pub fn add(&mut self, outcome: FileOutcome) {
        self.files.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn processed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_processed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.processed_count()
    }

    /// Returns true if no file failed.
    pub fn is_ok(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Prints the skipped files and the summary. Lines for annotated files are
/// emitted as each file is read (see [`CalibrationLine`]).
impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in self.files.iter().filter(|f| !f.is_processed()) {
            writeln!(f, "{}", outcome)?;
        }

        if self.files.is_empty() {
            return writeln!(f, "No TIFF files found in {}", self.input_dir.display());
        }

        writeln!(f)?;
        writeln!(
            f,
            "Annotated {} of {} file(s) into {}",
            self.processed_count(),
            self.total(),
            self.output_dir.display()
        )?;
        if self.failed_count() > 0 {
            writeln!(f, "{} file(s) failed", self.failed_count())?;
        }
        Ok(())
    }
}

/// What happened to one input file.
#[derive(Clone, Debug, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub input: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self.status, FileStatus::Processed { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Processed {
        output: PathBuf,
        nm_per_pixel_x: f64,
        nm_per_pixel_y: f64,
        calibration: ImageCalibration,
        scale_bar: ScaleBarSpec,
    },
    Failed {
        error: String,
    },
}

impl FileStatus {
    pub fn processed(output: PathBuf, calibration: ImageCalibration, scale_bar: ScaleBarSpec) -> Self {
        FileStatus::Processed {
            output,
            nm_per_pixel_x: calibration.nm_per_pixel_x(),
            nm_per_pixel_y: calibration.nm_per_pixel_y(),
            calibration,
            scale_bar,
        }
    }
}

/// The per-file console line, printed once a file's calibration is known.
#[derive(Clone, Copy, Debug)]
pub struct CalibrationLine<'a> {
    pub file_name: &'a str,
    pub calibration: &'a ImageCalibration,
}

impl fmt::Display for CalibrationLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `{:?}` keeps the decimal point on whole magnifications (x1000.0)
        write!(
            f,
            "filename: {}, (X): {:.3} nm/pixel, (Y): {:.3} nm/pixel, magnification: x{:?}",
            self.file_name,
            self.calibration.nm_per_pixel_x(),
            self.calibration.nm_per_pixel_y(),
            self.calibration.magnification
        )
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            FileStatus::Processed { calibration, .. } => fmt::Display::fmt(
                &CalibrationLine {
                    file_name: &self.file_name,
                    calibration,
                },
                f,
            ),
            FileStatus::Failed { error } => {
                write!(f, "filename: {}, skipped: {}", self.file_name, error)
            }
        }
    }
}
