//! Directory-level batch processing.
//!
//! Every `.tif`/`.tiff` file directly inside the input directory is read,
//! sized, annotated and written to `<dir>/scaled/<stem>_scaled.tif`. Files
//! are independent: each produces its own [`FileOutcome`].

mod report;

pub use report::{BatchReport, CalibrationLine, FileOutcome, FileStatus};

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScalebarError;
use crate::layout::{plan_scale_bar, LayoutOptions};
use crate::metadata::read_olympus_tiff;
use crate::render::{display_canvas, draw_scale_bar, write_tiff_atomic, LabelFont, ScaleColor};

const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Name of the output subdirectory created under the input directory.
pub const DEFAULT_OUTPUT_DIR: &str = "scaled";

/// Appended to each input file stem.
pub const OUTPUT_SUFFIX: &str = "_scaled";

/// Options shared by every file of a batch.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    pub color: ScaleColor,
    pub layout: LayoutOptions,
    pub output_dir_name: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            color: ScaleColor::default(),
            layout: LayoutOptions::default(),
            output_dir_name: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

/// Annotates every TIFF file in `dir`.
///
/// Only directory-level problems (missing or unreadable input directory,
/// bad or uncreatable output directory) are returned as errors; per-file
/// failures are recorded in the report.
pub fn process_directory(
    dir: &Path,
    opts: &BatchOptions,
    font: &LabelFont,
) -> Result<BatchReport, ScalebarError> {
    process_directory_with(dir, opts, font, |_| {})
}

/// Like [`process_directory`], calling `on_calibration` for each file as
/// soon as its metadata has been read, before the file is sized and drawn.
pub fn process_directory_with<F>(
    dir: &Path,
    opts: &BatchOptions,
    font: &LabelFont,
    mut on_calibration: F,
) -> Result<BatchReport, ScalebarError>
where
    F: FnMut(&CalibrationLine<'_>),
{
    validate_output_dir_name(&opts.output_dir_name)?;
    let files = collect_tiff_files(dir)?;

    let output_dir = dir.join(&opts.output_dir_name);
    fs::create_dir_all(&output_dir).map_err(|source| ScalebarError::FileWrite {
        path: output_dir.clone(),
        source,
    })?;

    let mut report = BatchReport::new(dir, &output_dir);
    for input in files {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let status = match process_file(&input, &output_dir, opts, font, &mut on_calibration) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(file = %file_name, "skipping file: {}", e);
                FileStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.add(FileOutcome {
            file_name,
            input,
            status,
        });
    }

    Ok(report)
}

/// Reads, annotates and writes a single file.
pub fn process_file<F>(
    input: &Path,
    output_dir: &Path,
    opts: &BatchOptions,
    font: &LabelFont,
    on_calibration: &mut F,
) -> Result<FileStatus, ScalebarError>
where
    F: FnMut(&CalibrationLine<'_>),
{
    let image = read_olympus_tiff(input)?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    on_calibration(&CalibrationLine {
        file_name: &file_name,
        calibration: &image.calibration,
    });

    let spec = plan_scale_bar(&image.frame, &image.calibration, opts.color.name(), &opts.layout)?;
    tracing::debug!(
        file = %input.display(),
        length_nm = spec.length_nm,
        pixel_length = spec.pixel_length,
        label = %spec.label,
        "planned scale bar"
    );

    let dpi = image.frame.effective_dpi();
    let mut canvas = display_canvas(&image.pixels, &image.frame)?;
    draw_scale_bar(&mut canvas, &spec, opts.color.rgb(), font, dpi);

    let output = output_path(output_dir, input);
    write_tiff_atomic(&output, &canvas, dpi)?;
    tracing::info!(output = %output.display(), "wrote annotated image");

    Ok(FileStatus::processed(output, image.calibration, spec))
}

/// Lists TIFF files directly inside `dir`, sorted by file name.
pub fn collect_tiff_files(dir: &Path) -> Result<Vec<PathBuf>, ScalebarError> {
    if !dir.is_dir() {
        return Err(ScalebarError::InputDirectory {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ScalebarError::InputDirectory {
            path: dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        if entry.file_type().is_file() && has_tiff_extension(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

/// Checks that `name` is one plain directory name, so output always lands
/// in a subdirectory that the next run will not scan.
pub fn validate_output_dir_name(name: &str) -> Result<(), ScalebarError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.ends_with(['/', '\\']) => Ok(()),
        _ => Err(ScalebarError::InvalidOutputDir(name.to_string())),
    }
}

/// `<output_dir>/<stem>_scaled.tif`.
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}{}.tif", stem, OUTPUT_SUFFIX))
}

fn has_tiff_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    TIFF_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}
