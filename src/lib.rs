//! Olympus scale bar: burn calibrated scale bars into microscope TIFFs.
//!
//! Each Olympus TIFF carries its pixel size in a private metadata block.
//! This crate reads that calibration, picks a round physical length for the
//! bar, lays the bar and its label out in the bottom-right corner, and
//! writes an annotated copy of the image.
//!
//! # Modules
//!
//! - [`calibration`]: pixel calibration, the length catalog and bar sizing
//! - [`layout`]: bar/label geometry and label text
//! - [`metadata`]: TIFF decoding and the Olympus SIS block
//! - [`render`]: colors, fonts, compositing and TIFF output
//! - [`batch`]: directory processing and the batch report
//! - [`error`]: error types

pub mod batch;
pub mod calibration;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod render;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};

pub use error::ScalebarError;

/// The olympus-scalebar CLI application.
#[derive(Parser)]
#[command(name = "olympus-scalebar")]
#[command(version, about)]
struct Cli {
    /// Directory containing raw Olympus TIFF images.
    directory: Option<PathBuf>,

    /// Color of the scale bar and label (name, single-letter code, hex, or
    /// gray level between 0 and 1).
    #[arg(
        short,
        long,
        default_value = "white",
        env = "SCALEBAR_COLOR",
        value_parser = parse_color_arg
    )]
    color: render::ScaleColor,

    /// TrueType/OpenType font for the label (default: first system font
    /// found, else a built-in bitmap font).
    #[arg(long, env = "SCALEBAR_FONT")]
    font: Option<PathBuf>,

    /// Distance in pixels between the bar and the right/bottom edges.
    #[arg(long, default_value_t = 20, env = "SCALEBAR_PADDING")]
    padding: u32,

    /// Name of the output subdirectory created inside the input directory.
    #[arg(long, default_value = batch::DEFAULT_OUTPUT_DIR, value_parser = parse_output_dir_arg)]
    output_dir_name: String,

    /// Format of the summary printed after processing.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Exit non-zero if any file could not be annotated.
    #[arg(long)]
    strict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn parse_color_arg(value: &str) -> Result<render::ScaleColor, String> {
    render::parse_color(value).map_err(|e| e.to_string())
}

fn parse_output_dir_arg(value: &str) -> Result<String, String> {
    batch::validate_output_dir_name(value)
        .map(|()| value.to_string())
        .map_err(|e| e.to_string())
}

/// Run the olympus-scalebar CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), ScalebarError> {
    let cli = Cli::parse();

    let Some(directory) = cli.directory.clone() else {
        // No directory: show usage and exit successfully
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let font = render::LabelFont::discover(cli.font.as_deref())?;
    let opts = batch::BatchOptions {
        color: cli.color.clone(),
        layout: layout::LayoutOptions {
            padding: cli.padding,
            ..Default::default()
        },
        output_dir_name: cli.output_dir_name.clone(),
    };

    // Per-file calibration lines go to stdout, except in JSON mode where
    // stdout carries only the report.
    let report = batch::process_directory_with(&directory, &opts, &font, |line| match cli.report {
        ReportFormat::Json => eprintln!("{}", line),
        ReportFormat::Text => println!("{}", line),
    })?;

    match cli.report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print!("{}", report),
    }

    if cli.strict && !report.is_ok() {
        Err(ScalebarError::StrictFailures {
            failed: report.failed_count(),
            total: report.total(),
        })
    } else {
        Ok(())
    }
}
