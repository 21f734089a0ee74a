//! Label fonts.
//!
//! A TrueType/OpenType face is used when one can be found. Otherwise labels
//! fall back to a small built-in 5×7 bitmap font that covers everything a
//! scale-bar label needs.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::ScalebarError;

/// Font files tried, in order, when no font is configured.
const SYSTEM_FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// The face used to draw labels.
pub enum LabelFont {
    Outline { face: FontVec, path: PathBuf },
    Bitmap,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::Outline { path, .. } => f.debug_tuple("Outline").field(path).finish(),
            LabelFont::Bitmap => f.write_str("Bitmap"),
        }
    }
}

impl LabelFont {
    /// Loads a font file.
    pub fn load(path: &Path) -> Result<Self, ScalebarError> {
        let data = fs::read(path).map_err(|e| ScalebarError::FontLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let face = FontVec::try_from_vec(data).map_err(|e| ScalebarError::FontLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(LabelFont::Outline {
            face,
            path: path.to_path_buf(),
        })
    }

    /// Uses `explicit` when given (failing if it cannot be loaded), otherwise
    /// the first loadable system font, otherwise the bitmap font.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ScalebarError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        for candidate in SYSTEM_FONT_PATHS.iter().map(Path::new) {
            if !candidate.is_file() {
                continue;
            }
            match Self::load(candidate) {
                Ok(font) => return Ok(font),
                Err(e) => tracing::debug!("skipping font: {}", e),
            }
        }

        tracing::debug!("no system font found, using built-in bitmap font");
        Ok(LabelFont::Bitmap)
    }

    /// Width and height in pixels of `text` drawn `px_height` tall.
    pub fn measure(&self, px_height: u32, text: &str) -> (u32, u32) {
        match self {
            LabelFont::Outline { face, .. } => text_size(scale(px_height), face, text),
            LabelFont::Bitmap => {
                let cell = bitmap_cell(px_height);
                let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                let width = chars
                    .saturating_mul(GLYPH_ADVANCE)
                    .saturating_sub(1)
                    .saturating_mul(cell);
                (width, GLYPH_HEIGHT.saturating_mul(cell))
            }
        }
    }

    /// Distance from the `y` passed to [`LabelFont::draw`] down to the
    /// lowest row any glyph can ink, descenders included.
    ///
    /// Outline text is laid out with its baseline at `y + ascent`, so the
    /// line reaches `ascent - descent` below the origin.
    pub fn line_height(&self, px_height: u32) -> u32 {
        match self {
            LabelFont::Outline { face, .. } => {
                let scaled = face.as_scaled(scale(px_height));
                (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32
            }
            LabelFont::Bitmap => GLYPH_HEIGHT.saturating_mul(bitmap_cell(px_height)),
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`). Pixels outside
    /// the canvas are clipped.
    pub fn draw(
        &self,
        canvas: &mut RgbImage,
        color: Rgb<u8>,
        x: i32,
        y: i32,
        px_height: u32,
        text: &str,
    ) {
        match self {
            LabelFont::Outline { face, .. } => {
                draw_text_mut(canvas, color, x, y, scale(px_height), face, text)
            }
            LabelFont::Bitmap => draw_bitmap_text(canvas, color, x, y, px_height, text),
        }
    }
}

fn scale(px_height: u32) -> PxScale {
    PxScale::from(px_height.max(1) as f32)
}

fn bitmap_cell(px_height: u32) -> u32 {
    ((px_height as f64 / GLYPH_HEIGHT as f64).round() as u32).max(1)
}

fn draw_bitmap_text(
    canvas: &mut RgbImage,
    color: Rgb<u8>,
    x: i32,
    y: i32,
    px_height: u32,
    text: &str,
) {
    // A dot larger than the canvas draws the same pixels as one that just
    // covers it, and keeps the offsets below within i32.
    let max_cell = canvas.width().max(canvas.height()).max(1);
    let cell = i64::from(bitmap_cell(px_height).min(max_cell));
    let (left, top) = (i64::from(x), i64::from(y));
    let (right, bottom) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let origin_x = left + i as i64 * i64::from(GLYPH_ADVANCE) * cell;
        if origin_x >= right {
            break;
        }
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let dot_x = origin_x + i64::from(col) * cell;
                let dot_y = top + row as i64 * cell;
                if dot_x >= right || dot_y >= bottom || dot_x + cell <= 0 || dot_y + cell <= 0 {
                    continue;
                }
                let rect = Rect::at(dot_x as i32, dot_y as i32).of_size(cell as u32, cell as u32);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}

/// Rows of a 5×7 glyph, most significant of the low five bits leftmost.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11],
        'µ' | 'μ' => [0x00, 0x00, 0x11, 0x11, 0x13, 0x1D, 0x10],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}
