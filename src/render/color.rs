//! Scale-bar color parsing.

use std::fmt;
use std::str::FromStr;

use image::Rgb;
use palette::Srgb;

use crate::error::ScalebarError;

/// A caller-chosen color: the text as given plus its resolved RGB value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleColor {
    name: String,
    rgb: Rgb<u8>,
}

impl ScaleColor {
    /// The color exactly as the user wrote it.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rgb(&self) -> Rgb<u8> {
        self.rgb
    }
}

impl Default for ScaleColor {
    fn default() -> Self {
        Self {
            name: "white".to_string(),
            rgb: Rgb([255, 255, 255]),
        }
    }
}

impl fmt::Display for ScaleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ScaleColor {
    type Err = ScalebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Resolves a color value.
///
/// Accepts single-letter codes (`w`, `k`, `r`, `g`, `b`, `c`, `m`, `y`),
/// CSS color names, grayscale levels between `"0"` and `"1"`, and hex
/// triplets with or without a leading `#`.
pub fn parse_color(value: &str) -> Result<ScaleColor, ScalebarError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScalebarError::InvalidColor(value.to_string()));
    }

    let rgb = short_code(trimmed)
        .or_else(|| named(trimmed))
        .or_else(|| gray_level(trimmed))
        .or_else(|| hex(trimmed))
        .ok_or_else(|| ScalebarError::InvalidColor(value.to_string()))?;

    Ok(ScaleColor {
        name: trimmed.to_string(),
        rgb,
    })
}

fn short_code(s: &str) -> Option<Rgb<u8>> {
    let rgb = match s {
        "w" => [255, 255, 255],
        "k" => [0, 0, 0],
        "r" => [255, 0, 0],
        "g" => [0, 128, 0],
        "b" => [0, 0, 255],
        "c" => [0, 191, 191],
        "m" => [191, 0, 191],
        "y" => [191, 191, 0],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn named(s: &str) -> Option<Rgb<u8>> {
    let key: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    palette::named::from_str(&key).map(to_rgb)
}

fn gray_level(s: &str) -> Option<Rgb<u8>> {
    let level: f64 = s.parse().ok()?;
    if !(0.0..=1.0).contains(&level) {
        return None;
    }
    let v = (level * 255.0).round() as u8;
    Some(Rgb([v, v, v]))
}

fn hex(s: &str) -> Option<Rgb<u8>> {
    Srgb::<u8>::from_str(s).ok().map(to_rgb)
}

fn to_rgb(color: Srgb<u8>) -> Rgb<u8> {
    Rgb([color.red, color.green, color.blue])
}
