//! Text rendering of colors and palettes.

use core::fmt::Write as _;
use core::str::FromStr;

use crate::color::Color;
use crate::error::PaletteError;
use crate::palette::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    /// `255, 128, 0`
    Rgb,
    /// `30°, 100%, 100%`
    Hsv,
    /// `#FF8000`
    #[default]
    Hex,
}

impl FromStr for ColorFormat {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Self::Rgb),
            "hsv" => Ok(Self::Hsv),
            "hex" => Ok(Self::Hex),
            other => Err(PaletteError::invalid(format!(
                "unknown color format {other:?} (expected rgb, hsv or hex)"
            ))),
        }
    }
}

impl core::fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Rgb => "rgb",
            Self::Hsv => "hsv",
            Self::Hex => "hex",
        })
    }
}

pub fn format_color(color: Color, format: ColorFormat) -> String {
    match format {
        ColorFormat::Rgb => format!("{}, {}, {}", color.r, color.g, color.b),
        ColorFormat::Hsv => {
            let hsv = color.to_hsv();
            // 359.6° rounds to 360, which is 0.
            let h = hsv.h.round() as u32 % 360;
            format!(
                "{}°, {}%, {}%",
                h,
                (hsv.s * 100.0).round() as u32,
                (hsv.v * 100.0).round() as u32
            )
        }
        ColorFormat::Hex => color.to_hex(),
    }
}

/// A two-cell block painted with a 24-bit ANSI background.
pub fn ansi_swatch(color: Color) -> String {
    format!("\x1b[48;2;{};{};{}m  \x1b[0m", color.r, color.g, color.b)
}

/// One line per color, newline terminated. With `swatch`, each line starts
/// with an ANSI color block.
pub fn format_palette(palette: &Palette, format: ColorFormat, swatch: bool) -> String {
    let mut out = String::new();
    for color in palette {
        if swatch {
            out.push_str(&ansi_swatch(*color));
            out.push(' ');
        }
        let _ = writeln!(out, "{}", format_color(*color, format));
    }
    out
}
