//! Color mapping engine: hex parsing, opacity handling, and
//! threshold-bucket ramp lookup.
//!
//! Everything here is pure — identical inputs always produce
//! byte-identical output, which the renderer relies on for its
//! change-detection memoization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::style::LayerStyle;
use crate::thresholds::{bucket_index, thresholds_for};

pub type Rgb = [u8; 3];
pub type Rgba = [u8; 4];

/// Viridis-style ramp, low to high.
pub const RAMP_VIRIDIS: [Rgb; 5] = [
    [253, 231, 37],
    [94, 201, 98],
    [33, 145, 140],
    [59, 82, 139],
    [68, 1, 84],
];

/// Okabe-Ito colorblind-safe ramp.
pub const RAMP_OKABE_ITO: [Rgb; 5] = [
    [230, 159, 0],
    [86, 180, 233],
    [0, 158, 115],
    [240, 228, 66],
    [0, 114, 178],
];

/// Yellow-to-red color range for the density heatmap representation.
pub const HEATMAP_COLOR_RANGE: [Rgb; 5] = [
    [255, 255, 178],
    [254, 204, 92],
    [253, 141, 60],
    [240, 59, 32],
    [189, 0, 38],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteMode {
    #[default]
    Default,
    ColorblindSafe,
}

impl PaletteMode {
    pub fn ramp(self) -> &'static [Rgb] {
        match self {
            PaletteMode::Default => &RAMP_VIRIDIS,
            PaletteMode::ColorblindSafe => &RAMP_OKABE_ITO,
        }
    }
}

/// Parse a `#rrggbb` hex string. Returns `None` for anything else.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Hex string to RGBA at the given alpha. Unparseable input yields
/// black rather than an error so a bad persisted color can never
/// break a compile.
pub fn hex_to_rgba(hex: &str, alpha: u8) -> Rgba {
    let [r, g, b] = parse_hex(hex).unwrap_or([0, 0, 0]);
    [r, g, b, alpha]
}

/// Opacity in [0, 1] to an alpha byte, rounded and clamped.
pub fn opacity_alpha(opacity: f64) -> u8 {
    (opacity * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Fill color for one feature under a layer style.
///
/// Without a color-by column this is the base fill at the style's
/// opacity. With one, the feature's value (missing or non-numeric
/// reads as 0) is bucketed against the column's thresholds and the
/// ramp entry at that bucket is used, clamped to the ramp's last
/// entry.
pub fn fill_color(style: &LayerStyle, attributes: &Map<String, Value>, ramp: &[Rgb]) -> Rgba {
    let alpha = opacity_alpha(style.opacity);

    let Some(column) = style.color_by_column.as_deref() else {
        return hex_to_rgba(&style.fill_color, alpha);
    };
    if ramp.is_empty() {
        return hex_to_rgba(&style.fill_color, alpha);
    }

    let value = attributes
        .get(column)
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let idx = bucket_index(value, thresholds_for(column)).min(ramp.len() - 1);
    let [r, g, b] = ramp[idx];
    [r, g, b, alpha]
}

/// Outline color for a layer: the base outline hex at full alpha.
/// Never affected by opacity or color-by.
pub fn line_color(style: &LayerStyle) -> Rgba {
    hex_to_rgba(&style.outline_color, 255)
}
