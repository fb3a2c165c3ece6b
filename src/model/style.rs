//! Normalized text style.

use serde::{Deserialize, Serialize};

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Gray level in `0.0..=1.0`.
    pub fn from_gray(level: f32) -> Self {
        let v = unit_to_byte(level);
        Self::new(v, v, v)
    }

    /// RGB components in `0.0..=1.0`.
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(unit_to_byte(r), unit_to_byte(g), unit_to_byte(b))
    }

    /// Naive CMYK → RGB conversion (no color management).
    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        let k = k.clamp(0.0, 1.0);
        Self::from_rgb(
            (1.0 - c.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - m.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - y.clamp(0.0, 1.0)) * (1.0 - k),
        )
    }

    /// Hex form used by word-processor markup, e.g. "FF0000".
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Normalized, value-comparable style of a text run.
///
/// Two runs with equal resolved fields compare equal, which is what allows
/// adjacent runs to be merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRecord {
    pub font_family: String,
    /// Font size in half-points
    pub size_half_points: u16,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Color,
    pub alignment: Alignment,
}

impl StyleRecord {
    pub const DEFAULT_FAMILY: &'static str = "Times New Roman";
    pub const DEFAULT_SIZE_PT: f32 = 12.0;

    /// The style used when a run carries no usable font signal.
    pub fn default_body() -> Self {
        Self {
            font_family: Self::DEFAULT_FAMILY.to_string(),
            size_half_points: half_points(Self::DEFAULT_SIZE_PT),
            bold: false,
            italic: false,
            underline: false,
            color: Color::BLACK,
            alignment: Alignment::Left,
        }
    }

    pub fn size_pt(&self) -> f32 {
        self.size_half_points as f32 / 2.0
    }

    pub fn with_size_pt(mut self, size: f32) -> Self {
        self.size_half_points = half_points(size);
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Whether family, weight and slant match the default body style.
    pub fn has_default_face(&self) -> bool {
        self.font_family == Self::DEFAULT_FAMILY && !self.bold && !self.italic
    }
}

impl Default for StyleRecord {
    fn default() -> Self {
        Self::default_body()
    }
}

/// Quantize a point size to half-points, never below 1pt.
pub fn half_points(size_pt: f32) -> u16 {
    ((size_pt * 2.0).round() as i64).clamp(2, u16::MAX as i64) as u16
}
