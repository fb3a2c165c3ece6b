//! Positioned drawing primitives extracted from a page.

use serde::{Deserialize, Serialize};

use super::{Color, ImageData, Point, Rect};

/// Color space of a fill or stroke color, as declared in the content stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ColorSpaceKind {
    #[default]
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    /// ICC-based or calibrated spaces, treated as their device equivalent
    Calibrated,
    /// Separation, DeviceN, Indexed, Pattern, Lab: approximated
    Unsupported(String),
}

impl ColorSpaceKind {
    pub fn is_supported(&self) -> bool {
        !matches!(self, ColorSpaceKind::Unsupported(_))
    }
}

/// Font metadata parsed from a `FontDescriptor` dictionary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontDescriptor {
    /// `/FontFamily`
    pub family: Option<String>,
    /// `/FontWeight` (100-900)
    pub weight: Option<u16>,
    /// `/Flags`
    pub flags: u32,
    /// `/ItalicAngle`
    pub italic_angle: f32,
}

impl FontDescriptor {
    pub const FLAG_FIXED_PITCH: u32 = 1;
    pub const FLAG_ITALIC: u32 = 1 << 6;
    pub const FLAG_FORCE_BOLD: u32 = 1 << 18;

    pub fn is_fixed_pitch(&self) -> bool {
        self.flags & Self::FLAG_FIXED_PITCH != 0
    }
}

/// Reference to the font a glyph run was shown with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontRef {
    /// Resource name in the page's font dictionary (e.g., "F1")
    pub resource: String,
    /// `/BaseFont`, absent when the resource could not be resolved
    pub base_font: Option<String>,
    /// Parsed descriptor, when the font carries one
    pub descriptor: Option<FontDescriptor>,
}

impl FontRef {
    /// A font reference that did not resolve to a font dictionary.
    pub fn unresolved(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            base_font: None,
            descriptor: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.base_font.is_some()
    }
}

/// A run of text shown by one text-showing operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    /// Axis-aligned bounds of the (possibly rotated) run
    pub bbox: Rect,
    /// Baseline y of the run origin
    pub baseline: f32,
    pub text: String,
    pub font: FontRef,
    /// Effective font size in points
    pub size: f32,
    /// Fill color at the time the run was shown
    pub color: Color,
    pub color_space: ColorSpaceKind,
    /// Rotation of the text direction in degrees
    pub rotation: f32,
}

impl GlyphRun {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Average advance per character.
    pub fn avg_glyph_width(&self) -> f32 {
        let n = self.char_count();
        if n == 0 || self.bbox.width() <= 0.0 {
            self.size * 0.5
        } else {
            self.bbox.width() / n as f32
        }
    }
}

/// How a path is painted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathStyle {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    pub line_width: f32,
}

/// One subpath of a painted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub points: Vec<Point>,
    pub closed: bool,
    pub style: PathStyle,
}

impl PathSegment {
    pub fn bbox(&self) -> Option<Rect> {
        Rect::from_points(&self.points)
    }
}

/// A placed raster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrimitive {
    pub bbox: Rect,
    /// XObject resource name
    pub name: String,
    pub data: ImageData,
}

/// A positioned drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Glyph(GlyphRun),
    Path(PathSegment),
    Image(ImagePrimitive),
    /// Content with no flow-document equivalent (shadings, inline images)
    Unsupported { kind: String, bbox: Option<Rect> },
}

impl Primitive {
    pub fn bbox(&self) -> Option<Rect> {
        match self {
            Primitive::Glyph(g) => Some(g.bbox),
            Primitive::Path(p) => p.bbox(),
            Primitive::Image(i) => Some(i.bbox),
            Primitive::Unsupported { bbox, .. } => *bbox,
        }
    }

    pub fn as_glyph(&self) -> Option<&GlyphRun> {
        match self {
            Primitive::Glyph(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathSegment> {
        match self {
            Primitive::Path(p) => Some(p),
            _ => None,
        }
    }
}
