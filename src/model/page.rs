//! Page-level types.

use super::{GlyphRun, Primitive};
use serde::{Deserialize, Serialize};

/// A single page of primitives, produced once by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Displayed page width in points (after rotation)
    pub width: f32,

    /// Displayed page height in points
    pub height: f32,

    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,

    /// Primitives in content-stream order
    pub primitives: Vec<Primitive>,
}

impl Page {
    /// Create a new empty page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            rotation: 0,
            primitives: Vec::new(),
        }
    }

    /// Create a new page with standard Letter size (8.5 x 11 inches).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Create a new page with standard A4 size (210 x 297 mm).
    pub fn a4(number: u32) -> Self {
        Self::new(number, 595.0, 842.0)
    }

    /// Builder-style primitive append, used when assembling pages by hand.
    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitives.push(primitive);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Glyph runs with their index in the primitive sequence.
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, &GlyphRun)> {
        self.primitives
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_glyph().map(|g| (i, g)))
    }

    /// Concatenated text of all glyph runs, in stream order.
    pub fn raw_text(&self) -> String {
        self.glyphs()
            .map(|(_, g)| g.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn image_count(&self) -> usize {
        self.primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Image(_)))
            .count()
    }
}
