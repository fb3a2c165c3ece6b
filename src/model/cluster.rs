//! Provisional groupings of primitives.
//!
//! Clusters never own primitives. Words reference glyph runs by their index
//! in [`Page::primitives`](super::Page), lines reference words, paragraphs
//! and table regions reference lines.

use serde::{Deserialize, Serialize};

use super::Rect;

/// Glyph runs close enough to read as one word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Indices of glyph runs in the page's primitive sequence
    pub glyphs: Vec<usize>,
    pub bbox: Rect,
    pub baseline: f32,
    pub font_size: f32,
    pub text: String,
}

/// Words sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Indices into [`ClusterTree::words`], left to right
    pub words: Vec<usize>,
    pub bbox: Rect,
    pub baseline: f32,
    pub font_size: f32,
    pub text: String,
    /// A glyph in the line is rotated beyond the tolerance
    pub rotated: bool,
}

/// Lines forming one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphCluster {
    /// Indices into [`ClusterTree::lines`], top to bottom
    pub lines: Vec<usize>,
    pub bbox: Rect,
    /// Set when clustering relied on rotated geometry
    pub low_confidence: bool,
    /// Horizontal offset of the first line relative to the others
    pub first_line_indent: f32,
    pub list_item: bool,
}

/// A horizontal or vertical ruling line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ruling {
    /// y for horizontal rulings, x for vertical ones
    pub position: f32,
    /// Extent along the ruling's own axis
    pub start: f32,
    pub end: f32,
}

impl Ruling {
    pub fn new(position: f32, start: f32, end: f32) -> Self {
        Self {
            position,
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Fraction of `[from, to]` covered by this ruling.
    pub fn coverage(&self, from: f32, to: f32) -> f32 {
        let span = to - from;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.end.min(to) - self.start.max(from)).max(0.0)) / span
    }
}

/// Ruling network backing a ruled table region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RulingGrid {
    pub horizontals: Vec<Ruling>,
    pub verticals: Vec<Ruling>,
}

/// How a table region was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionKind {
    /// A connected network of ruling lines
    Ruled(RulingGrid),
    /// Aligned whitespace; `columns` are the column left edges
    Gutter { columns: Vec<f32> },
}

/// A candidate table region on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    pub bbox: Rect,
    pub kind: RegionKind,
    /// Lines claimed by the region, top to bottom
    pub lines: Vec<usize>,
}

/// Output of the geometry clusterer for one page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterTree {
    pub words: Vec<Word>,
    pub lines: Vec<Line>,
    pub paragraphs: Vec<ParagraphCluster>,
    pub regions: Vec<TableRegion>,
}

impl ClusterTree {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.regions.is_empty()
    }

    /// Paragraph text with lines joined by a space.
    pub fn paragraph_text(&self, index: usize) -> String {
        self.paragraphs
            .get(index)
            .map(|p| {
                p.lines
                    .iter()
                    .map(|&l| self.lines[l].text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    /// Glyph indices of a line, left to right.
    pub fn line_glyphs(&self, line: usize) -> Vec<usize> {
        self.lines[line]
            .words
            .iter()
            .flat_map(|&w| self.words[w].glyphs.iter().copied())
            .collect()
    }

    /// Check that every glyph sits in exactly one word, every word in exactly
    /// one line and every line in exactly one paragraph or region.
    pub fn has_exclusive_membership(&self, glyph_count_hint: usize) -> bool {
        let mut glyph_seen = vec![0u8; glyph_count_hint];
        for word in &self.words {
            for &g in &word.glyphs {
                match glyph_seen.get_mut(g) {
                    Some(slot) => *slot += 1,
                    None => return false,
                }
            }
        }
        let mut word_seen = vec![0u8; self.words.len()];
        for line in &self.lines {
            for &w in &line.words {
                word_seen[w] += 1;
            }
        }
        let mut line_seen = vec![0u8; self.lines.len()];
        for p in &self.paragraphs {
            for &l in &p.lines {
                line_seen[l] += 1;
            }
        }
        for r in &self.regions {
            for &l in &r.lines {
                line_seen[l] += 1;
            }
        }
        let claimed_glyphs = self.words.iter().flat_map(|w| w.glyphs.iter()).count();
        glyph_seen.iter().filter(|&&c| c > 0).count() == claimed_glyphs
            && glyph_seen.iter().all(|&c| c <= 1)
            && word_seen.iter().all(|&c| c == 1)
            && line_seen.iter().all(|&c| c == 1)
    }
}
