//! Paragraph and run types.

use super::{Alignment, StyleRecord};
use serde::{Deserialize, Serialize};

/// A paragraph: an ordered sequence of styled runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text runs in the paragraph
    pub runs: Vec<TextRun>,

    /// Paragraph-level properties
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single run.
    pub fn with_text(text: impl Into<String>, style: StyleRecord) -> Self {
        let mut p = Self::new();
        p.push_run(text, style);
        p
    }

    /// Append text, merging into the previous run when the style is equal.
    pub fn push_run(&mut self, text: impl Into<String>, style: StyleRecord) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.runs.push(TextRun { text, style }),
        }
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() || self.plain_text().trim().is_empty()
    }

    /// Paragraph alignment, shared by all runs.
    pub fn alignment(&self) -> Alignment {
        self.runs
            .first()
            .map(|r| r.style.alignment)
            .unwrap_or_default()
    }

    /// Size of the style covering the most characters.
    pub fn dominant_size_pt(&self) -> f32 {
        let mut best: Option<(usize, f32)> = None;
        for run in &self.runs {
            let n = run.text.chars().filter(|c| !c.is_whitespace()).count();
            if best.map_or(true, |(count, _)| n > count) {
                best = Some((n, run.style.size_pt()));
            }
        }
        best.map(|(_, s)| s).unwrap_or(StyleRecord::DEFAULT_SIZE_PT)
    }

    /// Whether most characters are bold.
    pub fn is_mostly_bold(&self) -> bool {
        let total: usize = self.runs.iter().map(|r| r.text.len()).sum();
        let bold: usize = self
            .runs
            .iter()
            .filter(|r| r.style.bold)
            .map(|r| r.text.len())
            .sum();
        total > 0 && bold * 2 > total
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        self.style.heading_level.is_some()
    }
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Resolved style
    pub style: StyleRecord,
}

/// Paragraph-level properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Heading level (1-6)
    pub heading_level: Option<u8>,

    /// Starts with a bullet or number marker
    pub list_item: bool,

    /// First-line indent in points (negative for hanging indents)
    pub first_line_indent: f32,

    /// Layout inferred from rotated or otherwise uncertain geometry
    pub low_confidence: bool,
}
