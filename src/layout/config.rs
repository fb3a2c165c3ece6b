//! Layout thresholds.
//!
//! All geometric thresholds used by the clusterer, the table finders and the
//! flow builder. Factors are relative to the font size unless noted.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which table finders run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableDetectionMode {
    /// Ruling-line networks only
    RulesOnly,
    /// Whitespace gutters only
    Heuristic,
    /// Rulings first, then gutters over the remaining lines
    #[default]
    Both,
}

impl TableDetectionMode {
    pub fn uses_rulings(self) -> bool {
        matches!(self, TableDetectionMode::RulesOnly | TableDetectionMode::Both)
    }

    pub fn uses_gutters(self) -> bool {
        matches!(self, TableDetectionMode::Heuristic | TableDetectionMode::Both)
    }
}

impl FromStr for TableDetectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules-only" | "rules" | "lattice" => Ok(TableDetectionMode::RulesOnly),
            "heuristic" | "stream" => Ok(TableDetectionMode::Heuristic),
            "both" => Ok(TableDetectionMode::Both),
            other => Err(Error::InvalidArgument(format!(
                "unknown table detection mode '{}' (expected rules-only, heuristic or both)",
                other
            ))),
        }
    }
}

/// Gutter (whitespace-aligned) table detector configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping lines into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
    /// Width of the buckets left edges are grouped into (points)
    pub bucket_size: f32,
    /// Mean characters per cell above which the region reads as prose
    pub max_cell_chars: f32,
    /// Mean words per cell at which a column may be running text
    pub prose_min_words: f32,
    /// Mean over widest line width at which a column reads as running text
    pub prose_min_fill: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            bucket_size: 5.0,
            max_cell_chars: 30.0,
            prose_min_words: 3.0,
            prose_min_fill: 0.6,
        }
    }
}

/// Thresholds for clustering, table detection and reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Word break when the gap exceeds this × average glyph width
    pub word_gap_factor: f32,
    /// Minimum vertical overlap (fraction of the smaller height) within a word
    pub min_vertical_overlap: f32,
    /// Same line when baselines differ by less than this × font size
    pub baseline_epsilon_factor: f32,
    /// Split a line when words are further apart than this × font size
    pub line_split_gap_factor: f32,
    /// Break a paragraph when spacing exceeds this × established line height
    pub paragraph_spacing_factor: f32,
    /// Line height assumed for a one-line paragraph, × font size
    pub default_line_height_factor: f32,
    /// Break a paragraph when the left margin shifts by more than this many em
    pub margin_shift_em: f32,
    /// Largest first-line indent accepted without a break, in em
    pub first_line_indent_max_em: f32,
    /// Break a paragraph when the font size changes by more than this (points)
    pub font_size_break_delta: f32,
    /// Glyph rotation (degrees) above which layout is low-confidence
    pub rotation_tolerance: f32,
    /// Ruling endpoints closer than this (points) are joined
    pub ruling_snap_tolerance: f32,
    /// Filled rectangles thinner than this (points) are rulings
    pub ruling_max_thickness: f32,
    /// Rulings shorter than this (points) are ignored
    pub ruling_min_length: f32,
    /// Share of a cell edge a ruling must cover to count as present
    pub boundary_coverage: f32,
    /// Underline must sit within this × font size below the baseline
    pub underline_max_offset: f32,
    /// Share of the run width an underline must cover
    pub underline_min_coverage: f32,
    /// Minimum whitespace between page columns (points)
    pub min_column_gap: f32,
    /// A paragraph is a heading candidate when its size exceeds the body
    /// size by at least this many points
    pub heading_size_delta: f32,
    /// Paragraphs longer than this never become headings
    pub max_heading_chars: usize,
    /// Gutter table detector thresholds
    pub gutter: TableDetectorConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            word_gap_factor: 0.3,
            min_vertical_overlap: 0.5,
            baseline_epsilon_factor: 0.3,
            line_split_gap_factor: 2.0,
            paragraph_spacing_factor: 1.5,
            default_line_height_factor: 1.2,
            margin_shift_em: 0.5,
            first_line_indent_max_em: 4.0,
            font_size_break_delta: 1.0,
            rotation_tolerance: 5.0,
            ruling_snap_tolerance: 3.0,
            ruling_max_thickness: 2.0,
            ruling_min_length: 5.0,
            boundary_coverage: 0.5,
            underline_max_offset: 0.35,
            underline_min_coverage: 0.8,
            min_column_gap: 20.0,
            heading_size_delta: 1.5,
            max_heading_chars: 200,
            gutter: TableDetectorConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Load thresholds from a JSON file; missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&data)
            .map_err(|e| Error::InvalidArgument(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: LayoutConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would make clustering degenerate.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("word_gap_factor", self.word_gap_factor),
            ("baseline_epsilon_factor", self.baseline_epsilon_factor),
            ("line_split_gap_factor", self.line_split_gap_factor),
            ("paragraph_spacing_factor", self.paragraph_spacing_factor),
            ("default_line_height_factor", self.default_line_height_factor),
            ("ruling_snap_tolerance", self.ruling_snap_tolerance),
            ("min_column_gap", self.min_column_gap),
            ("gutter.bucket_size", self.gutter.bucket_size),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(Error::InvalidArgument(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("min_vertical_overlap", self.min_vertical_overlap),
            ("boundary_coverage", self.boundary_coverage),
            ("underline_min_coverage", self.underline_min_coverage),
            ("gutter.min_alignment_ratio", self.gutter.min_alignment_ratio),
            ("gutter.prose_min_fill", self.gutter.prose_min_fill),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidArgument(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.gutter.min_columns < 2 || self.gutter.max_columns < self.gutter.min_columns {
            return Err(Error::InvalidArgument(
                "gutter column limits are inconsistent".to_string(),
            ));
        }
        Ok(())
    }
}
