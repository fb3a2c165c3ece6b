//! Fidelity-loss bookkeeping.
//!
//! Every decision that cannot reproduce the source exactly is recorded as a
//! note, never raised as an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an element could not be represented exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FidelityReason {
    /// A source font was mapped to a different installed family
    FontSubstitution { requested: String, substitute: String },
    /// The font reference did not resolve; the default body style was used
    UnknownFont { resource: String },
    /// Fill color space approximated by component count
    UnsupportedColorSpace { name: String },
    /// A table candidate failed grid checks and became paragraphs
    DemotedTable { detail: String },
    /// A primitive with no flow equivalent was dropped
    UnsupportedPrimitive { kind: String },
    /// Text was clustered from rotated geometry
    LowConfidenceLayout { rotation: f32 },
    /// An image could not be embedded
    ImageDropped { detail: String },
    /// An image was resampled to fit the quality limit
    ImageDownscaled { from: (u32, u32), to: (u32, u32) },
}

impl fmt::Display for FidelityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FidelityReason::FontSubstitution {
                requested,
                substitute,
            } => write!(f, "font '{}' substituted with '{}'", requested, substitute),
            FidelityReason::UnknownFont { resource } => {
                write!(f, "unknown font '{}', default body style used", resource)
            }
            FidelityReason::UnsupportedColorSpace { name } => {
                write!(f, "color space '{}' approximated", name)
            }
            FidelityReason::DemotedTable { detail } => {
                write!(f, "table demoted to paragraphs: {}", detail)
            }
            FidelityReason::UnsupportedPrimitive { kind } => {
                write!(f, "unsupported {} dropped", kind)
            }
            FidelityReason::LowConfidenceLayout { rotation } => {
                write!(f, "rotated text ({:.1}°) laid out with low confidence", rotation)
            }
            FidelityReason::ImageDropped { detail } => write!(f, "image dropped: {}", detail),
            FidelityReason::ImageDownscaled { from, to } => write!(
                f,
                "image downscaled from {}x{} to {}x{}",
                from.0, from.1, to.0, to.1
            ),
        }
    }
}

/// A note raised before node indices exist, tagged with its page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityNote {
    pub page: u32,
    pub reason: FidelityReason,
}

impl FidelityNote {
    pub fn new(page: u32, reason: FidelityReason) -> Self {
        Self { page, reason }
    }
}

/// One report entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidelityEntry {
    /// Index of the affected node in the flow document; `None` for content
    /// that produced no node (dropped primitives, demoted empty regions)
    pub node: Option<usize>,
    pub page: u32,
    pub reason: FidelityReason,
}

/// Ordered list of fidelity losses for one conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FidelityReport {
    pub entries: Vec<FidelityEntry>,
}

impl FidelityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Option<usize>, page: u32, reason: FidelityReason) {
        self.entries.push(FidelityEntry { node, page, reason });
    }

    /// Order by node index; node-less entries go last, by page.
    pub fn sort(&mut self) {
        self.entries
            .sort_by_key(|e| (e.node.unwrap_or(usize::MAX), e.page));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries attached to a given node.
    pub fn for_node(&self, node: usize) -> impl Iterator<Item = &FidelityEntry> {
        self.entries.iter().filter(move |e| e.node == Some(node))
    }
}
