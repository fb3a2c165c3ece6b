//! Flow document types.

use super::{FidelityEntry, ImageData, Paragraph, Rect, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an image is anchored in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Inline, at the position matching its top edge in reading order
    #[default]
    InlineAtPosition,
}

/// Placement metadata of an image node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub mode: PlacementMode,
    /// Displayed width in points
    pub width: f32,
    /// Displayed height in points
    pub height: f32,
    /// Offset of the left edge from the page's left edge, in points
    pub x: f32,
    /// Offset of the top edge from the page's top edge, in points
    pub y: f32,
}

impl Placement {
    pub fn inline_at(bbox: Rect) -> Self {
        Self {
            mode: PlacementMode::InlineAtPosition,
            width: bbox.width(),
            height: bbox.height(),
            x: bbox.x0,
            y: bbox.y0,
        }
    }
}

/// An image in the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    /// Source XObject name
    pub name: String,
    pub data: ImageData,
    pub placement: Placement,
}

/// One node of the flow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentNode {
    Paragraph(Paragraph),
    Table(Table),
    Image(ImageNode),
}

impl DocumentNode {
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentNode::Paragraph(_) => "paragraph",
            DocumentNode::Table(_) => "table",
            DocumentNode::Image(_) => "image",
        }
    }

    /// Plain text of the node; empty for images.
    pub fn plain_text(&self) -> String {
        match self {
            DocumentNode::Paragraph(p) => p.plain_text(),
            DocumentNode::Table(t) => t.plain_text(),
            DocumentNode::Image(_) => String::new(),
        }
    }
}

/// Where a node came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeOrigin {
    pub page: u32,
    pub bbox: Rect,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the source
    pub page_count: u32,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}

/// The ordered, structured result of one conversion job.
///
/// Built once by the flow builder and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowDocument {
    pub metadata: Metadata,

    /// Nodes in final reading order
    pub nodes: Vec<DocumentNode>,

    /// Origin of each node, parallel to `nodes`
    pub origins: Vec<NodeOrigin>,

    /// Fidelity losses found before serialization
    pub notes: Vec<FidelityEntry>,
}

impl FlowDocument {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that originate from the given page.
    pub fn nodes_on_page(&self, page: u32) -> impl Iterator<Item = &DocumentNode> {
        self.nodes
            .iter()
            .zip(&self.origins)
            .filter(move |(_, o)| o.page == page)
            .map(|(n, _)| n)
    }

    pub fn paragraph_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, DocumentNode::Paragraph(_)))
            .count()
    }

    pub fn table_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, DocumentNode::Table(_)))
            .count()
    }

    pub fn image_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, DocumentNode::Image(_)))
            .count()
    }

    /// Plain text of the whole document, one node per block.
    pub fn plain_text(&self) -> String {
        self.nodes
            .iter()
            .map(DocumentNode::plain_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
