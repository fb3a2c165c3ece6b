//! Conversion statistics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{DocumentNode, FlowDocument};

/// Counts collected for one converted file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of pages read
    pub page_count: u32,

    /// Number of paragraphs written (headings included)
    pub paragraph_count: u32,

    /// Number of headings among the paragraphs
    pub heading_count: u32,

    /// Number of tables written
    pub table_count: u32,

    /// Number of image nodes in the flow
    pub image_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Size of the written package in bytes
    pub output_bytes: u64,

    /// Wall time of the conversion in milliseconds
    pub elapsed_ms: u64,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the nodes of a flow document.
    pub fn from_document(doc: &FlowDocument, page_count: u32) -> Self {
        let mut stats = Self {
            page_count,
            ..Self::default()
        };
        for node in &doc.nodes {
            match node {
                DocumentNode::Paragraph(p) => {
                    stats.paragraph_count += 1;
                    if p.is_heading() {
                        stats.heading_count += 1;
                    }
                }
                DocumentNode::Table(_) => stats.table_count += 1,
                DocumentNode::Image(_) => stats.image_count += 1,
            }
            stats.word_count += node.plain_text().split_whitespace().count() as u32;
        }
        stats
    }

    pub fn with_output(mut self, bytes: usize, elapsed: Duration) -> Self {
        self.output_bytes = bytes as u64;
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }

    /// Merge statistics from another file.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.page_count += other.page_count;
        self.paragraph_count += other.paragraph_count;
        self.heading_count += other.heading_count;
        self.table_count += other.table_count;
        self.image_count += other.image_count;
        self.word_count += other.word_count;
        self.output_bytes += other.output_bytes;
        self.elapsed_ms += other.elapsed_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, StyleRecord};

    #[test]
    fn test_from_document() {
        let mut doc = FlowDocument::default();
        let mut heading = Paragraph::with_text("Title", StyleRecord::default_body());
        heading.style.heading_level = Some(1);
        doc.nodes.push(DocumentNode::Paragraph(heading));
        doc.nodes.push(DocumentNode::Paragraph(Paragraph::with_text(
            "two words",
            StyleRecord::default_body(),
        )));

        let stats = ConversionStats::from_document(&doc, 3)
            .with_output(2048, Duration::from_millis(15));
        assert_eq!(stats.page_count, 3);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.heading_count, 1);
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.output_bytes, 2048);
        assert_eq!(stats.elapsed_ms, 15);
    }

    #[test]
    fn test_merge() {
        let mut total = ConversionStats::new();
        let one = ConversionStats {
            page_count: 2,
            table_count: 1,
            ..Default::default()
        };
        total.merge(&one);
        total.merge(&one);
        assert_eq!(total.page_count, 4);
        assert_eq!(total.table_count, 2);
    }
}
