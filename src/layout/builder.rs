//! Flow document assembly.
//!
//! The single join point after per-page structuring: decides reading order
//! (including multi-column pages), assigns heading levels from document-wide
//! font statistics, sets paragraph alignment and turns block notes into
//! report entries keyed by node index.

use std::collections::HashMap;

use crate::model::{
    DocumentNode, FidelityEntry, FlowDocument, Metadata, NodeOrigin, Paragraph, Rect,
};

use super::config::LayoutConfig;
use super::pipeline::{PageBlock, PageLayout};
use super::style::paragraph_alignment;

/// Blocks closer than this to a column boundary are not crossing it.
const EDGE_SLACK: f32 = 1.0;

/// Font statistics for heading detection.
#[derive(Debug, Clone, Default)]
pub struct FontStatistics {
    /// Body text font size (most common)
    pub body_size: f32,
    /// Font sizes larger than body (potential headings), largest first
    pub heading_sizes: Vec<f32>,
    /// Observed font sizes (tenths of a point) weighted by character count
    pub size_histogram: HashMap<i32, usize>,
}

impl FontStatistics {
    /// Add `weight` characters set at `size`.
    pub fn add_size(&mut self, size: f32, weight: usize) {
        if weight == 0 {
            return;
        }
        let key = (size * 10.0).round() as i32;
        *self.size_histogram.entry(key).or_insert(0) += weight;
    }

    /// Calculate body size and heading sizes.
    pub fn analyze(&mut self) {
        // Ties go to the smaller size so the result does not depend on
        // hash order.
        let Some((&body_key, _)) = self
            .size_histogram
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        else {
            self.body_size = 12.0;
            self.heading_sizes.clear();
            return;
        };
        self.body_size = body_key as f32 / 10.0;

        let mut larger: Vec<f32> = self
            .size_histogram
            .keys()
            .map(|&k| k as f32 / 10.0)
            .filter(|&s| s > self.body_size + 0.5)
            .collect();
        larger.sort_by(|a, b| b.total_cmp(a));
        self.heading_sizes = larger;
    }

    /// Heading level for a font size (1-6), or 0 for body text.
    pub fn get_heading_level(&self, font_size: f32, min_delta: f32) -> u8 {
        if font_size < self.body_size + min_delta {
            return 0;
        }
        for (i, &heading_size) in self.heading_sizes.iter().enumerate() {
            if font_size >= heading_size - 0.5 {
                return (i + 1).min(6) as u8;
            }
        }
        5
    }
}

/// Assembles per-page layouts into a [`FlowDocument`].
pub struct FlowBuilder<'a> {
    config: &'a LayoutConfig,
    column_detection: bool,
    preserve_images: bool,
}

impl<'a> FlowBuilder<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            column_detection: true,
            preserve_images: true,
        }
    }

    pub fn column_detection(mut self, enabled: bool) -> Self {
        self.column_detection = enabled;
        self
    }

    pub fn preserve_images(mut self, enabled: bool) -> Self {
        self.preserve_images = enabled;
        self
    }

    /// Build the document from pages in page order.
    ///
    /// Deterministic for identical input; every kept block ends up in
    /// exactly one position.
    pub fn build(&self, metadata: Metadata, pages: Vec<PageLayout>) -> FlowDocument {
        let stats = font_statistics(&pages);
        log::debug!(
            "body size {:.1}pt, heading sizes {:?}",
            stats.body_size,
            stats.heading_sizes
        );

        let mut doc = FlowDocument {
            metadata,
            ..Default::default()
        };

        for page in pages {
            let blocks: Vec<PageBlock> = page
                .blocks
                .into_iter()
                .filter(|b| self.preserve_images || !matches!(b.node, DocumentNode::Image(_)))
                .collect();
            let boxes: Vec<Rect> = blocks.iter().map(|b| b.bbox).collect();

            let boundaries = if self.column_detection {
                column_boundaries(&boxes, self.config.min_column_gap)
            } else {
                Vec::new()
            };
            if !boundaries.is_empty() {
                log::debug!("page {}: column boundaries at {:?}", page.number, boundaries);
            }
            let order = reading_order(&boxes, &boundaries);
            let areas = text_areas(&boxes, &boundaries);

            let mut slots: Vec<Option<PageBlock>> = blocks.into_iter().map(Some).collect();
            for i in order {
                let Some(block) = slots[i].take() else {
                    continue;
                };
                let PageBlock {
                    mut node,
                    bbox,
                    line_boxes,
                    notes,
                } = block;

                if let DocumentNode::Paragraph(paragraph) = &mut node {
                    self.finish_paragraph(paragraph, &stats, &line_boxes, areas[i]);
                }

                let index = doc.nodes.len();
                doc.nodes.push(node);
                doc.origins.push(NodeOrigin {
                    page: page.number,
                    bbox,
                });
                doc.notes.extend(notes.into_iter().map(|reason| FidelityEntry {
                    node: Some(index),
                    page: page.number,
                    reason,
                }));
            }

            doc.notes.extend(page.notes.into_iter().map(|reason| FidelityEntry {
                node: None,
                page: page.number,
                reason,
            }));
        }

        doc
    }

    fn finish_paragraph(
        &self,
        paragraph: &mut Paragraph,
        stats: &FontStatistics,
        line_boxes: &[Rect],
        area: Rect,
    ) {
        let size = paragraph.dominant_size_pt();
        let level = stats.get_heading_level(size, self.config.heading_size_delta);
        if level > 0
            && !paragraph.style.list_item
            && paragraph.plain_text().chars().count() <= self.config.max_heading_chars
        {
            paragraph.style.heading_level = Some(level);
        }

        let alignment = paragraph_alignment(line_boxes, area, size);
        for run in &mut paragraph.runs {
            run.style.alignment = alignment;
        }
    }
}

fn font_statistics(pages: &[PageLayout]) -> FontStatistics {
    let mut stats = FontStatistics::default();
    for block in pages.iter().flat_map(|p| &p.blocks) {
        if let DocumentNode::Paragraph(paragraph) = &block.node {
            for run in &paragraph.runs {
                let chars = run.text.chars().filter(|c| !c.is_whitespace()).count();
                stats.add_size(run.style.size_pt(), chars);
            }
        }
    }
    stats.analyze();
    stats
}

fn crosses(bbox: &Rect, boundary: f32) -> bool {
    bbox.x0 < boundary - EDGE_SLACK && bbox.x1 > boundary + EDGE_SLACK
}

/// Column index of a block, or `None` when it spans a boundary.
fn column_of(bbox: &Rect, boundaries: &[f32]) -> Option<usize> {
    if boundaries.iter().any(|&b| crosses(bbox, b)) {
        return None;
    }
    Some(
        boundaries
            .iter()
            .filter(|&&b| bbox.x0 >= b - EDGE_SLACK)
            .count(),
    )
}

/// Left edges of the page columns after the first.
///
/// Left edges are clustered by gaps of at least `min_gap`. A cluster start
/// is a column boundary when blocks on both sides of it stand side by side
/// without crossing it; blocks that do cross it are spanning blocks.
pub fn column_boundaries(boxes: &[Rect], min_gap: f32) -> Vec<f32> {
    let mut lefts: Vec<f32> = boxes.iter().map(|b| b.x0).collect();
    lefts.sort_by(f32::total_cmp);

    lefts
        .windows(2)
        .filter(|pair| pair[1] - pair[0] >= min_gap)
        .map(|pair| pair[1])
        .filter(|&boundary| {
            let left: Vec<&Rect> = boxes
                .iter()
                .filter(|b| b.x0 < boundary - EDGE_SLACK && !crosses(b, boundary))
                .collect();
            let right: Vec<&Rect> = boxes
                .iter()
                .filter(|b| b.x0 >= boundary - EDGE_SLACK)
                .collect();
            left.iter()
                .any(|l| right.iter().any(|r| l.vertical_overlap(r) > 0.0))
        })
        .collect()
}

fn by_position(boxes: &[Rect], a: usize, b: usize) -> std::cmp::Ordering {
    boxes[a]
        .y0
        .total_cmp(&boxes[b].y0)
        .then(boxes[a].x0.total_cmp(&boxes[b].x0))
        .then(a.cmp(&b))
}

/// Reading order of the blocks of one page.
///
/// Without boundaries the order is top-to-bottom. With boundaries, spanning
/// blocks split the page into bands; each band emits its columns left to
/// right, each column top to bottom.
pub fn reading_order(boxes: &[Rect], boundaries: &[f32]) -> Vec<usize> {
    let mut by_top: Vec<usize> = (0..boxes.len()).collect();
    by_top.sort_by(|&a, &b| by_position(boxes, a, b));
    if boundaries.is_empty() {
        return by_top;
    }

    let mut order = Vec::with_capacity(boxes.len());
    let mut band = Vec::new();
    for i in by_top {
        if column_of(&boxes[i], boundaries).is_some() {
            band.push(i);
        } else {
            flush_band(&mut band, boxes, boundaries, &mut order);
            order.push(i);
        }
    }
    flush_band(&mut band, boxes, boundaries, &mut order);
    order
}

fn flush_band(band: &mut Vec<usize>, boxes: &[Rect], boundaries: &[f32], order: &mut Vec<usize>) {
    let column = |i: usize| column_of(&boxes[i], boundaries).unwrap_or(0);
    let side_by_side = band.iter().any(|&a| {
        band.iter()
            .any(|&b| column(a) != column(b) && boxes[a].vertical_overlap(&boxes[b]) > 0.0)
    });
    if side_by_side {
        band.sort_by(|&a, &b| column(a).cmp(&column(b)).then(by_position(boxes, a, b)));
    }
    order.append(band);
}

/// The text area each block is aligned against: its column, or the whole
/// text block of the page for spanning blocks and single-column pages.
fn text_areas(boxes: &[Rect], boundaries: &[f32]) -> Vec<Rect> {
    let Some(page_area) = boxes.iter().copied().reduce(|a, b| a.union(&b)) else {
        return Vec::new();
    };
    let mut columns: HashMap<usize, Rect> = HashMap::new();
    for bbox in boxes {
        if let Some(c) = column_of(bbox, boundaries) {
            columns
                .entry(c)
                .and_modify(|area| *area = area.union(bbox))
                .or_insert(*bbox);
        }
    }
    boxes
        .iter()
        .map(|bbox| {
            column_of(bbox, boundaries)
                .and_then(|c| columns.get(&c).copied())
                .unwrap_or(page_area)
        })
        .collect()
}
