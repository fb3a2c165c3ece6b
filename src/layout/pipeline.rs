//! Per-page structuring.
//!
//! Each page runs through the clusterer, the table extractor and the style
//! resolver on its own; the result is an unordered set of blocks that the
//! flow builder later puts into reading order. Pages share nothing, so they
//! are processed on the rayon pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::model::{
    ClusterTree, DocumentNode, FidelityReason, ImageNode, Page, Paragraph, ParagraphCluster,
    ParagraphStyle, Placement, Primitive, Rect, StyleRecord, Table,
};

use super::clusterer::GeometryClusterer;
use super::config::{LayoutConfig, TableDetectionMode};
use super::style::StyleResolver;
use super::table_extractor::{ExtractedTable, TableExtractor};
use super::text::{needs_space, normalize_text};

/// Cooperative cancellation flag shared between a job and its caller.
///
/// Checked at page boundaries only; a page in progress always completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every job holding a clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A structured element of one page, not yet in reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBlock {
    pub node: DocumentNode,
    pub bbox: Rect,
    /// Line boxes of a paragraph block; empty for tables and images
    pub line_boxes: Vec<Rect>,
    /// Fidelity losses attached to this block
    pub notes: Vec<FidelityReason>,
}

/// Everything the flow builder needs from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<PageBlock>,
    /// Losses that produced no block (dropped primitives, empty demotions)
    pub notes: Vec<FidelityReason>,
}

impl PageLayout {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Runs the per-page stages for one page at a time.
pub struct PageStructurer<'a> {
    config: &'a LayoutConfig,
    mode: TableDetectionMode,
}

impl<'a> PageStructurer<'a> {
    pub fn new(config: &'a LayoutConfig, mode: TableDetectionMode) -> Self {
        Self { config, mode }
    }

    /// Structure one page.
    ///
    /// Table regions that fail extraction are clustered as ordinary
    /// paragraphs and carry a `DemotedTable` note.
    pub fn structure(&self, page: &Page) -> PageLayout {
        let clusterer = GeometryClusterer::new(self.config);
        let extractor = TableExtractor::new(self.config);
        let tree = clusterer.cluster(page, self.mode);

        let mut layout = PageLayout {
            number: page.number,
            width: page.width,
            height: page.height,
            blocks: Vec::new(),
            notes: Vec::new(),
        };

        let mut tables = Vec::new();
        let mut demoted: Vec<(ParagraphCluster, String)> = Vec::new();
        for region in &tree.regions {
            match extractor.extract(region, &tree) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    let detail = match e {
                        Error::TableInconsistency(detail) => detail,
                        other => other.to_string(),
                    };
                    log::debug!(
                        "page {}: table at {:?} demoted: {}",
                        page.number,
                        region.bbox,
                        detail
                    );
                    let paragraphs = clusterer.group_paragraphs(&tree.lines, &region.lines);
                    if paragraphs.is_empty() {
                        layout.notes.push(FidelityReason::DemotedTable { detail });
                        continue;
                    }
                    demoted.extend(paragraphs.into_iter().map(|p| (p, detail.clone())));
                }
            }
        }

        let ruled_areas: Vec<Rect> = tables.iter().filter(|t| t.ruled).map(|t| t.bbox).collect();
        let resolver = StyleResolver::for_page(page, self.config, &ruled_areas);

        for cluster in &tree.paragraphs {
            if let Some(block) = paragraph_block(page, &tree, &resolver, cluster) {
                layout.blocks.push(block);
            }
        }
        for (cluster, detail) in &demoted {
            if let Some(mut block) = paragraph_block(page, &tree, &resolver, cluster) {
                block.notes.insert(
                    0,
                    FidelityReason::DemotedTable {
                        detail: detail.clone(),
                    },
                );
                layout.blocks.push(block);
            }
        }
        for table in tables {
            layout.blocks.push(table_block(page, &tree, &resolver, table));
        }

        for primitive in &page.primitives {
            match primitive {
                Primitive::Image(image) => layout.blocks.push(PageBlock {
                    node: DocumentNode::Image(ImageNode {
                        name: image.name.clone(),
                        data: image.data.clone(),
                        placement: Placement::inline_at(image.bbox),
                    }),
                    bbox: image.bbox,
                    line_boxes: Vec::new(),
                    notes: Vec::new(),
                }),
                Primitive::Unsupported { kind, .. } => {
                    log::debug!("page {}: dropping unsupported {}", page.number, kind);
                    layout
                        .notes
                        .push(FidelityReason::UnsupportedPrimitive { kind: kind.clone() });
                }
                Primitive::Glyph(_) | Primitive::Path(_) => {}
            }
        }

        layout
    }
}

/// Structure every page, in parallel unless `parallel` is false.
///
/// The token is checked before each page and once after all pages are
/// done. Results keep page order.
pub fn structure_pages(
    pages: &[Page],
    config: &LayoutConfig,
    mode: TableDetectionMode,
    parallel: bool,
    cancel: &CancellationToken,
) -> Result<Vec<PageLayout>> {
    let structurer = PageStructurer::new(config, mode);
    let run = |page: &Page| -> Result<PageLayout> {
        cancel.check()?;
        Ok(structurer.structure(page))
    };

    let layouts = if parallel {
        pages.par_iter().map(run).collect::<Result<Vec<_>>>()?
    } else {
        pages.iter().map(run).collect::<Result<Vec<_>>>()?
    };
    cancel.check()?;
    Ok(layouts)
}

fn paragraph_block(
    page: &Page,
    tree: &ClusterTree,
    resolver: &StyleResolver<'_>,
    cluster: &ParagraphCluster,
) -> Option<PageBlock> {
    let mut notes = Vec::new();
    let words = cluster
        .lines
        .iter()
        .flat_map(|&l| tree.lines[l].words.iter().copied());
    let mut paragraph = styled_text(page, tree, resolver, words, &mut notes);
    if paragraph.is_empty() {
        return None;
    }
    paragraph.style = ParagraphStyle {
        heading_level: None,
        list_item: cluster.list_item,
        first_line_indent: cluster.first_line_indent,
        low_confidence: cluster.low_confidence,
    };

    if cluster.low_confidence {
        let rotation = cluster
            .lines
            .iter()
            .flat_map(|&l| tree.line_glyphs(l))
            .filter_map(|g| page.primitives.get(g).and_then(Primitive::as_glyph))
            .map(|run| run.rotation.abs())
            .fold(0.0f32, f32::max);
        notes.push(FidelityReason::LowConfidenceLayout { rotation });
    }

    Some(PageBlock {
        node: DocumentNode::Paragraph(paragraph),
        bbox: cluster.bbox,
        line_boxes: cluster.lines.iter().map(|&l| tree.lines[l].bbox).collect(),
        notes,
    })
}

fn table_block(
    page: &Page,
    tree: &ClusterTree,
    resolver: &StyleResolver<'_>,
    table: ExtractedTable,
) -> PageBlock {
    let mut notes = Vec::new();
    let cell_content = table
        .grid
        .cells
        .iter()
        .map(|cell| {
            let p = styled_text(page, tree, resolver, cell.words.iter().copied(), &mut notes);
            if p.is_empty() {
                Vec::new()
            } else {
                vec![p]
            }
        })
        .collect();

    PageBlock {
        node: DocumentNode::Table(Table {
            grid: table.grid,
            cell_content,
            ruled: table.ruled,
        }),
        bbox: table.bbox,
        line_boxes: Vec::new(),
        notes,
    }
}

/// Styled runs for a sequence of words.
///
/// Each glyph run gets its own resolved style; equal neighbours merge. Word
/// spaces take the style of the text before them. Each distinct fidelity
/// reason is recorded once.
fn styled_text(
    page: &Page,
    tree: &ClusterTree,
    resolver: &StyleResolver<'_>,
    words: impl IntoIterator<Item = usize>,
    notes: &mut Vec<FidelityReason>,
) -> Paragraph {
    let mut paragraph = Paragraph::new();
    let mut last: Option<(char, StyleRecord)> = None;

    for w in words {
        let mut word_start = true;
        for &g in &tree.words[w].glyphs {
            let Some(run) = page.primitives.get(g).and_then(Primitive::as_glyph) else {
                continue;
            };
            let text = normalize_text(&run.text);
            let text = text.trim();
            let Some(first) = text.chars().next() else {
                continue;
            };

            let (style, reasons) = resolver.resolve(run);
            for reason in reasons {
                if !notes.contains(&reason) {
                    notes.push(reason);
                }
            }

            if word_start {
                if let Some((prev, prev_style)) = &last {
                    if needs_space(Some(*prev), Some(first)) {
                        paragraph.push_run(" ", prev_style.clone());
                    }
                }
                word_start = false;
            }
            paragraph.push_run(text, style.clone());
            if let Some(c) = text.chars().last() {
                last = Some((c, style));
            }
        }
    }
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::{glyph, glyph_with_font, page, rotated, rule, ruled_box};
    use crate::model::{FontRef, StyleRecord};

    fn structure(prims: Vec<Primitive>, mode: TableDetectionMode) -> PageLayout {
        let config = LayoutConfig::default();
        PageStructurer::new(&config, mode).structure(&page(prims))
    }

    fn texts(layout: &PageLayout) -> Vec<String> {
        layout.blocks.iter().map(|b| b.node.plain_text()).collect()
    }

    #[test]
    fn test_empty_page_has_no_blocks() {
        let layout = structure(Vec::new(), TableDetectionMode::Both);
        assert!(layout.is_empty());
        assert!(layout.notes.is_empty());
    }

    #[test]
    fn test_paragraph_text_and_spacing() {
        let layout = structure(
            vec![
                glyph("Hello", 72.0, 100.0, 12.0),
                glyph("World", 107.0, 100.0, 12.0),
                glyph("New paragraph", 72.0, 140.0, 12.0),
            ],
            TableDetectionMode::Both,
        );
        assert_eq!(texts(&layout), vec!["Hello World", "New paragraph"]);
    }

    #[test]
    fn test_style_changes_split_runs() {
        let layout = structure(
            vec![
                glyph("Plain", 72.0, 100.0, 12.0),
                glyph_with_font("Bold", 110.0, 100.0, 12.0, "Helvetica-Bold"),
            ],
            TableDetectionMode::Both,
        );
        let DocumentNode::Paragraph(p) = &layout.blocks[0].node else {
            panic!("expected a paragraph");
        };
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "Plain ");
        assert!(!p.runs[0].style.bold);
        assert_eq!(p.runs[1].text, "Bold");
        assert!(p.runs[1].style.bold);
        assert_eq!(p.runs[1].style.font_family, "Arial");
    }

    #[test]
    fn test_unknown_font_uses_default_style() {
        let mut prim = glyph("Mystery", 72.0, 100.0, 12.0);
        if let Primitive::Glyph(g) = &mut prim {
            g.font = FontRef::unresolved("F9");
        }
        let layout = structure(vec![prim], TableDetectionMode::Both);
        let block = &layout.blocks[0];
        let DocumentNode::Paragraph(p) = &block.node else {
            panic!("expected a paragraph");
        };
        assert_eq!(p.runs[0].style, StyleRecord::default_body());
        assert_eq!(
            block.notes,
            vec![FidelityReason::UnknownFont {
                resource: "F9".into()
            }]
        );
    }

    #[test]
    fn test_font_substitution_noted_once() {
        let layout = structure(
            vec![
                glyph("one", 72.0, 100.0, 12.0),
                glyph("two", 100.0, 100.0, 12.0),
            ],
            TableDetectionMode::Both,
        );
        let substitutions = layout.blocks[0]
            .notes
            .iter()
            .filter(|n| matches!(n, FidelityReason::FontSubstitution { .. }))
            .count();
        assert_eq!(substitutions, 1);
    }

    #[test]
    fn test_ruled_table_block() {
        let mut prims = ruled_box(50.0, 100.0, 250.0, 160.0, &[130.0], &[150.0]);
        prims.push(glyph("A1", 55.0, 120.0, 10.0));
        prims.push(glyph("B1", 155.0, 120.0, 10.0));
        prims.push(glyph("A2", 55.0, 150.0, 10.0));
        prims.push(glyph("B2", 155.0, 150.0, 10.0));

        let layout = structure(prims, TableDetectionMode::Both);
        assert_eq!(layout.blocks.len(), 1);
        let DocumentNode::Table(table) = &layout.blocks[0].node else {
            panic!("expected a table");
        };
        assert!(table.ruled);
        assert_eq!(table.plain_text(), "A1\tB1\nA2\tB2");
        // Table rules are not underlines.
        assert!(table.cell_content[0][0].runs.iter().all(|r| !r.style.underline));
    }

    #[test]
    fn test_inconsistent_table_is_demoted() {
        let mut prims = vec![
            rule(50.0, 100.0, 150.0, 100.0),
            rule(50.0, 130.0, 250.0, 130.0),
            rule(50.0, 160.0, 150.0, 160.0),
            rule(50.0, 100.0, 50.0, 160.0),
            rule(150.0, 100.0, 150.0, 160.0),
        ];
        prims.push(glyph("A1", 55.0, 120.0, 10.0));
        prims.push(glyph("A2", 55.0, 150.0, 10.0));

        let layout = structure(prims, TableDetectionMode::RulesOnly);
        assert!(layout
            .blocks
            .iter()
            .all(|b| matches!(b.node, DocumentNode::Paragraph(_))));
        assert!(texts(&layout).join(" ").contains("A1"));
        assert!(layout.blocks.iter().any(|b| b
            .notes
            .iter()
            .any(|n| matches!(n, FidelityReason::DemotedTable { .. }))));
    }

    #[test]
    fn test_unsupported_primitive_noted_on_page() {
        let layout = structure(
            vec![
                glyph("Text", 72.0, 100.0, 12.0),
                Primitive::Unsupported {
                    kind: "shading".into(),
                    bbox: None,
                },
            ],
            TableDetectionMode::Both,
        );
        assert_eq!(layout.blocks.len(), 1);
        assert_eq!(
            layout.notes,
            vec![FidelityReason::UnsupportedPrimitive {
                kind: "shading".into()
            }]
        );
    }

    #[test]
    fn test_rotated_text_is_low_confidence() {
        let layout = structure(
            vec![rotated(glyph("Tilted", 72.0, 100.0, 12.0), 30.0)],
            TableDetectionMode::Both,
        );
        let block = &layout.blocks[0];
        let DocumentNode::Paragraph(p) = &block.node else {
            panic!("expected a paragraph");
        };
        assert!(p.style.low_confidence);
        assert!(block
            .notes
            .contains(&FidelityReason::LowConfidenceLayout { rotation: 30.0 }));
    }

    #[test]
    fn test_cancelled_before_first_page() {
        let config = LayoutConfig::default();
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());

        let pages = vec![page(vec![glyph("x", 72.0, 100.0, 12.0)])];
        let result = structure_pages(&pages, &config, TableDetectionMode::Both, true, &token);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let config = LayoutConfig::default();
        let token = CancellationToken::new();
        let pages: Vec<Page> = (1..=4)
            .map(|n| {
                let mut p = page(vec![
                    glyph("Page", 72.0, 100.0, 12.0),
                    glyph(&n.to_string(), 110.0, 100.0, 12.0),
                ]);
                p.number = n;
                p
            })
            .collect();

        let parallel =
            structure_pages(&pages, &config, TableDetectionMode::Both, true, &token).unwrap();
        let sequential =
            structure_pages(&pages, &config, TableDetectionMode::Both, false, &token).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(
            parallel.iter().map(|l| l.number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }
}
