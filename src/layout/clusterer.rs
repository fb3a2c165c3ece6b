//! Geometry clustering: glyph runs → words → lines → paragraphs, plus
//! table-region candidates.

use crate::model::{
    ClusterTree, GlyphRun, Line, Page, ParagraphCluster, Rect, RegionKind, TableRegion, Word,
};

use super::config::{LayoutConfig, TableDetectionMode};
use super::gutter::GutterDetector;
use super::rulings::find_ruled_regions;
use super::text::{normalize_text, push_word, starts_with_list_marker};

/// Shrink applied to a ruled region before testing line overlap, so text
/// merely touching the outer rules stays in the flow.
const REGION_EDGE_INSET: f32 = 1.0;

/// Groups a page's primitives into a [`ClusterTree`].
pub struct GeometryClusterer<'a> {
    config: &'a LayoutConfig,
}

/// A word under construction.
struct WordBuilder {
    glyphs: Vec<usize>,
    bbox: Rect,
    baseline: f32,
    font_size: f32,
    text: String,
    last_width: f32,
    /// The last run ended in whitespace
    closed: bool,
    max_rotation: f32,
}

impl WordBuilder {
    fn new(index: usize, run: &GlyphRun) -> Self {
        let text = normalize_text(&run.text);
        Self {
            glyphs: vec![index],
            bbox: run.bbox,
            baseline: run.baseline,
            font_size: run.size,
            closed: text.ends_with(char::is_whitespace),
            text: text.trim().to_string(),
            last_width: run.avg_glyph_width(),
            max_rotation: run.rotation.abs(),
        }
    }

    fn push(&mut self, index: usize, run: &GlyphRun) {
        let text = normalize_text(&run.text);
        self.glyphs.push(index);
        self.bbox = self.bbox.union(&run.bbox);
        self.font_size = self.font_size.max(run.size);
        self.closed = text.ends_with(char::is_whitespace);
        self.text.push_str(text.trim());
        self.last_width = run.avg_glyph_width();
        self.max_rotation = self.max_rotation.max(run.rotation.abs());
    }

    fn finish(self) -> (Word, f32) {
        (
            Word {
                glyphs: self.glyphs,
                bbox: self.bbox,
                baseline: self.baseline,
                font_size: self.font_size,
                text: self.text,
            },
            self.max_rotation,
        )
    }
}

/// A paragraph under construction.
struct OpenParagraph {
    lines: Vec<usize>,
    bbox: Rect,
    first_x0: f32,
    /// Left edge of the lines after the first
    body_x0: Option<f32>,
    last_baseline: f32,
    last_bbox: Rect,
    line_height: Option<f32>,
    font_size: f32,
    list_item: bool,
}

impl<'a> GeometryClusterer<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Cluster one page.
    ///
    /// Ruled regions claim their lines first, then gutter regions claim
    /// from what is left (each only when `mode` enables it); the remaining
    /// lines are grouped into paragraphs.
    pub fn cluster(&self, page: &Page, mode: TableDetectionMode) -> ClusterTree {
        let (words, lines) = self.build_lines(page);
        let mut claimed = vec![false; lines.len()];
        let mut regions = Vec::new();

        if mode.uses_rulings() {
            for candidate in find_ruled_regions(page, self.config) {
                let inner = candidate.bbox.expand(-REGION_EDGE_INSET);
                let members: Vec<usize> = (0..lines.len())
                    .filter(|&l| !claimed[l] && lines[l].bbox.overlap_area(&inner) > 0.0)
                    .collect();
                if members.is_empty() {
                    log::debug!(
                        "page {}: ruled region at {:?} holds no text, ignored",
                        page.number,
                        candidate.bbox
                    );
                    continue;
                }
                for &l in &members {
                    claimed[l] = true;
                }
                regions.push(TableRegion {
                    bbox: candidate.bbox,
                    kind: RegionKind::Ruled(candidate.grid),
                    lines: members,
                });
            }
        }

        if mode.uses_gutters() {
            let free: Vec<usize> = (0..lines.len()).filter(|&l| !claimed[l]).collect();
            for region in GutterDetector::new(&self.config.gutter).detect(&words, &lines, &free) {
                for &l in &region.lines {
                    claimed[l] = true;
                }
                regions.push(TableRegion {
                    bbox: region.bbox,
                    kind: RegionKind::Gutter {
                        columns: region.columns,
                    },
                    lines: region.lines,
                });
            }
        }

        let free: Vec<usize> = (0..lines.len()).filter(|&l| !claimed[l]).collect();
        let paragraphs = self.group_paragraphs(&lines, &free);

        log::debug!(
            "page {}: {} words, {} lines, {} paragraphs, {} table regions",
            page.number,
            words.len(),
            lines.len(),
            paragraphs.len(),
            regions.len()
        );

        ClusterTree {
            words,
            lines,
            paragraphs,
            regions,
        }
    }

    /// Build words and lines from the page's glyph runs.
    ///
    /// Runs are sorted by baseline and banded by `baseline_epsilon_factor`;
    /// each band is read left to right, joining runs into words across
    /// small gaps and splitting lines at gaps wider than
    /// `line_split_gap_factor` em.
    pub fn build_lines(&self, page: &Page) -> (Vec<Word>, Vec<Line>) {
        let mut glyphs: Vec<(usize, &GlyphRun)> = page
            .glyphs()
            .filter(|(_, g)| !g.text.trim().is_empty())
            .collect();
        glyphs.sort_by(|a, b| {
            a.1.baseline
                .total_cmp(&b.1.baseline)
                .then(a.1.bbox.x0.total_cmp(&b.1.bbox.x0))
        });

        let mut words = Vec::new();
        let mut lines = Vec::new();
        for mut band in self.baseline_bands(glyphs) {
            band.sort_by(|a, b| a.1.bbox.x0.total_cmp(&b.1.bbox.x0).then(a.0.cmp(&b.0)));
            let band_words = self.build_words(&band);
            self.split_band(band_words, &mut words, &mut lines);
        }
        (words, lines)
    }

    fn baseline_bands<'p>(&self, glyphs: Vec<(usize, &'p GlyphRun)>) -> Vec<Vec<(usize, &'p GlyphRun)>> {
        let eps = self.config.baseline_epsilon_factor;
        let mut bands: Vec<Vec<(usize, &GlyphRun)>> = Vec::new();
        for g in glyphs {
            match bands.last_mut() {
                Some(band)
                    if (g.1.baseline - band[0].1.baseline).abs()
                        <= eps * g.1.size.max(band[0].1.size) =>
                {
                    band.push(g)
                }
                _ => bands.push(vec![g]),
            }
        }
        bands
    }

    fn build_words(&self, band: &[(usize, &GlyphRun)]) -> Vec<(Word, f32)> {
        let mut words = Vec::new();
        let mut current: Option<WordBuilder> = None;

        for &(index, run) in band {
            if let Some(word) = current.as_mut() {
                if self.joins_word(word, run) {
                    word.push(index, run);
                    continue;
                }
            }
            if let Some(word) = current.take() {
                words.push(word.finish());
            }
            current = Some(WordBuilder::new(index, run));
        }
        words.extend(current.map(WordBuilder::finish));
        words
    }

    fn joins_word(&self, word: &WordBuilder, run: &GlyphRun) -> bool {
        if word.closed || run.text.starts_with(char::is_whitespace) {
            return false;
        }
        let avg_width = (word.last_width + run.avg_glyph_width()) / 2.0;
        let gap = run.bbox.x0 - word.bbox.x1;
        let min_height = word.bbox.height().min(run.bbox.height());
        let overlap = if min_height > 0.0 {
            word.bbox.vertical_overlap(&run.bbox) / min_height
        } else {
            1.0
        };
        gap < self.config.word_gap_factor * avg_width && overlap >= self.config.min_vertical_overlap
    }

    fn split_band(&self, band_words: Vec<(Word, f32)>, words: &mut Vec<Word>, lines: &mut Vec<Line>) {
        let mut current: Vec<(usize, f32)> = Vec::new();
        for (word, rotation) in band_words {
            if let Some(&(last, _)) = current.last() {
                let prev: &Word = &words[last];
                let gap = word.bbox.x0 - prev.bbox.x1;
                let limit = self.config.line_split_gap_factor * prev.font_size.max(word.font_size);
                if gap >= limit {
                    lines.push(self.make_line(words, &current));
                    current.clear();
                }
            }
            words.push(word);
            current.push((words.len() - 1, rotation));
        }
        if !current.is_empty() {
            lines.push(self.make_line(words, &current));
        }
    }

    fn make_line(&self, words: &[Word], members: &[(usize, f32)]) -> Line {
        let mut text = String::new();
        let mut bbox = words[members[0].0].bbox;
        let mut sizes: Vec<(f32, usize)> = Vec::new();
        for &(w, _) in members {
            let word = &words[w];
            push_word(&mut text, &word.text);
            bbox = bbox.union(&word.bbox);
            let chars = word.text.chars().count();
            match sizes.iter_mut().find(|(s, _)| (*s - word.font_size).abs() < 0.05) {
                Some(entry) => entry.1 += chars,
                None => sizes.push((word.font_size, chars)),
            }
        }
        let font_size = sizes
            .iter()
            .max_by_key(|(_, n)| *n)
            .map(|(s, _)| *s)
            .unwrap_or(words[members[0].0].font_size);

        Line {
            words: members.iter().map(|&(w, _)| w).collect(),
            bbox,
            baseline: words[members[0].0].baseline,
            font_size,
            text,
            rotated: members
                .iter()
                .any(|&(_, r)| r > self.config.rotation_tolerance),
        }
    }

    /// Group lines into paragraphs.
    ///
    /// Each line joins the nearest open paragraph above it that it overlaps
    /// horizontally, provided spacing, font size and margin stay consistent;
    /// otherwise it opens a new paragraph.
    pub fn group_paragraphs(&self, lines: &[Line], members: &[usize]) -> Vec<ParagraphCluster> {
        let mut order: Vec<usize> = members.to_vec();
        order.sort_by(|&a, &b| {
            lines[a]
                .baseline
                .total_cmp(&lines[b].baseline)
                .then(lines[a].bbox.x0.total_cmp(&lines[b].bbox.x0))
        });

        let mut open: Vec<OpenParagraph> = Vec::new();
        for l in order {
            let line = &lines[l];
            let candidate = open
                .iter()
                .enumerate()
                .filter(|(_, p)| {
                    p.last_baseline < line.baseline && p.bbox.horizontal_overlap(&line.bbox) > 0.0
                })
                .max_by(|a, b| a.1.last_baseline.total_cmp(&b.1.last_baseline))
                .map(|(i, _)| i);

            match candidate {
                Some(i) if self.continues(&open[i], line) => {
                    let p = &mut open[i];
                    let spacing = line.baseline - p.last_baseline;
                    if p.body_x0.is_none() {
                        p.body_x0 = Some(line.bbox.x0);
                    }
                    if p.line_height.is_none() {
                        p.line_height = Some(spacing);
                    }
                    p.lines.push(l);
                    p.bbox = p.bbox.union(&line.bbox);
                    p.last_baseline = line.baseline;
                    p.last_bbox = line.bbox;
                }
                _ => open.push(OpenParagraph {
                    lines: vec![l],
                    bbox: line.bbox,
                    first_x0: line.bbox.x0,
                    body_x0: None,
                    last_baseline: line.baseline,
                    last_bbox: line.bbox,
                    line_height: None,
                    font_size: line.font_size,
                    list_item: starts_with_list_marker(&line.text),
                }),
            }
        }

        open.into_iter()
            .map(|p| ParagraphCluster {
                low_confidence: p.lines.iter().any(|&l| lines[l].rotated),
                first_line_indent: p.body_x0.map(|body| p.first_x0 - body).unwrap_or(0.0),
                lines: p.lines,
                bbox: p.bbox,
                list_item: p.list_item,
            })
            .collect()
    }

    fn continues(&self, p: &OpenParagraph, line: &Line) -> bool {
        let cfg = self.config;
        let size = line.font_size.max(1.0);

        let spacing = line.baseline - p.last_baseline;
        let expected = p
            .line_height
            .unwrap_or(cfg.default_line_height_factor * p.font_size.max(size));
        if spacing <= 0.0 || spacing > cfg.paragraph_spacing_factor * expected {
            return false;
        }
        if (line.font_size - p.font_size).abs() > cfg.font_size_break_delta {
            return false;
        }
        if starts_with_list_marker(&line.text) {
            return false;
        }

        let margin = cfg.margin_shift_em * size;
        let centered = (line.bbox.center().x - p.last_bbox.center().x).abs() <= margin;
        match p.body_x0 {
            Some(body) => (line.bbox.x0 - body).abs() <= margin || centered,
            None => {
                let dx = line.bbox.x0 - p.first_x0;
                let max_indent = cfg.first_line_indent_max_em * size;
                dx.abs() <= margin
                    // first line indented, body returns left
                    || (dx < 0.0 && -dx <= max_indent)
                    // list item continuation hangs under the text
                    || (p.list_item && dx > 0.0 && dx <= max_indent)
                    || centered
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fixtures::{glyph, page, rotated, ruled_box};
    use crate::model::Primitive;

    fn cluster(prims: Vec<Primitive>) -> ClusterTree {
        cluster_with(prims, TableDetectionMode::Both)
    }

    fn cluster_with(prims: Vec<Primitive>, mode: TableDetectionMode) -> ClusterTree {
        let config = LayoutConfig::default();
        GeometryClusterer::new(&config).cluster(&page(prims), mode)
    }

    fn texts(tree: &ClusterTree) -> Vec<String> {
        (0..tree.paragraphs.len())
            .map(|i| tree.paragraph_text(i))
            .collect()
    }

    #[test]
    fn test_empty_page_gives_empty_tree() {
        let tree = cluster(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.paragraphs.is_empty());
        assert!(tree.has_exclusive_membership(0));
    }

    #[test]
    fn test_spacing_breaks_paragraphs() {
        // "Hello" is 5 chars × 6pt = 30pt wide; "World" starts 5pt later.
        let tree = cluster(vec![
            glyph("Hello", 72.0, 100.0, 12.0),
            glyph("World", 107.0, 100.0, 12.0),
            glyph("New paragraph", 72.0, 140.0, 12.0),
        ]);
        assert_eq!(texts(&tree), vec!["Hello World", "New paragraph"]);
        assert_eq!(tree.words.len(), 3);
        assert!(tree.has_exclusive_membership(3));
    }

    #[test]
    fn test_touching_runs_form_one_word() {
        let tree = cluster(vec![
            glyph("Conv", 72.0, 100.0, 12.0),
            glyph("ersion", 96.0, 100.0, 12.0),
        ]);
        assert_eq!(tree.words.len(), 1);
        assert_eq!(tree.words[0].text, "Conversion");
        assert_eq!(tree.words[0].glyphs, vec![0, 1]);
    }

    #[test]
    fn test_consecutive_lines_join() {
        let tree = cluster(vec![
            glyph("first line of text", 72.0, 100.0, 10.0),
            glyph("second line of text", 72.0, 112.0, 10.0),
            glyph("third line", 72.0, 124.0, 10.0),
        ]);
        assert_eq!(tree.paragraphs.len(), 1);
        assert_eq!(tree.paragraphs[0].lines.len(), 3);
    }

    #[test]
    fn test_first_line_indent_is_accepted() {
        let tree = cluster(vec![
            glyph("Indented opening line", 92.0, 100.0, 10.0),
            glyph("body continues here", 72.0, 112.0, 10.0),
            glyph("and ends here", 72.0, 124.0, 10.0),
        ]);
        assert_eq!(tree.paragraphs.len(), 1);
        assert_eq!(tree.paragraphs[0].first_line_indent, 20.0);
    }

    #[test]
    fn test_margin_shift_breaks() {
        let tree = cluster(vec![
            glyph("body line one", 72.0, 100.0, 10.0),
            glyph("body line two", 72.0, 112.0, 10.0),
            glyph("quoted block", 110.0, 124.0, 10.0),
        ]);
        assert_eq!(tree.paragraphs.len(), 2);
    }

    #[test]
    fn test_font_size_change_breaks() {
        let tree = cluster(vec![
            glyph("Heading", 72.0, 100.0, 16.0),
            glyph("Body text", 72.0, 116.0, 10.0),
        ]);
        assert_eq!(texts(&tree), vec!["Heading", "Body text"]);
    }

    #[test]
    fn test_list_marker_starts_paragraph() {
        let tree = cluster(vec![
            glyph("• first item", 72.0, 100.0, 10.0),
            glyph("• second item", 72.0, 112.0, 10.0),
        ]);
        assert_eq!(tree.paragraphs.len(), 2);
        assert!(tree.paragraphs.iter().all(|p| p.list_item));
    }

    #[test]
    fn test_columns_group_independently() {
        let tree = cluster(vec![
            glyph("left column line one", 50.0, 100.0, 10.0),
            glyph("right column line one", 300.0, 100.0, 10.0),
            glyph("left column line two", 50.0, 112.0, 10.0),
            glyph("right column line two", 300.0, 112.0, 10.0),
        ]);
        assert_eq!(tree.lines.len(), 4);
        assert_eq!(
            texts(&tree),
            vec![
                "left column line one left column line two",
                "right column line one right column line two"
            ]
        );
    }

    #[test]
    fn test_rotated_text_is_low_confidence() {
        let tree = cluster(vec![rotated(glyph("Sideways", 72.0, 100.0, 10.0), 30.0)]);
        assert_eq!(tree.paragraphs.len(), 1);
        assert!(tree.paragraphs[0].low_confidence);
    }

    #[test]
    fn test_ruled_region_claims_its_lines() {
        let mut prims = vec![glyph("Intro paragraph", 50.0, 80.0, 10.0)];
        prims.extend(ruled_box(50.0, 100.0, 250.0, 160.0, &[130.0], &[150.0]));
        prims.push(glyph("A1", 55.0, 120.0, 10.0));
        prims.push(glyph("B1", 155.0, 120.0, 10.0));
        prims.push(glyph("A2", 55.0, 150.0, 10.0));
        prims.push(glyph("B2", 155.0, 150.0, 10.0));

        let tree = cluster(prims.clone());
        assert_eq!(tree.regions.len(), 1);
        assert!(matches!(tree.regions[0].kind, RegionKind::Ruled(_)));
        assert_eq!(texts(&tree), vec!["Intro paragraph"]);
        assert!(tree.has_exclusive_membership(prims.len()));

        let heuristic = cluster_with(prims, TableDetectionMode::Heuristic);
        assert!(heuristic
            .regions
            .iter()
            .all(|r| matches!(r.kind, RegionKind::Gutter { .. })));
    }

    #[test]
    fn test_rules_only_skips_gutter_tables() {
        let prims = vec![
            glyph("Name", 72.0, 100.0, 10.0),
            glyph("Age", 200.0, 100.0, 10.0),
            glyph("Alice", 72.0, 115.0, 10.0),
            glyph("30", 200.0, 115.0, 10.0),
        ];
        assert_eq!(cluster_with(prims.clone(), TableDetectionMode::Heuristic).regions.len(), 1);
        assert!(cluster_with(prims, TableDetectionMode::RulesOnly).regions.is_empty());
    }
}
