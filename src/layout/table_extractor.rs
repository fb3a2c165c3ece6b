//! Table extraction: a table region becomes a [`TableGrid`].
//!
//! Ruled regions take their boundaries from the ruling lines; rows with no
//! horizontal rules between them are split at text-baseline gaps. Gutter
//! regions take columns from the detected edges and rows from baselines.

use crate::error::{Error, Result};
use crate::model::{
    ClusterTree, GridCell, Rect, RegionKind, Ruling, RulingGrid, TableGrid, TableRegion,
};

use super::config::LayoutConfig;
use super::gutter::find_column;

/// A grid extracted from a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub grid: TableGrid,
    pub ruled: bool,
    pub bbox: Rect,
}

/// Words of a region sharing a baseline.
#[derive(Debug, Clone)]
struct TextBand {
    top: f32,
    bottom: f32,
    words: Vec<usize>,
}

pub struct TableExtractor<'a> {
    config: &'a LayoutConfig,
}

impl<'a> TableExtractor<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Extract the grid of `region`.
    ///
    /// Fails with [`Error::TableInconsistency`] when the region does not form
    /// a consistent grid; the caller demotes such regions to paragraphs.
    pub fn extract(&self, region: &TableRegion, tree: &ClusterTree) -> Result<ExtractedTable> {
        let words: Vec<usize> = region
            .lines
            .iter()
            .flat_map(|&l| tree.lines[l].words.iter().copied())
            .collect();
        let bands = self.text_bands(tree, &words);

        let (grid, ruled) = match &region.kind {
            RegionKind::Ruled(rulings) => (self.ruled_grid(rulings, tree, &bands)?, true),
            RegionKind::Gutter { columns } => {
                (self.gutter_grid(region.bbox, columns, tree, &bands)?, false)
            }
        };

        grid.validate().map_err(Error::TableInconsistency)?;
        log::debug!(
            "table at {:?}: {}x{} grid, {} cells",
            region.bbox,
            grid.row_count(),
            grid.column_count(),
            grid.cells.len()
        );
        Ok(ExtractedTable {
            grid,
            ruled,
            bbox: region.bbox,
        })
    }

    fn text_bands(&self, tree: &ClusterTree, words: &[usize]) -> Vec<TextBand> {
        let mut sorted = words.to_vec();
        sorted.sort_by(|&a, &b| {
            tree.words[a]
                .baseline
                .total_cmp(&tree.words[b].baseline)
                .then(tree.words[a].bbox.x0.total_cmp(&tree.words[b].bbox.x0))
        });

        let eps = self.config.baseline_epsilon_factor;
        let mut bands: Vec<(f32, f32, TextBand)> = Vec::new();
        for w in sorted {
            let word = &tree.words[w];
            match bands.last_mut() {
                Some((baseline, size, band))
                    if (word.baseline - *baseline).abs() <= eps * size.max(word.font_size) =>
                {
                    band.top = band.top.min(word.bbox.y0);
                    band.bottom = band.bottom.max(word.bbox.y1);
                    band.words.push(w);
                }
                _ => bands.push((
                    word.baseline,
                    word.font_size,
                    TextBand {
                        top: word.bbox.y0,
                        bottom: word.bbox.y1,
                        words: vec![w],
                    },
                )),
            }
        }
        bands.into_iter().map(|(_, _, band)| band).collect()
    }

    fn ruled_grid(
        &self,
        rulings: &RulingGrid,
        tree: &ClusterTree,
        bands: &[TextBand],
    ) -> Result<TableGrid> {
        let tol = self.config.ruling_snap_tolerance;
        let coverage = self.config.boundary_coverage;
        let hs = distinct_positions(&rulings.horizontals, tol);
        let vs = distinct_positions(&rulings.verticals, tol);
        let (Some(&top), Some(&bottom), Some(&left), Some(&right)) =
            (hs.first(), hs.last(), vs.first(), vs.last())
        else {
            return Err(Error::TableInconsistency("no ruling lines".into()));
        };

        let present = |rules: &[Ruling], pos: f32, from: f32, to: f32| {
            rules
                .iter()
                .any(|r| (r.position - pos).abs() <= tol && r.coverage(from, to) >= coverage)
        };
        let outer_ok = present(&rulings.horizontals, top, left, right)
            && present(&rulings.horizontals, bottom, left, right)
            && present(&rulings.verticals, left, top, bottom)
            && present(&rulings.verticals, right, top, bottom);
        if !outer_ok {
            return Err(Error::TableInconsistency("outer edge missing".into()));
        }

        // Without internal horizontal rules, every baseline gap is a row.
        let mut row_bounds = hs.clone();
        let mut implicit = Vec::new();
        if hs.len() == 2 {
            let inside: Vec<&TextBand> = bands
                .iter()
                .filter(|b| (b.top + b.bottom) / 2.0 > top && (b.top + b.bottom) / 2.0 < bottom)
                .collect();
            for pair in inside.windows(2) {
                let y = (pair[0].bottom + pair[1].top) / 2.0;
                implicit.push(y);
                row_bounds.push(y);
            }
            row_bounds.sort_by(f32::total_cmp);
        }
        let col_bounds = vs;

        let rows = row_bounds.len() - 1;
        let cols = col_bounds.len() - 1;
        if rows < 2 || cols < 2 {
            return Err(Error::TableInconsistency(format!(
                "{}x{} grid is too small",
                rows, cols
            )));
        }

        self.check_rule_ends(rulings, &row_bounds, &col_bounds, bands)?;

        let v_present = |row: usize, boundary: usize| {
            present(
                &rulings.verticals,
                col_bounds[boundary],
                row_bounds[row],
                row_bounds[row + 1],
            )
        };
        let h_present = |boundary: usize, col: usize| {
            implicit.iter().any(|&y| (y - row_bounds[boundary]).abs() < 1e-3)
                || present(
                    &rulings.horizontals,
                    row_bounds[boundary],
                    col_bounds[col],
                    col_bounds[col + 1],
                )
        };

        let mut owner = vec![false; rows * cols];
        let mut cells = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if owner[r * cols + c] {
                    continue;
                }
                let mut cell = GridCell::new(r, c);
                while c + cell.colspan < cols
                    && !owner[r * cols + c + cell.colspan]
                    && !v_present(r, c + cell.colspan)
                {
                    cell.colspan += 1;
                }
                while r + cell.rowspan < rows
                    && (c..c + cell.colspan).all(|cc| {
                        !owner[(r + cell.rowspan) * cols + cc] && !h_present(r + cell.rowspan, cc)
                    })
                {
                    cell.rowspan += 1;
                }
                for rr in r..r + cell.rowspan {
                    for cc in c..c + cell.colspan {
                        owner[rr * cols + cc] = true;
                    }
                }
                cells.push(cell);
            }
        }

        let mut grid = TableGrid {
            row_bounds,
            col_bounds,
            cells,
        };
        let words: Vec<usize> = bands.iter().flat_map(|b| b.words.iter().copied()).collect();
        assign_by_overlap(&mut grid, tree, &words);
        Ok(grid)
    }

    /// Every rule must end on a perpendicular boundary; a vertical rule may
    /// also end in the gap between two text rows.
    fn check_rule_ends(
        &self,
        rulings: &RulingGrid,
        row_bounds: &[f32],
        col_bounds: &[f32],
        bands: &[TextBand],
    ) -> Result<()> {
        let tol = self.config.ruling_snap_tolerance;
        let near = |bounds: &[f32], v: f32| bounds.iter().any(|b| (b - v).abs() <= tol);
        let in_text = |y: f32| bands.iter().any(|b| y > b.top + tol && y < b.bottom - tol);

        for v in &rulings.verticals {
            for end in [v.start, v.end] {
                if !near(row_bounds, end) && in_text(end) {
                    return Err(Error::TableInconsistency(format!(
                        "vertical rule at x={:.1} ends inside a text row",
                        v.position
                    )));
                }
            }
        }
        for h in &rulings.horizontals {
            for end in [h.start, h.end] {
                if !near(col_bounds, end) {
                    return Err(Error::TableInconsistency(format!(
                        "horizontal rule at y={:.1} does not end on a column boundary",
                        h.position
                    )));
                }
            }
        }
        Ok(())
    }

    fn gutter_grid(
        &self,
        bbox: Rect,
        columns: &[f32],
        tree: &ClusterTree,
        bands: &[TextBand],
    ) -> Result<TableGrid> {
        let slack = self.config.gutter.bucket_size;
        let mut col_bounds = vec![bbox.x0];
        col_bounds.extend(columns.iter().skip(1).map(|&x| x - slack));
        col_bounds.push(bbox.x1);
        if col_bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::TableInconsistency(
                "column edges are not increasing".into(),
            ));
        }

        let mut row_bounds = vec![bbox.y0];
        row_bounds.extend(bands.windows(2).map(|w| (w[0].bottom + w[1].top) / 2.0));
        row_bounds.push(bbox.y1);

        let rows = row_bounds.len() - 1;
        let cols = col_bounds.len() - 1;
        if rows < 2 || cols < 2 {
            return Err(Error::TableInconsistency(format!(
                "{}x{} grid is too small",
                rows, cols
            )));
        }

        let mut cells: Vec<GridCell> = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| GridCell::new(r, c)))
            .collect();
        for (r, band) in bands.iter().enumerate() {
            for &w in &band.words {
                let c = find_column(tree.words[w].bbox.x0, columns, slack).min(cols - 1);
                cells[r * cols + c].words.push(w);
            }
        }
        Ok(TableGrid {
            row_bounds,
            col_bounds,
            cells,
        })
    }
}

/// Sorted rule positions with near-duplicates collapsed.
fn distinct_positions(rules: &[Ruling], tol: f32) -> Vec<f32> {
    let mut positions: Vec<f32> = rules.iter().map(|r| r.position).collect();
    positions.sort_by(f32::total_cmp);
    positions.dedup_by(|b, a| (*b - *a).abs() <= tol);
    positions
}

/// Assign each word to the cell it overlaps most; ties go to the first cell
/// in row-major order (upper, then left). Words overlapping no cell go to the
/// cell nearest their centre.
fn assign_by_overlap(grid: &mut TableGrid, tree: &ClusterTree, words: &[usize]) {
    let rects: Vec<Rect> = grid
        .cells
        .iter()
        .map(|c| {
            Rect::new(
                grid.col_bounds[c.col],
                grid.row_bounds[c.row],
                grid.col_bounds[c.col + c.colspan],
                grid.row_bounds[c.row + c.rowspan],
            )
        })
        .collect();
    if rects.is_empty() {
        return;
    }

    for &w in words {
        let bbox = tree.words[w].bbox;
        let mut best: Option<(usize, f32)> = None;
        for (i, rect) in rects.iter().enumerate() {
            let area = rect.overlap_area(&bbox);
            if area > 0.0 && best.map_or(true, |(_, a)| area > a) {
                best = Some((i, area));
            }
        }
        let index = match best {
            Some((i, _)) => i,
            None => {
                let center = bbox.center();
                rects
                    .iter()
                    .position(|r| r.contains_point(center))
                    .unwrap_or_else(|| nearest(&rects, bbox))
            }
        };
        grid.cells[index].words.push(w);
    }

    for cell in &mut grid.cells {
        cell.words.sort_by(|&a, &b| {
            tree.words[a]
                .baseline
                .total_cmp(&tree.words[b].baseline)
                .then(tree.words[a].bbox.x0.total_cmp(&tree.words[b].bbox.x0))
        });
    }
}

fn nearest(rects: &[Rect], bbox: Rect) -> usize {
    let c = bbox.center();
    rects
        .iter()
        .enumerate()
        .min_by(|a, b| {
            let da = (a.1.center().x - c.x).powi(2) + (a.1.center().y - c.y).powi(2);
            let db = (b.1.center().x - c.x).powi(2) + (b.1.center().y - c.y).powi(2);
            da.total_cmp(&db)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
