//! Table detection from aligned whitespace (stream mode).
//!
//! Tables without ruling lines are found by analysing text alignment: lines
//! are grouped into rows, rows are cut into cell chunks at wide gaps, and
//! left edges that line up across enough rows become column edges.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Line, Rect, Word};

use super::config::TableDetectorConfig;
use super::text::{is_bullet_marker, is_number_marker, push_word};

/// Gap (in em) at which words of one line fall into different cell chunks.
const CHUNK_GAP_EM: f32 = 1.0;

/// Rows further apart than this many em never belong to one table.
const MAX_ROW_GAP_EM: f32 = 3.0;

/// A whitespace-aligned table region.
#[derive(Debug, Clone, PartialEq)]
pub struct GutterRegion {
    pub bbox: Rect,
    /// Column left edges
    pub columns: Vec<f32>,
    /// Claimed line indices, top to bottom
    pub lines: Vec<usize>,
}

/// A horizontal piece of a line separated from its neighbours by a gutter.
#[derive(Debug, Clone)]
struct Chunk {
    x0: f32,
    x1: f32,
    text: String,
    line: usize,
}

/// Chunks on one baseline.
#[derive(Debug, Clone)]
struct RowData {
    y: f32,
    font_size: f32,
    chunks: Vec<Chunk>,
}

/// Detects whitespace-aligned tables among a page's lines.
pub struct GutterDetector<'a> {
    config: &'a TableDetectorConfig,
}

impl<'a> GutterDetector<'a> {
    pub fn new(config: &'a TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables among the `candidates` lines.
    pub fn detect(&self, words: &[Word], lines: &[Line], candidates: &[usize]) -> Vec<GutterRegion> {
        let chunks: Vec<Chunk> = candidates
            .iter()
            .flat_map(|&l| chunks_of(words, lines, l))
            .collect();
        if chunks.len() < self.config.min_rows * self.config.min_columns {
            return Vec::new();
        }

        let rows = self.group_into_rows(lines, chunks);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        log::debug!("gutter: {} rows, column edges {:?}", rows.len(), columns);
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut regions = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = &rows[start..=end];
            let table_columns = self.detect_columns(table_rows);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "gutter: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("gutter: skipping region, detected as list pattern");
                continue;
            }
            if self.is_prose(table_rows, &table_columns) {
                log::debug!("gutter: skipping region, reads as prose");
                continue;
            }

            let members: BTreeSet<usize> = table_rows
                .iter()
                .flat_map(|r| r.chunks.iter().map(|c| c.line))
                .collect();
            let mut member_lines: Vec<usize> = members.into_iter().collect();
            member_lines.sort_by(|&a, &b| {
                lines[a]
                    .baseline
                    .total_cmp(&lines[b].baseline)
                    .then(lines[a].bbox.x0.total_cmp(&lines[b].bbox.x0))
            });
            let Some(bbox) = member_lines
                .iter()
                .map(|&l| lines[l].bbox)
                .reduce(|a, b| a.union(&b))
            else {
                continue;
            };

            regions.push(GutterRegion {
                bbox,
                columns: table_columns,
                lines: member_lines,
            });
        }
        regions
    }

    /// Group chunks into rows by baseline.
    fn group_into_rows(&self, lines: &[Line], mut chunks: Vec<Chunk>) -> Vec<RowData> {
        chunks.sort_by(|a, b| {
            lines[a.line]
                .baseline
                .total_cmp(&lines[b.line].baseline)
                .then(a.x0.total_cmp(&b.x0))
        });

        let mut rows: Vec<RowData> = Vec::new();
        for chunk in chunks {
            let line = &lines[chunk.line];
            let tolerance = line.font_size * self.config.y_tolerance_factor;
            match rows.last_mut() {
                Some(row) if (line.baseline - row.y).abs() <= tolerance => {
                    row.font_size = row.font_size.max(line.font_size);
                    row.chunks.push(chunk);
                }
                _ => rows.push(RowData {
                    y: line.baseline,
                    font_size: line.font_size,
                    chunks: vec![chunk],
                }),
            }
        }
        for row in &mut rows {
            row.chunks.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        }
        rows
    }

    /// Column edges: bucketed left edges that recur across multi-chunk rows.
    fn detect_columns(&self, rows: &[RowData]) -> Vec<f32> {
        let multi_chunk_rows: Vec<&RowData> = rows.iter().filter(|r| r.chunks.len() >= 2).collect();
        if multi_chunk_rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let bucket_size = self.config.bucket_size;
        let mut edge_counts: BTreeMap<i32, usize> = BTreeMap::new();
        for row in &multi_chunk_rows {
            // Each bucket counts once per row.
            let buckets: BTreeSet<i32> = row
                .chunks
                .iter()
                .map(|c| (c.x0 / bucket_size).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((multi_chunk_rows.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut merged: Vec<f32> = Vec::new();
        for (bucket, count) in edge_counts {
            if count < min_occurrences {
                continue;
            }
            let edge = bucket as f32 * bucket_size;
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous runs of aligned multi-chunk rows.
    fn find_table_regions(&self, rows: &[RowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut current: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = row.chunks.len() >= 2
                && self.calculate_alignment_score(row, columns) >= self.config.min_alignment_ratio;
            let close = i == 0
                || current.is_none()
                || row.y - rows[i - 1].y <= MAX_ROW_GAP_EM * row.font_size.max(rows[i - 1].font_size);

            match (aligned, current) {
                (true, Some(_)) if close => {}
                (true, Some(start)) => {
                    self.close_region(&mut regions, start, i - 1);
                    current = Some(i);
                }
                (true, None) => current = Some(i),
                (false, Some(start)) => {
                    self.close_region(&mut regions, start, i - 1);
                    current = None;
                }
                (false, None) => {}
            }
        }
        if let Some(start) = current {
            self.close_region(&mut regions, start, rows.len() - 1);
        }
        regions
    }

    fn close_region(&self, regions: &mut Vec<(usize, usize)>, start: usize, end: usize) {
        if end + 1 - start >= self.config.min_rows {
            regions.push((start, end));
        }
    }

    /// Share of the row's chunks that start on a column edge.
    fn calculate_alignment_score(&self, row: &RowData, columns: &[f32]) -> f32 {
        if row.chunks.is_empty() || columns.is_empty() {
            return 0.0;
        }
        let tolerance = self.config.bucket_size;
        let aligned = row
            .chunks
            .iter()
            .filter(|c| columns.iter().any(|col| (c.x0 - col).abs() <= tolerance))
            .count();
        aligned as f32 / row.chunks.len() as f32
    }

    /// Numbered or bulleted lists split into marker and text look like two
    /// columns.
    fn is_list_pattern(&self, rows: &[RowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullet_count = 0;
        let mut number_count = 0;
        for row in rows {
            if let Some(first) = row.chunks.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullet_count += 1;
                } else if is_number_marker(text) {
                    number_count += 1;
                }
            }
        }

        let bullet_ratio = bullet_count as f32 / rows.len() as f32;
        let total_ratio = (bullet_count + number_count) as f32 / rows.len() as f32;

        // Bullets are almost never table data; numbered first columns are
        // only rejected for two-column candidates.
        bullet_ratio >= 0.5 || (columns.len() == 2 && total_ratio >= 0.5)
    }

    /// Side-by-side prose columns align like a table. They either carry long
    /// cells, or every column is filled with multi-word lines of similar
    /// width (a ragged right edge), which table columns rarely are.
    fn is_prose(&self, rows: &[RowData], columns: &[f32]) -> bool {
        let chunks: Vec<&Chunk> = rows.iter().flat_map(|r| r.chunks.iter()).collect();
        if chunks.is_empty() {
            return false;
        }
        let chars: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        if chars as f32 / chunks.len() as f32 > self.config.max_cell_chars {
            return true;
        }

        let mut per_column: Vec<Vec<&Chunk>> = vec![Vec::new(); columns.len().max(1)];
        for chunk in chunks {
            per_column[find_column(chunk.x0, columns, self.config.bucket_size)].push(chunk);
        }
        let filled: Vec<&Vec<&Chunk>> = per_column.iter().filter(|c| !c.is_empty()).collect();
        filled.len() >= 2 && filled.iter().all(|c| self.is_text_column(c))
    }

    /// Lines of running text: several words per chunk, and chunks that
    /// mostly reach the column's widest line.
    fn is_text_column(&self, chunks: &[&Chunk]) -> bool {
        let n = chunks.len() as f32;
        let words: usize = chunks.iter().map(|c| c.text.split_whitespace().count()).sum();
        let widest = chunks.iter().map(|c| c.x1 - c.x0).fold(0.0, f32::max);
        let mean_width = chunks.iter().map(|c| c.x1 - c.x0).sum::<f32>() / n;
        words as f32 / n >= self.config.prose_min_words
            && widest > 0.0
            && mean_width / widest >= self.config.prose_min_fill
    }
}

/// Cut a line into chunks at gaps of at least one em.
fn chunks_of(words: &[Word], lines: &[Line], line: usize) -> Vec<Chunk> {
    let l = &lines[line];
    let mut chunks: Vec<Chunk> = Vec::new();
    for &w in &l.words {
        let word = &words[w];
        let gap_limit = CHUNK_GAP_EM * word.font_size.max(l.font_size);
        match chunks.last_mut() {
            Some(chunk) if word.bbox.x0 - chunk.x1 < gap_limit => {
                chunk.x1 = chunk.x1.max(word.bbox.x1);
                push_word(&mut chunk.text, &word.text);
            }
            _ => chunks.push(Chunk {
                x0: word.bbox.x0,
                x1: word.bbox.x1,
                text: word.text.clone(),
                line,
            }),
        }
    }
    chunks
}

/// Index of the column a left edge `x` falls in.
///
/// Edges slightly left of a column start (within `slack`) still belong to
/// it; anything else goes to the nearest column.
pub fn find_column(x: f32, columns: &[f32], slack: f32) -> usize {
    if columns.is_empty() {
        return 0;
    }
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(f32::INFINITY);
        if x >= start - slack && x < end - slack {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|a, b| (x - a.1).abs().total_cmp(&(x - b.1).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
