//! Table grid types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// One cell of a [`TableGrid`], anchored at its top-left coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    /// Number of rows covered (>= 1)
    pub rowspan: usize,
    /// Number of columns covered (>= 1)
    pub colspan: usize,
    /// Words (indices into the page's cluster tree) assigned to this cell
    pub words: Vec<usize>,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            rowspan: 1,
            colspan: 1,
            words: Vec::new(),
        }
    }

    pub fn covers(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.rowspan
            && col >= self.col
            && col < self.col + self.colspan
    }

    pub fn is_merged(&self) -> bool {
        self.rowspan > 1 || self.colspan > 1
    }
}

/// Rows × columns of cells with optional spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrid {
    /// Row boundaries, top to bottom (`rows + 1` values)
    pub row_bounds: Vec<f32>,
    /// Column boundaries, left to right (`cols + 1` values)
    pub col_bounds: Vec<f32>,
    /// Cells in row-major order of their anchor
    pub cells: Vec<GridCell>,
}

impl TableGrid {
    pub fn row_count(&self) -> usize {
        self.row_bounds.len().saturating_sub(1)
    }

    pub fn column_count(&self) -> usize {
        self.col_bounds.len().saturating_sub(1)
    }

    /// Column widths in points.
    pub fn column_widths(&self) -> Vec<f32> {
        self.col_bounds.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// The cell covering `(row, col)`, if any.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cells.iter().find(|c| c.covers(row, col))
    }

    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().any(GridCell::is_merged)
    }

    /// Check the grid invariant: spans are >= 1, stay inside the grid, and
    /// no two cells claim the same coordinate.
    pub fn validate(&self) -> Result<(), String> {
        let rows = self.row_count();
        let cols = self.column_count();
        let mut owner: Vec<Option<usize>> = vec![None; rows * cols];

        for (i, cell) in self.cells.iter().enumerate() {
            if cell.rowspan == 0 || cell.colspan == 0 {
                return Err(format!("cell {} has a zero span", i));
            }
            if cell.row + cell.rowspan > rows || cell.col + cell.colspan > cols {
                return Err(format!(
                    "cell {} at ({}, {}) spans outside a {}x{} grid",
                    i, cell.row, cell.col, rows, cols
                ));
            }
            for r in cell.row..cell.row + cell.rowspan {
                for c in cell.col..cell.col + cell.colspan {
                    let slot = &mut owner[r * cols + c];
                    if let Some(other) = slot {
                        return Err(format!(
                            "cells {} and {} both claim ({}, {})",
                            other, i, r, c
                        ));
                    }
                    *slot = Some(i);
                }
            }
        }
        Ok(())
    }
}

/// A table node: grid plus the styled content of each cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub grid: TableGrid,
    /// Paragraphs of each cell, parallel to `grid.cells`
    pub cell_content: Vec<Vec<Paragraph>>,
    /// Whether the grid came from ruling lines
    pub ruled: bool,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.grid.column_count()
    }

    /// Plain text of a cell's paragraphs.
    pub fn cell_text(&self, cell: usize) -> String {
        self.cell_content
            .get(cell)
            .map(|ps| {
                ps.iter()
                    .map(|p| p.plain_text())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }

    /// Tab/newline separated text, one line per row.
    pub fn plain_text(&self) -> String {
        (0..self.row_count())
            .map(|r| {
                self.grid
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.row == r)
                    .map(|(i, _)| self.cell_text(i))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize, cells: Vec<GridCell>) -> TableGrid {
        TableGrid {
            row_bounds: (0..=rows).map(|r| r as f32 * 20.0).collect(),
            col_bounds: (0..=cols).map(|c| c as f32 * 50.0).collect(),
            cells,
        }
    }

    #[test]
    fn test_valid_grid_with_colspan() {
        let mut wide = GridCell::new(1, 0);
        wide.colspan = 2;
        let g = grid(2, 2, vec![GridCell::new(0, 0), GridCell::new(0, 1), wide]);
        assert!(g.validate().is_ok());
        assert!(g.has_merged_cells());
        assert_eq!(g.cell_at(1, 1).map(|c| c.col), Some(0));
        assert_eq!(g.column_widths(), vec![50.0, 50.0]);
    }

    #[test]
    fn test_overlapping_cells_rejected() {
        let mut wide = GridCell::new(0, 0);
        wide.colspan = 2;
        let g = grid(1, 2, vec![wide, GridCell::new(0, 1)]);
        assert!(g.validate().unwrap_err().contains("both claim"));
    }

    #[test]
    fn test_span_outside_grid_rejected() {
        let mut tall = GridCell::new(0, 0);
        tall.rowspan = 3;
        assert!(grid(2, 1, vec![tall]).validate().is_err());
    }
}
