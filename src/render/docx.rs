//! DOCX output through `docx-rs`.

use std::io::Cursor;

use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph as DocxParagraph, Pic, Run, RunFonts,
    SpecialIndentType, Style, StyleType, Table as DocxTable, TableCell, TableRow, VMergeType,
};

use crate::error::{Error, Result};
use crate::model::{Alignment, Paragraph, Placement, Table, TextRun};

use super::images::EncodedImage;
use super::sink::DocumentSink;

/// Points to twentieths of a point.
fn twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

/// Points to English Metric Units.
fn emu(points: f32) -> u32 {
    (points.max(1.0) * 12_700.0).round() as u32
}

/// Heading sizes (half-points) of the `Heading1`..`Heading6` styles.
const HEADING_SIZES: [usize; 6] = [40, 32, 28, 26, 24, 22];

/// Writes a flow document as a WordprocessingML package.
pub struct DocxSink {
    docx: Docx,
}

impl Default for DocxSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxSink {
    pub fn new() -> Self {
        let mut docx = Docx::new();
        for (i, size) in HEADING_SIZES.iter().enumerate() {
            let level = i + 1;
            docx = docx.add_style(
                Style::new(format!("Heading{}", level), StyleType::Paragraph)
                    .name(format!("Heading {}", level))
                    .size(*size)
                    .bold(),
            );
        }
        Self { docx }
    }

    fn take(&mut self) -> Docx {
        std::mem::replace(&mut self.docx, Docx::new())
    }
}

fn run(text_run: &TextRun) -> Run {
    let style = &text_run.style;
    let family = style.font_family.as_str();
    let mut run = Run::new()
        .add_text(text_run.text.as_str())
        .size(style.size_half_points as usize)
        .fonts(
            RunFonts::new()
                .ascii(family)
                .hi_ansi(family)
                .east_asia(family)
                .cs(family),
        )
        .color(style.color.to_hex());
    if style.bold {
        run = run.bold();
    }
    if style.italic {
        run = run.italic();
    }
    if style.underline {
        run = run.underline("single");
    }
    run
}

fn paragraph(source: &Paragraph) -> DocxParagraph {
    let mut p = DocxParagraph::new();
    for text_run in &source.runs {
        p = p.add_run(run(text_run));
    }

    p = p.align(match source.alignment() {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    });

    if let Some(level) = source.style.heading_level {
        p = p.style(&format!("Heading{}", level.clamp(1, 6)));
    }

    let indent = twips(source.style.first_line_indent);
    if indent > 0 {
        p = p.indent(None, Some(SpecialIndentType::FirstLine(indent)), None, None);
    } else if indent < 0 {
        p = p.indent(
            Some(-indent),
            Some(SpecialIndentType::Hanging(-indent)),
            None,
            None,
        );
    }
    p
}

fn cell_paragraphs(mut cell: TableCell, content: Option<&Vec<Paragraph>>) -> TableCell {
    match content {
        Some(paragraphs) if !paragraphs.is_empty() => {
            for p in paragraphs {
                cell = cell.add_paragraph(paragraph(p));
            }
            cell
        }
        _ => cell.add_paragraph(DocxParagraph::new()),
    }
}

/// Rows of WordprocessingML cells. Row spans become vertical merges, column
/// spans become grid spans.
fn table(source: &Table) -> DocxTable {
    let grid = &source.grid;
    let mut rows = Vec::with_capacity(grid.row_count());

    for r in 0..grid.row_count() {
        let mut cells = Vec::new();
        let mut c = 0;
        while c < grid.column_count() {
            let Some(index) = grid.cells.iter().position(|cell| cell.covers(r, c)) else {
                cells.push(TableCell::new().add_paragraph(DocxParagraph::new()));
                c += 1;
                continue;
            };
            let cell = &grid.cells[index];
            let mut docx_cell = TableCell::new();
            if cell.colspan > 1 {
                docx_cell = docx_cell.grid_span(cell.colspan);
            }
            if cell.row == r {
                if cell.rowspan > 1 {
                    docx_cell = docx_cell.vertical_merge(VMergeType::Restart);
                }
                docx_cell = cell_paragraphs(docx_cell, source.cell_content.get(index));
            } else {
                docx_cell = docx_cell
                    .vertical_merge(VMergeType::Continue)
                    .add_paragraph(DocxParagraph::new());
            }
            cells.push(docx_cell);
            c = (cell.col + cell.colspan).max(c + 1);
        }
        rows.push(TableRow::new(cells));
    }

    let widths = grid
        .column_widths()
        .into_iter()
        .map(|w| twips(w).max(1) as usize)
        .collect();
    DocxTable::new(rows).set_grid(widths)
}

impl DocumentSink for DocxSink {
    fn begin_page(&mut self, _page: u32, page_break: bool) -> Result<()> {
        if page_break {
            let docx = self.take();
            self.docx = docx
                .add_paragraph(DocxParagraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
        Ok(())
    }

    fn paragraph(&mut self, source: &Paragraph) -> Result<()> {
        let docx = self.take();
        self.docx = docx.add_paragraph(paragraph(source));
        Ok(())
    }

    fn table(&mut self, source: &Table) -> Result<()> {
        let docx = self.take();
        self.docx = docx.add_table(table(source));
        Ok(())
    }

    fn image(&mut self, image: &EncodedImage, placement: &Placement) -> Result<()> {
        let pic = Pic::new(&image.png).size(emu(placement.width), emu(placement.height));
        let docx = self.take();
        self.docx = docx.add_paragraph(DocxParagraph::new().add_run(Run::new().add_image(pic)));
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.take()
            .build()
            .pack(&mut buf)
            .map_err(|e| Error::WriteFailure(format!("DOCX packaging failed: {}", e)))?;
        Ok(buf.into_inner())
    }
}
