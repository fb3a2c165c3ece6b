//! # pdfword
//!
//! PDF to DOCX conversion through layout reconstruction.
//!
//! A PDF page is a bag of positioned glyphs, vector paths and images. This
//! library clusters them back into words, lines, paragraphs, columns and
//! tables, resolves their visual style, and writes an editable Word
//! document. Whatever cannot be reproduced exactly is listed in a
//! [`FidelityReport`] instead of failing the conversion.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfword::{convert, ConvertOptions};
//!
//! fn main() -> pdfword::Result<()> {
//!     let result = convert("paper.pdf", "paper.docx", &ConvertOptions::default())?;
//!     println!(
//!         "{} paragraphs, {} tables, {} fidelity notes",
//!         result.stats.paragraph_count,
//!         result.stats.table_count,
//!         result.report.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **parser**: primitive stream per page (glyph runs, paths, images)
//! - **layout**: geometry clustering, style resolution, table extraction,
//!   flow document building
//! - **render**: serialization adapter and the DOCX sink
//!
//! Pages are structured in parallel with Rayon; [`convert_batch`] runs whole
//! files on a bounded worker pool.

pub mod convert;
pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

use std::path::Path;

// Re-export commonly used types
pub use convert::{
    build_flow_document, build_flow_document_from_bytes, convert, convert_batch, write_document,
    ConversionResult, ConversionStats, ConversionSummary, ConvertOptions,
};
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use layout::{CancellationToken, LayoutConfig, TableDetectionMode};
pub use model::{
    Alignment, DocumentNode, FidelityEntry, FidelityReason, FidelityReport, FlowDocument,
    Metadata, Page, Paragraph, ParagraphStyle, StyleRecord, Table, TableGrid, TextRun,
};
pub use parser::{ErrorMode, PageSelection, PdfParser, ReadOptions};
pub use render::{DocumentSink, DocxSink, ImageQuality, JsonFormat};

/// Convert an in-memory PDF to DOCX package bytes.
///
/// # Example
///
/// ```no_run
/// use pdfword::{convert_bytes, ConvertOptions};
///
/// let data = std::fs::read("invoice.pdf").unwrap();
/// let (docx, report) = convert_bytes(&data, &ConvertOptions::default()).unwrap();
/// std::fs::write("invoice.docx", docx).unwrap();
/// assert!(report.len() < 100);
/// ```
pub fn convert_bytes(data: &[u8], options: &ConvertOptions) -> Result<(Vec<u8>, FidelityReport)> {
    let doc = build_flow_document_from_bytes(data, options)?;
    write_document(&doc, options)
}

/// Extract the reconstructed text of a PDF, blocks separated by blank lines.
///
/// Tables come out as tab-separated rows.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = build_flow_document(path, &ConvertOptions::default())?;
    Ok(doc.plain_text())
}

/// Builder-style entry point.
///
/// # Example
///
/// ```no_run
/// use pdfword::{Pdfword, TableDetectionMode};
///
/// let result = Pdfword::new()
///     .tables(TableDetectionMode::RulesOnly)
///     .without_images()
///     .convert("form.pdf", "form.docx")
///     .unwrap();
/// assert!(result.is_success());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pdfword {
    options: ConvertOptions,
}

impl Pdfword {
    /// Create with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first undecodable page.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    pub fn tables(mut self, mode: TableDetectionMode) -> Self {
        self.options = self.options.with_table_detection(mode);
        self
    }

    pub fn without_images(mut self) -> Self {
        self.options = self.options.with_images(false);
        self
    }

    pub fn without_columns(mut self) -> Self {
        self.options = self.options.with_column_detection(false);
        self
    }

    pub fn pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert one file.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<ConversionResult> {
        convert(input, output, &self.options)
    }

    /// Read and lay out a file without writing it.
    pub fn flow<P: AsRef<Path>>(&self, input: P) -> Result<FlowDocument> {
        build_flow_document(input, &self.options)
    }
}
