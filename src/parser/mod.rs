//! PDF reading: turns a PDF file into pages of positioned primitives.

pub mod backend;
mod content;
mod graphics;
mod metadata;
mod options;
mod pdf_parser;

use std::path::Path;

use crate::error::Result;

pub use backend::{LopdfBackend, PageGeometry, PdfBackend};
pub use content::{interpret_page, ContentInterpreter};
pub use metadata::parse_pdf_date;
pub use options::{ErrorMode, PageSelection, ReadOptions};
pub use pdf_parser::{PdfParser, ReadDocument};

/// Read the selected pages of a PDF file.
///
/// Fails with `UnreadableDocument` when the file is not a PDF, is corrupt, or
/// is encrypted.
pub fn read_pages<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<ReadDocument> {
    PdfParser::open_with_options(path, options.clone())?.read()
}

/// Read the selected pages of an in-memory PDF.
pub fn read_pages_from_bytes(data: &[u8], options: &ReadOptions) -> Result<ReadDocument> {
    PdfParser::from_bytes_with_options(data, options.clone())?.read()
}
