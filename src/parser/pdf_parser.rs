//! PDF document reader using lopdf.

use std::io::Read;
use std::path::Path;

use crate::detect::{has_eof_marker, sniff_bytes};
use crate::error::{Error, Result};
use crate::model::{Metadata, Page};

use super::backend::{LopdfBackend, PageGeometry, PdfBackend};
use super::content::interpret_page;
use super::metadata::extract_metadata;
use super::options::{ErrorMode, ReadOptions};

/// Pages and metadata read from one PDF.
#[derive(Debug, Clone, Default)]
pub struct ReadDocument {
    pub metadata: Metadata,
    /// Selected pages in page order
    pub pages: Vec<Page>,
    /// Recovered problems (lenient mode, damaged trailer)
    pub warnings: Vec<String>,
}

/// PDF document reader.
pub struct PdfParser {
    backend: LopdfBackend,
    options: ReadOptions,
    warnings: Vec<String>,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ReadOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ReadOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ReadOptions) -> Result<Self> {
        let header = sniff_bytes(data)?;
        let mut warnings = Vec::new();
        if header.offset > 0 {
            warnings.push(format!("{} bytes of garbage before the PDF header", header.offset));
        }
        if !has_eof_marker(data) {
            warnings.push("missing %%EOF marker, file may be truncated".to_string());
        }

        let backend = LopdfBackend::load_bytes(data)?;

        // lopdf only decrypts documents with an empty user password.
        if backend.is_encrypted() {
            return Err(Error::UnreadableDocument(
                "document is encrypted".to_string(),
            ));
        }

        for warning in &warnings {
            log::warn!("{}", warning);
        }

        Ok(Self {
            backend,
            options,
            warnings,
        })
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R, options: ReadOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub fn backend(&self) -> &LopdfBackend {
        &self.backend
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.backend.version()
    }

    pub fn metadata(&self) -> Metadata {
        extract_metadata(self.backend.raw_doc())
    }

    /// Page box and rotation of a page (1-indexed).
    pub fn page_geometry(&self, number: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(number)?;
        self.backend.page_geometry(page_id)
    }

    /// Page numbers selected by the options, after range checks.
    pub fn selected_pages(&self) -> Result<Vec<u32>> {
        let total = self.page_count();
        if let Some(max) = self.options.pages.max_page() {
            if max > total {
                return Err(Error::PageOutOfRange(max, total));
            }
        }
        Ok((1..=total)
            .filter(|n| self.options.pages.includes(*n))
            .collect())
    }

    fn page_id(&self, number: u32) -> Result<(u32, u16)> {
        let total = self.page_count();
        self.backend
            .pages()
            .get(&number)
            .copied()
            .ok_or(Error::PageOutOfRange(number, total))
    }

    /// Read one page into primitives.
    ///
    /// In lenient mode a page that cannot be decoded comes back empty and the
    /// problem is returned as a warning instead of an error.
    pub fn read_page(&self, number: u32) -> Result<(Page, Option<String>)> {
        let page_id = self.page_id(number)?;
        match interpret_page(&self.backend, page_id, number, &self.options) {
            Ok(page) => Ok((page, None)),
            Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                let warning = format!("page {} skipped: {}", number, e);
                log::warn!("{}", warning);
                let (width, height) = self
                    .backend
                    .page_geometry(page_id)
                    .map(|g| g.displayed_size())
                    .unwrap_or((612.0, 792.0));
                Ok((Page::new(number, width, height), Some(warning)))
            }
            Err(e) => Err(e),
        }
    }

    /// Read every selected page.
    pub fn read(&self) -> Result<ReadDocument> {
        let mut doc = ReadDocument {
            metadata: self.metadata(),
            pages: Vec::new(),
            warnings: self.warnings.clone(),
        };

        for number in self.selected_pages()? {
            let (page, warning) = self.read_page(number)?;
            doc.pages.push(page);
            doc.warnings.extend(warning);
        }

        Ok(doc)
    }

    /// Warnings raised while opening the file.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
