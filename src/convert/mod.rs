//! End-to-end conversion: PDF file → DOCX file.
//!
//! # Example
//!
//! ```no_run
//! use pdfword::convert::{convert, ConvertOptions};
//! use pdfword::TableDetectionMode;
//!
//! fn main() -> pdfword::Result<()> {
//!     let options = ConvertOptions::new()
//!         .with_table_detection(TableDetectionMode::RulesOnly)
//!         .with_images(false);
//!
//!     let result = convert("report.pdf", "report.docx", &options)?;
//!     for entry in &result.report.entries {
//!         println!("page {}: {}", entry.page, entry.reason);
//!     }
//!     Ok(())
//! }
//! ```

mod batch;
pub mod paths;
mod stats;

pub use batch::convert_batch;
pub use stats::ConversionStats;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{
    structure_pages, CancellationToken, FlowBuilder, LayoutConfig, TableDetectionMode,
};
use crate::model::{FidelityReport, FlowDocument};
use crate::parser::{read_pages, read_pages_from_bytes, ErrorMode, PageSelection, ReadDocument, ReadOptions};
use crate::render::{DocxSink, ImageQuality, SerializationAdapter};

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Keep images in the output
    pub preserve_images: bool,

    /// Which table finders run
    pub table_detection: TableDetectionMode,

    /// Detect multi-column pages and read them column by column
    pub column_detection: bool,

    /// Size cap of embedded images
    pub image_quality: ImageQuality,

    /// Start every source page on a new output page
    pub preserve_page_breaks: bool,

    /// Pages to convert
    pub pages: PageSelection,

    /// How undecodable pages are handled
    pub error_mode: ErrorMode,

    /// Structure pages on the rayon pool
    pub parallel: bool,

    /// Concurrent files in [`convert_batch`]
    pub workers: usize,

    /// Layout thresholds
    pub layout: LayoutConfig,

    /// Cooperative cancellation, checked at page boundaries
    pub cancel: CancellationToken,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(4);
        Self {
            preserve_images: true,
            table_detection: TableDetectionMode::Both,
            column_detection: true,
            image_quality: ImageQuality::default(),
            preserve_page_breaks: true,
            pages: PageSelection::All,
            error_mode: ErrorMode::Lenient,
            parallel: true,
            workers,
            layout: LayoutConfig::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(mut self, preserve: bool) -> Self {
        self.preserve_images = preserve;
        self
    }

    pub fn with_table_detection(mut self, mode: TableDetectionMode) -> Self {
        self.table_detection = mode;
        self
    }

    pub fn with_column_detection(mut self, enabled: bool) -> Self {
        self.column_detection = enabled;
        self
    }

    pub fn with_image_quality(mut self, quality: ImageQuality) -> Self {
        self.image_quality = quality;
        self
    }

    pub fn with_page_breaks(mut self, enabled: bool) -> Self {
        self.preserve_page_breaks = enabled;
        self
    }

    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Fail the file on the first undecodable page.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Disable per-page parallelism.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions::new()
            .with_error_mode(self.error_mode)
            .with_pages(self.pages.clone())
            .with_images(self.preserve_images)
    }
}

/// Outcome of converting one file.
#[derive(Debug)]
pub struct ConversionResult {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Fidelity losses, ordered by node index
    pub report: FidelityReport,
    /// Recovered reading problems (skipped pages, damaged trailer)
    pub warnings: Vec<String>,
    pub stats: ConversionStats,
    /// Set when the file failed; nothing was written then
    pub error: Option<Error>,
}

impl ConversionResult {
    pub fn failed(input: impl Into<PathBuf>, output: impl Into<PathBuf>, error: Error) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            report: FidelityReport::new(),
            warnings: Vec::new(),
            stats: ConversionStats::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn summary(&self) -> ConversionSummary {
        ConversionSummary {
            input: self.input.display().to_string(),
            output: self.output.display().to_string(),
            success: self.is_success(),
            error: self.error.as_ref().map(|e| e.to_string()),
            warnings: self.warnings.clone(),
            stats: self.stats.clone(),
            fidelity: self.report.clone(),
        }
    }
}

/// Serializable view of a [`ConversionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub input: String,
    pub output: String,
    pub success: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub stats: ConversionStats,
    pub fidelity: FidelityReport,
}

/// Convert one PDF to a DOCX file.
///
/// Fatal errors (unreadable input, write failure, cancellation) are
/// returned as `Err` and leave no output file. Fidelity losses never fail
/// the call; they are listed in the result's report.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> Result<ConversionResult> {
    let input = input.as_ref();
    let output = output.as_ref();
    let started = Instant::now();

    options.cancel.check()?;
    let read = read_pages(input, &options.read_options())?;
    let page_count = read.pages.len() as u32;
    let warnings = read.warnings.clone();
    let doc = build_from_read(read, options)?;

    options.cancel.check()?;
    let (bytes, report) = write_document(&doc, options)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            Error::WriteFailure(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(output, &bytes)
        .map_err(|e| Error::WriteFailure(format!("cannot write {}: {}", output.display(), e)))?;

    let stats = ConversionStats::from_document(&doc, page_count)
        .with_output(bytes.len(), started.elapsed());
    log::info!(
        "{} -> {}: {} pages, {} paragraphs, {} tables, {} images, {} fidelity notes in {} ms",
        input.display(),
        output.display(),
        stats.page_count,
        stats.paragraph_count,
        stats.table_count,
        stats.image_count,
        report.len(),
        stats.elapsed_ms
    );

    Ok(ConversionResult {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        report,
        warnings,
        stats,
        error: None,
    })
}

/// Read and lay out a PDF without writing anything.
pub fn build_flow_document<P: AsRef<Path>>(
    input: P,
    options: &ConvertOptions,
) -> Result<FlowDocument> {
    options.cancel.check()?;
    let read = read_pages(input, &options.read_options())?;
    build_from_read(read, options)
}

/// [`build_flow_document`] for an in-memory PDF.
pub fn build_flow_document_from_bytes(data: &[u8], options: &ConvertOptions) -> Result<FlowDocument> {
    options.cancel.check()?;
    let read = read_pages_from_bytes(data, &options.read_options())?;
    build_from_read(read, options)
}

fn build_from_read(read: ReadDocument, options: &ConvertOptions) -> Result<FlowDocument> {
    options.cancel.check()?;
    let layouts = structure_pages(
        &read.pages,
        &options.layout,
        options.table_detection,
        options.parallel,
        &options.cancel,
    )?;
    Ok(FlowBuilder::new(&options.layout)
        .column_detection(options.column_detection)
        .preserve_images(options.preserve_images)
        .build(read.metadata, layouts))
}

/// Serialize a flow document to DOCX package bytes.
pub fn write_document(doc: &FlowDocument, options: &ConvertOptions) -> Result<(Vec<u8>, FidelityReport)> {
    let adapter = SerializationAdapter::new(options.image_quality, options.preserve_page_breaks);
    adapter.serialize(doc, &mut DocxSink::new())
}
