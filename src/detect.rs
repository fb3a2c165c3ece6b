//! PDF signature sniffing.
//!
//! Runs before the object reader so that obviously wrong inputs (HTML saved
//! as `.pdf`, empty files, truncated downloads) are rejected with a clear
//! `UnreadableDocument` reason instead of a parser error.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header information of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Offset of `%PDF-` from the start of the file
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
/// Readers accept garbage before the header within the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;
const EOF_MARKER: &[u8] = b"%%EOF";
const EOF_SEARCH_WINDOW: usize = 1024;

/// Sniff the header of a file on disk.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(HEADER_SEARCH_WINDOW);
    file.take(HEADER_SEARCH_WINDOW as u64).read_to_end(&mut head)?;
    sniff_bytes(&head)
}

/// Sniff the header from the leading bytes of a file.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or_else(|| Error::UnreadableDocument("missing %PDF- signature".to_string()))?;

    let start = offset + PDF_MAGIC.len();
    let version_bytes = window
        .get(start..start + VERSION_LEN)
        .ok_or_else(|| Error::UnreadableDocument("truncated PDF header".to_string()))?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnreadableDocument(format!(
            "unsupported PDF version '{}'",
            version
        )));
    }

    Ok(PdfHeader { version, offset })
}

/// Whether the tail of the file carries an `%%EOF` marker.
///
/// A missing marker usually means a truncated download; the reader may
/// still recover the document through xref reconstruction.
pub fn has_eof_marker(data: &[u8]) -> bool {
    let tail = &data[data.len().saturating_sub(EOF_SEARCH_WINDOW)..];
    tail.windows(EOF_MARKER.len()).any(|w| w == EOF_MARKER)
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3
        && (bytes[0] == b'1' || bytes[0] == b'2')
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit()
}

/// Check if bytes start like a PDF file.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}
