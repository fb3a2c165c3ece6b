//! Error types for pdfword.

use std::io;
use thiserror::Error;

/// Result type alias for pdfword operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source cannot be parsed: not a PDF, corrupted, or encrypted.
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    /// A primitive with no flow-document equivalent.
    #[error("Unsupported primitive: {0}")]
    UnsupportedPrimitive(String),

    /// A table region failed grid consistency checks.
    #[error("Table inconsistency: {0}")]
    TableInconsistency(String),

    /// The destination document cannot be produced.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Invalid caller-supplied argument (path, option, config file).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Page range that cannot be parsed.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// The job was cancelled at a page boundary.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts the pipeline of the affected file.
    ///
    /// `UnsupportedPrimitive` and `TableInconsistency` are recovered inside
    /// the pipeline and only ever surface as fidelity notes.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::UnsupportedPrimitive(_) | Error::TableInconsistency(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => {
                Error::UnreadableDocument("document is encrypted".to_string())
            }
            _ => Error::UnreadableDocument(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnreadableDocument("document is encrypted".into());
        assert_eq!(err.to_string(), "Unreadable document: document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_recovered_errors_are_not_fatal() {
        assert!(!Error::TableInconsistency("open grid".into()).is_fatal());
        assert!(!Error::UnsupportedPrimitive("shading".into()).is_fatal());
        assert!(Error::WriteFailure("disk full".into()).is_fatal());
        assert!(Error::Cancelled.is_fatal());
    }
}
