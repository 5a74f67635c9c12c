//! Error types for docweave library.

use std::io;
use thiserror::Error;

/// Result type alias for docweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during text reconstruction or package merging.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a PDF nor a zip-based package.
    #[error("Unknown file format: not a PDF or OOXML package")]
    UnknownFormat,

    /// The PDF document itself could not be opened.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The zip container or one of its entries could not be read.
    #[error("Corrupted package: {0}")]
    PackageCorrupt(String),

    /// A part required from the master package does not exist.
    #[error("Part not found in package: {0}")]
    PartNotFound(String),

    /// A part exists but is not valid UTF-8 text.
    #[error("Part is not valid UTF-8: {0}")]
    PartEncoding(String),

    /// The expected open/close tag pair is absent from a part.
    #[error("Fragment delimiters not found: {open} ... {close}")]
    FragmentNotFound {
        /// Open tag that was searched for
        open: String,
        /// Close tag that was searched for
        close: String,
    },

    /// The master body has no closing tag to splice before.
    #[error("Body close tag not found in master part: {0}")]
    BodyCloseTagNotFound(String),

    /// Decoding glyph runs for one page failed.
    #[error("Failed to decode page {page}: {reason}")]
    DecodeFailure {
        /// Zero-based page index
        page: usize,
        /// Underlying cause
        reason: String,
    },

    /// Layout or merge options are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation was cancelled between pages or inputs.
    #[error("Operation cancelled")]
    Cancelled,

    /// Error during rendering (text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::PackageCorrupt(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl Error {
    /// Whether this error only concerns a single page or input and can be
    /// recorded as a skip instead of aborting the whole operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PackageCorrupt(_)
                | Error::FragmentNotFound { .. }
                | Error::PartEncoding(_)
                | Error::DecodeFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");

        let err = Error::DecodeFailure {
            page: 3,
            reason: "bad stream".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to decode page 3: bad stream");

        let err = Error::FragmentNotFound {
            open: "<w:body".to_string(),
            close: "</w:body>".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fragment delimiters not found: <w:body ... </w:body>"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_is_package_corrupt() {
        let err: Error = zip::result::ZipError::InvalidArchive("bad".into()).into();
        assert!(matches!(err, Error::PackageCorrupt(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_master_level_errors_are_not_recoverable() {
        assert!(!Error::BodyCloseTagNotFound("</w:body>".into()).is_recoverable());
        assert!(!Error::PartNotFound("word/document.xml".into()).is_recoverable());
        assert!(!Error::Cancelled.is_recoverable());
    }
}
