//! Input format detection.

use crate::error::{Error, Result};
use crate::package::MergeOptions;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Kind of input recognized from its leading bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    /// A PDF document
    Pdf(PdfFormat),
    /// A zip container, assumed to be an OOXML package
    Package,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Pdf(pdf) => write!(f, "{}", pdf),
            InputFormat::Package => write!(f, "OOXML package"),
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Local file header signature that starts every zip archive with entries.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// End-of-central-directory signature; an empty archive starts with it.
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";

const HEADER_LEN: u64 = 16;

/// Detect the format of a file from its first bytes.
///
/// # Example
/// ```no_run
/// use docweave::detect::{detect_format_from_path, InputFormat};
///
/// match detect_format_from_path("report.pdf").unwrap() {
///     InputFormat::Pdf(pdf) => println!("PDF version: {}", pdf.version),
///     InputFormat::Package => println!("OOXML package"),
/// }
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    BufReader::new(file).take(HEADER_LEN).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format of a byte buffer.
///
/// Only the first few bytes are inspected. Returns
/// [`Error::UnknownFormat`] for anything that is neither a PDF nor a zip.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<InputFormat> {
    if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
        return Ok(InputFormat::Package);
    }
    detect_pdf(data).map(InputFormat::Pdf)
}

fn detect_pdf(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    // Extract version string (e.g., "1.7" from "%PDF-1.7")
    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnknownFormat);
    }

    Ok(PdfFormat { version })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf(data).is_ok()
}

/// Check if bytes start with a zip signature.
pub fn is_package_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Package))
}

/// Kind of office document held by an OOXML package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    Wordprocessing,
    Presentation,
    Spreadsheet,
    Unknown,
}

impl PackageKind {
    /// Merge preset for this kind, if merging is supported.
    pub fn merge_options(self) -> Option<MergeOptions> {
        match self {
            PackageKind::Wordprocessing => Some(MergeOptions::wordprocessing()),
            PackageKind::Presentation => Some(MergeOptions::presentation()),
            PackageKind::Spreadsheet | PackageKind::Unknown => None,
        }
    }
}

impl std::fmt::Display for PackageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PackageKind::Wordprocessing => "word-processing document",
            PackageKind::Presentation => "presentation",
            PackageKind::Spreadsheet => "spreadsheet",
            PackageKind::Unknown => "unknown package",
        };
        f.write_str(name)
    }
}

const MAIN_CONTENT_TYPES: &[(&str, PackageKind)] = &[
    ("wordprocessingml.document.main+xml", PackageKind::Wordprocessing),
    ("wordprocessingml.template.main+xml", PackageKind::Wordprocessing),
    ("presentationml.presentation.main+xml", PackageKind::Presentation),
    ("presentationml.slideshow.main+xml", PackageKind::Presentation),
    ("presentationml.template.main+xml", PackageKind::Presentation),
    ("spreadsheetml.sheet.main+xml", PackageKind::Spreadsheet),
    ("spreadsheetml.template.main+xml", PackageKind::Spreadsheet),
];

/// Classify a package from the text of its `[Content_Types].xml`.
pub fn package_kind(content_types: &str) -> PackageKind {
    MAIN_CONTENT_TYPES
        .iter()
        .find(|(needle, _)| content_types.contains(needle))
        .map_or(PackageKind::Unknown, |(_, kind)| *kind)
}
