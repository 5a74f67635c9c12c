//! # docweave
//!
//! Positional text reconstruction and OOXML package merging.
//!
//! Two independent pipelines live in this crate:
//!
//! - **Text reconstruction** turns positioned glyph runs, as decoded from a
//!   PDF page, into lines and paragraphs in reading order.
//! - **Package merging** appends the body content of several word-processing
//!   or presentation packages to a master package, splicing XML fragments
//!   as text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docweave::{reconstruct_pdf_file, LayoutOptions};
//!
//! fn main() -> docweave::Result<()> {
//!     let output = reconstruct_pdf_file("report.pdf", &LayoutOptions::default())?;
//!     println!("{}", output.text);
//!     for skipped in &output.skipped {
//!         eprintln!("skipped {}", skipped);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ```no_run
//! use docweave::{merge_files, MergeOptions};
//!
//! let output = merge_files("master.docx", &["a.docx", "b.docx"], &MergeOptions::wordprocessing())?;
//! std::fs::write("merged.docx", &output.bytes)?;
//! # Ok::<(), docweave::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Explicit layout configuration**: line threshold, paragraph gap and
//!   y-axis direction are options, not constants
//! - **Two paragraph policies**: one paragraph per line, or vertical gaps as
//!   paragraph boundaries
//! - **Partial success**: undecodable pages and unusable input packages are
//!   skipped and reported, never silently dropped
//! - **Parallel decoding**: pages decode on the rayon pool and are emitted
//!   in page order
//! - **Byte-preserving packages**: parts a merge does not touch are copied
//!   without re-encoding
//! - **Lossy sanitization**: images, embedded objects and relationship ids are
//!   removed from appended content so the merged package stays valid

pub mod cancel;
pub mod detect;
pub mod error;
pub mod model;
pub mod package;
pub mod parser;
pub mod render;

pub use cancel::CancelFlag;
pub use detect::{
    detect_format_from_bytes, detect_format_from_path, is_package_bytes, is_pdf_bytes,
    InputFormat, PackageKind, PdfFormat,
};
pub use error::{Error, Result};
pub use model::{GlyphRun, Line, PageText, Paragraph, SkippedPage, TextDocument};
pub use package::{
    BodyTags, MergeJob, MergeOptions, MergeOutput, Package, PackageInput, SanitizeRules,
    SkipReason, SkippedInput,
};
pub use parser::{
    GlyphRunSource, LayoutOptions, LopdfGlyphSource, MemoryGlyphSource, PageSelection,
    ParagraphPolicy, Reconstructor, YAxis,
};
pub use render::{ExtractionStats, JsonFormat, RenderOptions};

use std::path::Path;

/// Reconstructed text with the pages that could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOutput {
    pub text: String,
    pub skipped: Vec<SkippedPage>,
}

impl TextOutput {
    fn from_document(document: &TextDocument, options: &RenderOptions) -> Self {
        Self {
            text: render::to_text(document, options),
            skipped: document.skipped.clone(),
        }
    }
}

/// Reconstruct the text of every selected page of `source`.
///
/// Paragraphs are separated by a newline and pages by a blank line.
///
/// # Example
///
/// ```
/// use docweave::{reconstruct_text, GlyphRun, LayoutOptions, MemoryGlyphSource};
///
/// let source = MemoryGlyphSource::from_pages(vec![vec![
///     GlyphRun::new("Hello", 10.0, 100.0, 0),
///     GlyphRun::new("World", 50.0, 100.0, 0),
///     GlyphRun::new("Next", 10.0, 88.0, 0),
/// ]]);
/// let options = LayoutOptions::new().line_is_paragraph();
/// let output = reconstruct_text(&source, &options).unwrap();
/// assert_eq!(output.text, "Hello World\nNext");
/// ```
pub fn reconstruct_text<S: GlyphRunSource + ?Sized>(
    source: &S,
    options: &LayoutOptions,
) -> Result<TextOutput> {
    let document = reconstruct_document(source, options)?;
    Ok(TextOutput::from_document(&document, &RenderOptions::default()))
}

/// Reconstruct `source` into pages, paragraphs and lines.
pub fn reconstruct_document<S: GlyphRunSource + ?Sized>(
    source: &S,
    options: &LayoutOptions,
) -> Result<TextDocument> {
    Reconstructor::new(options.clone())?.reconstruct(source)
}

/// Reconstruct the text of a PDF held in memory.
pub fn reconstruct_pdf_bytes(data: &[u8], options: &LayoutOptions) -> Result<TextOutput> {
    if !is_pdf_bytes(data) {
        return Err(Error::UnknownFormat);
    }
    let source = LopdfGlyphSource::load_bytes(data)?;
    reconstruct_text(&source, options)
}

/// Reconstruct the text of a PDF file.
pub fn reconstruct_pdf_file<P: AsRef<Path>>(path: P, options: &LayoutOptions) -> Result<TextOutput> {
    let data = std::fs::read(path)?;
    reconstruct_pdf_bytes(&data, options)
}

/// Merge the bodies of `additions` into `master`.
///
/// See [`package::merge_packages`].
pub fn merge_packages(
    master: &[u8],
    additions: &[PackageInput],
    options: &MergeOptions,
) -> Result<MergeOutput> {
    package::merge_packages(master, additions, options)
}

/// Merge package files. Additions are named by their file name.
///
/// See [`package::merge_files`].
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(
    master: P,
    additions: &[Q],
    options: &MergeOptions,
) -> Result<MergeOutput> {
    package::merge_files(master, additions, options)
}

/// Builder for text reconstruction and package merging.
///
/// # Example
///
/// ```no_run
/// use docweave::{Docweave, PageSelection};
///
/// let text = Docweave::new()
///     .line_is_paragraph()
///     .with_y_threshold(3.0)
///     .with_pages(PageSelection::Range(1..=3))
///     .parallel()
///     .reconstruct_pdf_file("report.pdf")?
///     .to_text();
/// # Ok::<(), docweave::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Docweave {
    layout: LayoutOptions,
    render: RenderOptions,
    merge: MergeOptions,
}

impl Docweave {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all layout options.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Set the paragraph policy.
    pub fn with_policy(mut self, policy: ParagraphPolicy) -> Self {
        self.layout = self.layout.with_policy(policy);
        self
    }

    /// Treat every line as its own paragraph.
    pub fn line_is_paragraph(mut self) -> Self {
        self.layout = self.layout.line_is_paragraph();
        self
    }

    /// Set the line clustering threshold.
    pub fn with_y_threshold(mut self, threshold: f32) -> Self {
        self.layout = self.layout.with_y_threshold(threshold);
        self
    }

    /// Set the paragraph gap threshold.
    pub fn with_paragraph_gap(mut self, gap: f32) -> Self {
        self.layout = self.layout.with_paragraph_gap(gap);
        self
    }

    /// Set the y-axis direction of the glyph source.
    pub fn with_y_axis(mut self, axis: YAxis) -> Self {
        self.layout = self.layout.with_y_axis(axis);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.layout = self.layout.with_pages(pages);
        self
    }

    /// Decode pages in parallel.
    pub fn parallel(mut self) -> Self {
        self.layout = self.layout.with_parallel(true);
        self
    }

    /// Set render options.
    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    /// Set merge options.
    pub fn with_merge_options(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }

    /// Share one cancellation flag between reconstruction and merging.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.layout = self.layout.with_cancel(cancel.clone());
        self.merge = self.merge.with_cancel(cancel);
        self
    }

    /// Reconstruct any glyph source.
    pub fn reconstruct<S: GlyphRunSource + ?Sized>(&self, source: &S) -> Result<DocweaveResult> {
        let document = reconstruct_document(source, &self.layout)?;
        Ok(DocweaveResult {
            document,
            render_options: self.render.clone(),
        })
    }

    /// Reconstruct a PDF from bytes.
    pub fn reconstruct_pdf_bytes(&self, data: &[u8]) -> Result<DocweaveResult> {
        if !is_pdf_bytes(data) {
            return Err(Error::UnknownFormat);
        }
        self.reconstruct(&LopdfGlyphSource::load_bytes(data)?)
    }

    /// Reconstruct a PDF file.
    pub fn reconstruct_pdf_file<P: AsRef<Path>>(&self, path: P) -> Result<DocweaveResult> {
        self.reconstruct_pdf_bytes(&std::fs::read(path)?)
    }

    /// Merge packages held in memory.
    pub fn merge(&self, master: &[u8], additions: &[PackageInput]) -> Result<MergeOutput> {
        package::merge_packages(master, additions, &self.merge)
    }

    /// Merge package files.
    pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        master: P,
        additions: &[Q],
    ) -> Result<MergeOutput> {
        merge_files(master, additions, &self.merge)
    }
}

/// Result of a reconstruction through [`Docweave`].
#[derive(Debug, Clone)]
pub struct DocweaveResult {
    /// The reconstructed document
    pub document: TextDocument,
    render_options: RenderOptions,
}

impl DocweaveResult {
    /// Convert to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Text plus skipped pages.
    pub fn into_output(self) -> TextOutput {
        TextOutput::from_document(&self.document, &self.render_options)
    }

    /// Counts over the document.
    pub fn stats(&self) -> ExtractionStats {
        ExtractionStats::from_document(&self.document)
    }

    /// Get the document.
    pub fn document(&self) -> &TextDocument {
        &self.document
    }
}
