//! Glyph run sources.
//!
//! The layout stage never touches a PDF library directly. It consumes
//! [`GlyphRunSource`], which yields positioned runs per page in a stated
//! coordinate convention. [`LopdfGlyphSource`] is the bundled implementation
//! over `lopdf`; [`MemoryGlyphSource`] serves runs that were decoded
//! elsewhere.

use std::path::Path;

use lopdf::{Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::GlyphRun;

/// Abstract interface for per-page glyph decoding.
///
/// Implementations must be shareable across threads so pages can be
/// decoded in parallel; decoding itself must not mutate the source.
pub trait GlyphRunSource: Sync {
    /// Number of pages available.
    fn page_count(&self) -> usize;

    /// Decode the glyph runs of one page (zero-based index).
    ///
    /// Runs are returned in content-stream order, which is the tie-break
    /// order for runs at identical positions.
    fn decode_page(&self, index: usize) -> Result<Vec<GlyphRun>>;
}

impl<T: GlyphRunSource + ?Sized> GlyphRunSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn decode_page(&self, index: usize) -> Result<Vec<GlyphRun>> {
        (**self).decode_page(index)
    }
}

/// Glyph runs held in memory, one entry per page.
///
/// A page may be stored as a failure, which is reported as a
/// [`Error::DecodeFailure`] when the page is requested.
#[derive(Debug, Clone, Default)]
pub struct MemoryGlyphSource {
    pages: Vec<std::result::Result<Vec<GlyphRun>, String>>,
}

impl MemoryGlyphSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source from already decoded pages.
    pub fn from_pages(pages: Vec<Vec<GlyphRun>>) -> Self {
        Self {
            pages: pages.into_iter().map(Ok).collect(),
        }
    }

    /// Append a page of runs.
    pub fn push_page(&mut self, runs: Vec<GlyphRun>) {
        self.pages.push(Ok(runs));
    }

    /// Append a page that fails to decode.
    pub fn push_failed_page(&mut self, reason: impl Into<String>) {
        self.pages.push(Err(reason.into()));
    }
}

impl GlyphRunSource for MemoryGlyphSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn decode_page(&self, index: usize) -> Result<Vec<GlyphRun>> {
        match self.pages.get(index) {
            Some(Ok(runs)) => Ok(runs.clone()),
            Some(Err(reason)) => Err(Error::DecodeFailure {
                page: index,
                reason: reason.clone(),
            }),
            None => Err(Error::DecodeFailure {
                page: index,
                reason: format!("page index out of range ({} pages)", self.pages.len()),
            }),
        }
    }
}

/// Glyph source backed by `lopdf`.
///
/// Page content streams are pulled out of the document when the source is
/// created, so decoding needs no access to the document afterwards.
/// Positions are in PDF user space: origin bottom-left, y grows upward
/// ([`YAxis::Up`](super::YAxis::Up)). Text is decoded without font
/// encodings (UTF-16BE with BOM, then UTF-8, then Latin-1).
#[derive(Debug, Clone)]
pub struct LopdfGlyphSource {
    pages: Vec<PageContent>,
    version: String,
}

#[derive(Debug, Clone)]
struct PageContent {
    content: std::result::Result<Vec<u8>, String>,
}

impl LopdfGlyphSource {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(&doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(&doc))
    }

    /// Extract page content streams from an opened document.
    pub fn from_document(doc: &LopdfDocument) -> Self {
        let pages = doc
            .get_pages()
            .into_values()
            .map(|page_id| PageContent {
                content: doc.get_page_content(page_id).map_err(|e| e.to_string()),
            })
            .collect();

        Self {
            pages,
            version: doc.version.to_string(),
        }
    }

    /// PDF version string from the header.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl GlyphRunSource for LopdfGlyphSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn decode_page(&self, index: usize) -> Result<Vec<GlyphRun>> {
        let page = self.pages.get(index).ok_or_else(|| Error::DecodeFailure {
            page: index,
            reason: format!("page index out of range ({} pages)", self.pages.len()),
        })?;

        let content = page.content.as_ref().map_err(|reason| Error::DecodeFailure {
            page: index,
            reason: reason.clone(),
        })?;

        parse_content_stream(content, index)
    }
}

/// Walk a content stream and emit one run per text-showing operator.
pub fn parse_content_stream(content: &[u8], page_index: usize) -> Result<Vec<GlyphRun>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::DecodeFailure {
            page: page_index,
            reason: e.to_string(),
        })?;

    let mut runs = Vec::new();
    let mut font_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut in_text_block = false;

    for op in content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                matrix = TextMatrix {
                    leading: matrix.leading,
                    ..TextMatrix::default()
                };
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(get_number) {
                    font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    matrix.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        matrix.leading = -ty;
                    }
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    matrix.set(
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    );
                }
            }
            "T*" => {
                matrix.next_line();
            }
            "Tj" | "TJ" | "'" | "\"" => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line();
                }
                if !in_text_block {
                    continue;
                }

                let text = match op.operator.as_str() {
                    "TJ" => match op.operands.first() {
                        Some(Object::Array(items)) => decode_tj_array(items),
                        _ => String::new(),
                    },
                    "\"" => string_operand(op.operands.get(2)),
                    _ => string_operand(op.operands.first()),
                };

                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    runs.push(
                        GlyphRun::new(text, x, y, page_index)
                            .with_font_size(font_size * matrix.scale()),
                    );
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Decode a `TJ` array; large negative adjustments become word spaces.
fn decode_tj_array(items: &[Object]) -> String {
    // 1/1000 text space units; around 200 reads as a word gap for most fonts
    const SPACE_THRESHOLD: f32 = 200.0;

    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_text_simple(bytes)),
            Object::Integer(_) | Object::Real(_) => {
                let adjustment = -get_number(item).unwrap_or(0.0);
                let needs_space = adjustment > SPACE_THRESHOLD
                    && !combined.ends_with(' ')
                    && !combined.ends_with('\u{00A0}')
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !is_spaceless_script_char(c));
                if needs_space {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

fn string_operand(obj: Option<&Object>) -> String {
    match obj {
        Some(Object::String(bytes, _)) => decode_text_simple(bytes),
        _ => String::new(),
    }
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // CJK Unified Ideographs Extension B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
