//! Data model shared by the text reconstruction pipeline.
//!
//! Glyph runs come in from a decoder, lines and paragraphs come out of the
//! layout stage, and a [`TextDocument`] gathers them per page together with
//! any pages that had to be skipped.

mod document;
mod glyph;
mod page;
mod paragraph;

pub use document::{SkippedPage, TextDocument};
pub use glyph::{GlyphRun, Line};
pub use page::PageText;
pub use paragraph::Paragraph;
