//! Text reconstruction from positioned glyph runs.

mod backend;
mod layout;
mod options;
mod reconstruct;

pub use backend::{
    decode_text_simple, parse_content_stream, GlyphRunSource, LopdfGlyphSource,
    MemoryGlyphSource,
};
pub use layout::{LineClusterer, ParagraphAssembler};
pub use options::{LayoutOptions, PageSelection, ParagraphPolicy, YAxis};
pub use reconstruct::Reconstructor;
