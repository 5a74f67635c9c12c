//! Rendering module for converting reconstructed documents to output formats.

mod json;
mod options;
mod result;
mod text;

pub use json::{to_json, JsonFormat};
pub use options::RenderOptions;
pub use result::ExtractionStats;
pub use text::to_text;
