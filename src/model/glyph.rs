//! Positioned glyph runs and the lines built from them.

use serde::{Deserialize, Serialize};

/// A contiguous span of decoded text at a single position on a page.
///
/// Coordinates are in the source's own units and axis convention; the
/// layout stage is told which direction "up" is through
/// [`YAxis`](crate::parser::YAxis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRun {
    /// The decoded text
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Effective font size
    pub font_size: f32,
    /// Zero-based index of the page the run was decoded from
    pub page_index: usize,
}

impl GlyphRun {
    /// Create a run with a default 12pt font size.
    pub fn new(text: impl Into<String>, x: f32, y: f32, page_index: usize) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font_size: 12.0,
            page_index,
        }
    }

    /// Set the font size.
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Whether the run carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Glyph runs judged co-linear, joined left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Run texts joined with single spaces
    pub text: String,
    /// Y position of the run that opened the line
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Number of runs merged into this line
    pub run_count: usize,
}

impl Line {
    /// Create a line from text and its vertical position.
    pub fn new(text: impl Into<String>, y: f32) -> Self {
        Self {
            text: text.into(),
            y,
            x: 0.0,
            run_count: 1,
        }
    }

    /// Whether the line is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_run_defaults() {
        let run = GlyphRun::new("Hello", 10.0, 100.0, 0);
        assert_eq!(run.font_size, 12.0);
        assert!(!run.is_blank());

        let run = GlyphRun::new("  ", 10.0, 100.0, 0).with_font_size(9.0);
        assert_eq!(run.font_size, 9.0);
        assert!(run.is_blank());
    }

    #[test]
    fn test_line_blank() {
        assert!(Line::new("", 0.0).is_blank());
        assert!(Line::new(" \t", 0.0).is_blank());
        assert!(!Line::new("x", 0.0).is_blank());
    }
}
