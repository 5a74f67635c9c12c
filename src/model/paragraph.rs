//! Paragraph type.

use serde::{Deserialize, Serialize};

use super::Line;

/// An ordered run of lines that belong together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Lines in reading order
    pub lines: Vec<Line>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph holding a single line.
    pub fn from_line(line: Line) -> Self {
        Self { lines: vec![line] }
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::from_line(Line::new(text, 0.0))
    }

    /// Append a line.
    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    /// Text of all lines joined with single spaces.
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            let piece = line.text.trim();
            if piece.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(piece);
        }
        text
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Line::is_blank)
    }

    /// Number of lines in the paragraph.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_joins_lines() {
        let mut p = Paragraph::new();
        p.push(Line::new("The quick", 100.0));
        p.push(Line::new("brown fox", 88.0));
        assert_eq!(p.plain_text(), "The quick brown fox");
        assert_eq!(p.line_count(), 2);
    }

    #[test]
    fn test_empty_paragraph() {
        assert!(Paragraph::new().is_empty());
        assert!(Paragraph::with_text("   ").is_empty());
        assert!(!Paragraph::with_text("x").is_empty());
    }
}
