//! Page-level types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// Reconstructed text of a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Zero-based page index
    pub index: usize,

    /// Paragraphs in top-to-bottom order
    pub paragraphs: Vec<Paragraph>,
}

impl PageText {
    /// Create an empty page.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            paragraphs: Vec::new(),
        }
    }

    /// Add a paragraph to the page.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Page number as shown to users (1-indexed).
    pub fn number(&self) -> u32 {
        self.index as u32 + 1
    }

    /// Check if the page produced no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// Get plain text content of the page, paragraphs joined by `separator`.
    pub fn plain_text(&self, separator: &str) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_plain_text() {
        let mut page = PageText::new(0);
        page.add_paragraph(Paragraph::with_text("First"));
        page.add_paragraph(Paragraph::with_text("Second"));
        assert_eq!(page.plain_text("\n"), "First\nSecond");
        assert_eq!(page.number(), 1);
    }
}
