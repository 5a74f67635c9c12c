//! Document-level types.

use super::PageText;
use serde::{Deserialize, Serialize};

/// The result of reconstructing text from a sequence of pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextDocument {
    /// Successfully decoded pages in ascending index order
    pub pages: Vec<PageText>,

    /// Pages whose glyph runs could not be decoded
    pub skipped: Vec<SkippedPage>,
}

impl TextDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: PageText) {
        self.pages.push(page);
    }

    /// Record a page that was skipped.
    pub fn add_skipped(&mut self, skipped: SkippedPage) {
        self.skipped.push(skipped);
    }

    /// Number of pages that produced output.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of paragraphs across all pages.
    pub fn paragraph_count(&self) -> usize {
        self.pages.iter().map(|p| p.paragraphs.len()).sum()
    }

    /// Whether every page decoded cleanly.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A page left out of the reconstruction, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPage {
    /// Zero-based page index
    pub page: usize,

    /// Why the page was skipped
    pub reason: String,
}

impl std::fmt::Display for SkippedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page {}: {}", self.page + 1, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn test_document_counts() {
        let mut doc = TextDocument::new();
        let mut page = PageText::new(0);
        page.add_paragraph(Paragraph::with_text("a"));
        page.add_paragraph(Paragraph::with_text("b"));
        doc.add_page(page);
        doc.add_page(PageText::new(1));

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.paragraph_count(), 2);
        assert!(doc.is_complete());

        doc.add_skipped(SkippedPage {
            page: 2,
            reason: "bad stream".into(),
        });
        assert!(!doc.is_complete());
        assert_eq!(doc.skipped[0].to_string(), "page 3: bad stream");
    }
}
