//! Statistics over a reconstructed document.

use serde::{Deserialize, Serialize};

use crate::model::TextDocument;

/// Statistics collected from a reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages that produced output
    pub page_count: u32,

    /// Pages skipped because decoding failed
    pub skipped_page_count: u32,

    /// Number of lines across all paragraphs
    pub line_count: u32,

    /// Number of paragraphs extracted
    pub paragraph_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect statistics from a document.
    pub fn from_document(doc: &TextDocument) -> Self {
        let mut stats = Self {
            page_count: doc.pages.len() as u32,
            skipped_page_count: doc.skipped.len() as u32,
            ..Self::default()
        };

        for paragraph in doc.pages.iter().flat_map(|p| &p.paragraphs) {
            stats.paragraph_count += 1;
            stats.line_count += paragraph.lines.len() as u32;

            let text = paragraph.plain_text();
            stats.word_count += text.split_whitespace().count() as u32;
            stats.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Line, PageText, Paragraph, SkippedPage};

    #[test]
    fn test_stats_from_document() {
        let mut doc = TextDocument::new();
        let mut page = PageText::new(0);
        let mut paragraph = Paragraph::new();
        paragraph.push(Line::new("Hello world", 100.0));
        paragraph.push(Line::new("again", 88.0));
        page.add_paragraph(paragraph);
        page.add_paragraph(Paragraph::with_text("Bye"));
        doc.add_page(page);
        doc.add_skipped(SkippedPage {
            page: 1,
            reason: "x".into(),
        });

        let stats = ExtractionStats::from_document(&doc);
        assert_eq!(stats.page_count, 1);
        assert_eq!(stats.skipped_page_count, 1);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.word_count, 4);
        assert_eq!(stats.char_count, 18);
    }
}
