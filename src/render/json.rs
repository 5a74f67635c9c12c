//! JSON rendering for reconstructed documents.

use crate::error::{Error, Result};
use crate::model::TextDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &TextDocument, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageText, Paragraph, SkippedPage};

    #[test]
    fn test_to_json_pretty() {
        let mut doc = TextDocument::new();
        let mut page = PageText::new(0);
        page.add_paragraph(Paragraph::with_text("Hello"));
        doc.add_page(page);
        doc.add_skipped(SkippedPage {
            page: 1,
            reason: "broken".into(),
        });

        let json = to_json(&doc, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"paragraphs\""));
        assert!(json.contains("Hello"));
        assert!(json.contains("\"skipped\""));
        assert!(json.contains('\n'));

        let back: TextDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_to_json_compact() {
        let mut doc = TextDocument::new();
        doc.add_page(PageText::new(0));

        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }
}
