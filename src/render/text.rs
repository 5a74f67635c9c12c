//! Plain text rendering for reconstructed documents.

use unicode_normalization::UnicodeNormalization;

use crate::model::TextDocument;

use super::RenderOptions;

/// Convert a document to plain text.
///
/// Pages are joined by the page separator in ascending order; paragraphs
/// within a page by the paragraph separator.
pub fn to_text(doc: &TextDocument, options: &RenderOptions) -> String {
    let output = doc
        .pages
        .iter()
        .map(|page| page.plain_text(&options.paragraph_separator))
        .collect::<Vec<_>>()
        .join(&options.page_separator);

    if options.normalize_unicode {
        output.nfc().collect()
    } else {
        output
    }
}
