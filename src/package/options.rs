//! Merge configuration.

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};

use super::sanitize::SanitizeRules;

/// Open/close delimiters of the body element whose content is merged.
///
/// `open` is a tag prefix such as `<w:body`, matched up to the end of the
/// tag so attributes are allowed. `close` is the full closing tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyTags {
    pub open: String,
    pub close: String,
}

impl BodyTags {
    /// Tags from an explicit open prefix and close tag.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Tags for an element by qualified name, e.g. `BodyTags::element("w:body")`.
    pub fn element(qname: &str) -> Self {
        Self::new(format!("<{}", qname), format!("</{}>", qname))
    }
}

/// Options for merging OOXML packages.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Part whose body is merged, e.g. `word/document.xml`
    pub part_path: String,

    /// Body element delimiters
    pub tags: BodyTags,

    /// Markup inserted before every appended fragment
    pub separator: String,

    /// What to strip from fragments before splicing
    pub sanitize: SanitizeRules,

    /// Checked between inputs
    pub cancel: Option<CancelFlag>,
}

/// Paragraph holding a single page break.
pub const PAGE_BREAK_PARAGRAPH: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

impl MergeOptions {
    /// Options for an arbitrary part and body element. No separator.
    pub fn new(part_path: impl Into<String>, tags: BodyTags) -> Self {
        Self {
            part_path: part_path.into(),
            tags,
            separator: String::new(),
            sanitize: SanitizeRules::default(),
            cancel: None,
        }
    }

    /// Word-processing documents: append bodies of `word/document.xml`,
    /// each after a page break.
    pub fn wordprocessing() -> Self {
        Self {
            separator: PAGE_BREAK_PARAGRAPH.to_string(),
            sanitize: SanitizeRules::wordprocessing(),
            ..Self::new("word/document.xml", BodyTags::element("w:body"))
        }
    }

    /// Presentations: append the shape trees of each first slide into the
    /// master's first slide.
    pub fn presentation() -> Self {
        Self {
            sanitize: SanitizeRules::presentation(),
            ..Self::new("ppt/slides/slide1.xml", BodyTags::element("p:spTree"))
        }
    }

    /// Set the part whose body is merged.
    pub fn with_part_path(mut self, part_path: impl Into<String>) -> Self {
        self.part_path = part_path.into();
        self
    }

    /// Set the body element delimiters.
    pub fn with_tags(mut self, tags: BodyTags) -> Self {
        self.tags = tags;
        self
    }

    /// Set the markup inserted before each appended fragment.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the sanitization rules. [`SanitizeRules::none`] disables it.
    pub fn with_sanitize_rules(mut self, rules: SanitizeRules) -> Self {
        self.sanitize = rules;
        self
    }

    /// Set a cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Reject empty part paths and tags.
    pub fn validate(&self) -> Result<()> {
        if self.part_path.is_empty() {
            return Err(Error::InvalidConfig("part path must not be empty".into()));
        }
        if self.tags.open.is_empty() || self.tags.close.is_empty() {
            return Err(Error::InvalidConfig(
                "body open and close tags must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::wordprocessing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_tags_element() {
        let tags = BodyTags::element("w:body");
        assert_eq!(tags.open, "<w:body");
        assert_eq!(tags.close, "</w:body>");
    }

    #[test]
    fn test_presets() {
        let docx = MergeOptions::wordprocessing();
        assert_eq!(docx.part_path, "word/document.xml");
        assert_eq!(docx.separator, PAGE_BREAK_PARAGRAPH);

        let pptx = MergeOptions::presentation();
        assert_eq!(pptx.part_path, "ppt/slides/slide1.xml");
        assert_eq!(pptx.tags, BodyTags::element("p:spTree"));
        assert!(pptx.separator.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(MergeOptions::default().validate().is_ok());
        assert!(MergeOptions::default().with_part_path("").validate().is_err());
        assert!(MergeOptions::default()
            .with_tags(BodyTags::new("", "</x>"))
            .validate()
            .is_err());
    }
}
