//! Rendering options.

/// Options for turning a reconstructed document into text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Inserted between paragraphs of the same page
    pub paragraph_separator: String,

    /// Inserted between pages
    pub page_separator: String,

    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paragraph separator.
    pub fn with_paragraph_separator(mut self, separator: impl Into<String>) -> Self {
        self.paragraph_separator = separator.into();
        self
    }

    /// Set the page separator.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Enable or disable NFC normalization.
    pub fn with_normalize_unicode(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            paragraph_separator: "\n".to_string(),
            page_separator: "\n\n".to_string(),
            normalize_unicode: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_paragraph_separator("\n\n")
            .with_page_separator("\u{000C}")
            .with_normalize_unicode(false);

        assert_eq!(options.paragraph_separator, "\n\n");
        assert_eq!(options.page_separator, "\u{000C}");
        assert!(!options.normalize_unicode);
    }
}
