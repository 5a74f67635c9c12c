//! Layout options and configuration.

use std::ops::RangeInclusive;

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};

/// Direction of the source's vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YAxis {
    /// Larger y is visually higher (PDF user space, origin bottom-left).
    #[default]
    Up,
    /// Larger y is visually lower (screen space, origin top-left).
    Down,
}

/// How lines are grouped into paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphPolicy {
    /// Every non-blank line is its own paragraph.
    LineIsParagraph,
    /// Lines are joined until a large vertical gap or a blank line.
    #[default]
    GapIsBoundary,
}

/// Options for reconstructing text from glyph runs.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Maximum vertical distance between runs on the same line
    pub y_threshold: f32,

    /// Axis direction of the glyph source
    pub y_axis: YAxis,

    /// Vertical gap between lines that starts a new paragraph
    pub paragraph_gap: f32,

    /// Paragraph grouping policy
    pub policy: ParagraphPolicy,

    /// Page selection (which pages to reconstruct)
    pub pages: PageSelection,

    /// Whether to decode pages on the rayon pool
    pub parallel: bool,

    /// Cancellation flag checked between pages
    pub cancel: Option<CancelFlag>,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line clustering threshold.
    pub fn with_y_threshold(mut self, threshold: f32) -> Self {
        self.y_threshold = threshold;
        self
    }

    /// Set the axis direction.
    pub fn with_y_axis(mut self, axis: YAxis) -> Self {
        self.y_axis = axis;
        self
    }

    /// Set the paragraph gap threshold.
    pub fn with_paragraph_gap(mut self, gap: f32) -> Self {
        self.paragraph_gap = gap;
        self
    }

    /// Set the paragraph policy.
    pub fn with_policy(mut self, policy: ParagraphPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// One paragraph per line.
    pub fn line_is_paragraph(mut self) -> Self {
        self.policy = ParagraphPolicy::LineIsParagraph;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable parallel page decoding.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Attach a cancellation flag.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Reject thresholds that cannot produce a meaningful layout.
    pub fn validate(&self) -> Result<()> {
        if !self.y_threshold.is_finite() || self.y_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "y_threshold must be a non-negative number, got {}",
                self.y_threshold
            )));
        }
        if !self.paragraph_gap.is_finite() || self.paragraph_gap < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "paragraph_gap must be a non-negative number, got {}",
                self.paragraph_gap
            )));
        }
        if self.policy == ParagraphPolicy::GapIsBoundary && self.paragraph_gap < self.y_threshold {
            return Err(Error::InvalidConfig(format!(
                "paragraph_gap ({}) must not be smaller than y_threshold ({})",
                self.paragraph_gap, self.y_threshold
            )));
        }
        Ok(())
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            y_threshold: 5.0,
            y_axis: YAxis::Up,
            paragraph_gap: 15.0,
            policy: ParagraphPolicy::GapIsBoundary,
            pages: PageSelection::All,
            parallel: false,
            cancel: None,
        }
    }
}

/// Page selection for reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

/// Upper bound on the pages a comma-separated list may expand to.
const MAX_LISTED_PAGES: usize = 100_000;

impl PageSelection {
    /// Check if a page number (1-indexed) should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Check if a zero-based page index should be included.
    pub fn includes_index(&self, index: usize) -> bool {
        u32::try_from(index + 1).is_ok_and(|page| self.includes(page))
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                if start > end {
                    return Err(format!("Range start {} is after end {}", start, end));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                if start > end {
                    return Err(format!("Range start {} is after end {}", start, end));
                }
                let span = ((end - start) as usize).saturating_add(1);
                if pages.len().saturating_add(span) > MAX_LISTED_PAGES {
                    return Err(format!(
                        "Page list expands to more than {} pages",
                        MAX_LISTED_PAGES
                    ));
                }
                pages.extend(start..=end);
            } else {
                let p: u32 = part.parse().map_err(|_| "Invalid page number")?;
                pages.push(p);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_options_builder() {
        let options = LayoutOptions::new()
            .with_y_threshold(10.0)
            .with_y_axis(YAxis::Down)
            .with_paragraph_gap(20.0)
            .line_is_paragraph()
            .with_parallel(true);

        assert_eq!(options.y_threshold, 10.0);
        assert_eq!(options.y_axis, YAxis::Down);
        assert_eq!(options.paragraph_gap, 20.0);
        assert_eq!(options.policy, ParagraphPolicy::LineIsParagraph);
        assert!(options.parallel);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = LayoutOptions::default();
        assert_eq!(options.y_threshold, 5.0);
        assert_eq!(options.y_axis, YAxis::Up);
        assert_eq!(options.policy, ParagraphPolicy::GapIsBoundary);
        assert!(!options.parallel);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let nan = LayoutOptions::new().with_y_threshold(f32::NAN);
        assert!(matches!(nan.validate(), Err(Error::InvalidConfig(_))));

        let negative = LayoutOptions::new().with_paragraph_gap(-1.0);
        assert!(matches!(negative.validate(), Err(Error::InvalidConfig(_))));

        let inverted = LayoutOptions::new()
            .with_y_threshold(10.0)
            .with_paragraph_gap(5.0);
        assert!(matches!(inverted.validate(), Err(Error::InvalidConfig(_))));

        // The gap is irrelevant when every line is a paragraph.
        let strict = inverted.line_is_paragraph();
        assert!(strict.validate().is_ok());
    }

    #[test]
    fn test_page_selection_includes() {
        let all = PageSelection::All;
        assert!(all.includes(1));
        assert!(all.includes_index(99));

        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));
        assert!(range.includes_index(4));
        assert!(!range.includes_index(3));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
        assert!(pages.includes(3));
    }

    #[test]
    fn test_page_selection_parse() {
        let all = PageSelection::parse("all").unwrap();
        assert!(matches!(all, PageSelection::All));

        let range = PageSelection::parse("1-10").unwrap();
        assert_eq!(range, PageSelection::Range(1..=10));

        let mixed = PageSelection::parse("1,3,5-7,10,3").unwrap();
        assert_eq!(mixed, PageSelection::Pages(vec![1, 3, 5, 6, 7, 10]));

        assert!(PageSelection::parse("10-1").is_err());
        assert!(PageSelection::parse("x").is_err());
    }

    #[test]
    fn test_page_list_ranges_are_checked() {
        assert!(PageSelection::parse("1,9-3").is_err());
        assert!(PageSelection::parse("1,1-4294967295").is_err());

        let wide = PageSelection::parse("1-99999,100000").unwrap();
        assert!(matches!(wide, PageSelection::Pages(ref p) if p.len() == 100_000));
    }
}
