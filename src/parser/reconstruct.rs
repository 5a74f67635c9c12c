//! Page-by-page text reconstruction.

use rayon::prelude::*;

use crate::cancel::checkpoint;
use crate::error::{Error, Result};
use crate::model::{GlyphRun, PageText, SkippedPage, TextDocument};

use super::backend::GlyphRunSource;
use super::layout::{LineClusterer, ParagraphAssembler};
use super::options::LayoutOptions;

/// Drives decode → cluster → assemble over the pages of a source.
///
/// Pages are always emitted in ascending index order. With
/// `parallel` enabled only the decoding step runs on the rayon pool; the
/// results are collected back into page order before any paragraph is
/// assembled. A page whose decode fails is recorded in
/// [`TextDocument::skipped`] and the remaining pages continue.
///
/// The full decoded text of every selected page is held in memory at once.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    options: LayoutOptions,
    clusterer: LineClusterer,
    assembler: ParagraphAssembler,
}

impl Reconstructor {
    /// Create a reconstructor, validating the options.
    pub fn new(options: LayoutOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            clusterer: LineClusterer::from_options(&options),
            assembler: ParagraphAssembler::from_options(&options),
            options,
        })
    }

    /// The options in effect.
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Reconstruct every selected page of `source`.
    ///
    /// Only cancellation aborts the whole run; per-page failures become
    /// skips.
    pub fn reconstruct<S: GlyphRunSource + ?Sized>(&self, source: &S) -> Result<TextDocument> {
        let cancel = self.options.cancel.as_ref();
        let indices: Vec<usize> = (0..source.page_count())
            .filter(|&i| self.options.pages.includes_index(i))
            .collect();

        log::debug!(
            "Reconstructing {} of {} pages ({})",
            indices.len(),
            source.page_count(),
            if self.options.parallel {
                "parallel"
            } else {
                "sequential"
            }
        );

        let mut document = TextDocument::new();

        if self.options.parallel {
            checkpoint(cancel)?;
            let decoded: Vec<(usize, Result<Vec<GlyphRun>>)> = indices
                .par_iter()
                .map(|&index| {
                    let result = checkpoint(cancel).and_then(|_| source.decode_page(index));
                    (index, result)
                })
                .collect();

            for (index, result) in decoded {
                checkpoint(cancel)?;
                self.absorb(&mut document, index, result)?;
            }
        } else {
            for index in indices {
                checkpoint(cancel)?;
                let result = source.decode_page(index);
                self.absorb(&mut document, index, result)?;
            }
        }

        Ok(document)
    }

    /// Cluster and assemble the runs of one page.
    pub fn reconstruct_page(&self, index: usize, runs: &[GlyphRun]) -> PageText {
        let lines = self.clusterer.cluster(runs);
        let line_count = lines.len();
        let paragraphs = self.assembler.assemble(lines);

        log::debug!(
            "Page {}: {} runs, {} lines, {} paragraphs",
            index + 1,
            runs.len(),
            line_count,
            paragraphs.len()
        );

        PageText { index, paragraphs }
    }

    fn absorb(
        &self,
        document: &mut TextDocument,
        index: usize,
        result: Result<Vec<GlyphRun>>,
    ) -> Result<()> {
        match result {
            Ok(runs) => {
                document.add_page(self.reconstruct_page(index, &runs));
                Ok(())
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(err) => {
                log::warn!("Skipping page {}: {}", index + 1, err);
                let reason = match err {
                    Error::DecodeFailure { reason, .. } => reason,
                    other => other.to_string(),
                };
                document.add_skipped(SkippedPage {
                    page: index,
                    reason,
                });
                Ok(())
            }
        }
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            clusterer: LineClusterer::from_options(&options),
            assembler: ParagraphAssembler::from_options(&options),
            options,
        }
    }
}
