//! Multi-package merge.
//!
//! A merge runs in four steps. The master package is opened and its body
//! part read; any failure there aborts the merge. Each addition is then
//! opened, its body fragment extracted and sanitized, and appended to an
//! ordered buffer; a failing addition is recorded as skipped and the merge
//! moves on. Finally the buffered fragments are spliced into the master
//! body in one step and the master is serialized.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cancel::checkpoint;
use crate::error::{Error, Result};

use super::archive::{read_part, Package};
use super::fragment::extract_fragment;
use super::options::MergeOptions;
use super::sanitize::FragmentSanitizer;
use super::splice::Splicer;

/// A named package to merge.
#[derive(Debug, Clone)]
pub struct PackageInput {
    /// Identifier reported in skip lists, typically a file name
    pub name: String,
    /// Raw zip bytes of the package
    pub bytes: Vec<u8>,
}

impl PackageInput {
    /// Create an input from a name and the package bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an input from disk, named after the path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(path.display().to_string(), std::fs::read(path)?))
    }
}

/// Why an addition was left out of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The input file could not be read
    Unreadable(String),
    /// The input is not a readable zip package
    PackageCorrupt(String),
    /// The input has no part at the merged path
    PartMissing(String),
    /// The merged part is not UTF-8
    PartEncoding(String),
    /// The body tags were not found in the part
    FragmentNotFound { open: String, close: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(detail) => write!(f, "cannot read file: {}", detail),
            SkipReason::PackageCorrupt(detail) => write!(f, "corrupted package: {}", detail),
            SkipReason::PartMissing(path) => write!(f, "part {} not found", path),
            SkipReason::PartEncoding(path) => write!(f, "part {} is not valid UTF-8", path),
            SkipReason::FragmentNotFound { open, close } => {
                write!(f, "body {} ... {} not found", open, close)
            }
        }
    }
}

/// An addition that was not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedInput {
    /// Name of the input as given
    pub name: String,
    /// Why it was left out
    pub reason: SkipReason,
}

impl fmt::Display for SkippedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Result of a merge.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// Serialized master package
    pub bytes: Vec<u8>,
    /// Names of merged additions, in merge order
    pub merged: Vec<String>,
    /// Additions left out, in input order
    pub skipped: Vec<SkippedInput>,
    /// Elements removed from fragments by sanitization
    pub stripped_elements: usize,
    /// Attributes removed from fragments by sanitization
    pub stripped_attributes: usize,
}

impl MergeOutput {
    /// Whether every addition was merged.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// One merge in progress.
///
/// [`open`](Self::open) loads the master, [`add`](Self::add) takes one
/// addition at a time and [`finish`](Self::finish) splices and
/// serializes. The master body is only replaced in `finish`, with a
/// fully built string.
#[derive(Debug)]
pub struct MergeJob {
    options: MergeOptions,
    sanitizer: FragmentSanitizer,
    master: Package,
    master_body: String,
    fragments: Vec<String>,
    merged: Vec<String>,
    skipped: Vec<SkippedInput>,
    stripped_elements: usize,
    stripped_attributes: usize,
}

impl MergeJob {
    /// Open the master package and read its body part.
    pub fn open(master: impl Into<Vec<u8>>, options: MergeOptions) -> Result<Self> {
        options.validate()?;

        let master = Package::open(master)?;
        let master_body = master
            .get_part(&options.part_path)?
            .ok_or_else(|| Error::PartNotFound(options.part_path.clone()))?
            .to_string();

        log::debug!(
            "Opened master with {} parts, merging into {}",
            master.part_count(),
            options.part_path
        );

        Ok(Self {
            sanitizer: FragmentSanitizer::new(options.sanitize.clone()),
            options,
            master,
            master_body,
            fragments: Vec::new(),
            merged: Vec::new(),
            skipped: Vec::new(),
            stripped_elements: 0,
            stripped_attributes: 0,
        })
    }

    /// Take one addition. Returns `false` if it was skipped.
    pub fn add(&mut self, input: &PackageInput) -> bool {
        match self.extract(input) {
            Ok(fragment) => {
                let sanitized = self.sanitizer.sanitize(&fragment);
                if !sanitized.is_untouched() {
                    log::debug!(
                        "{}: stripped {} elements and {} attributes",
                        input.name,
                        sanitized.stripped_elements,
                        sanitized.stripped_attributes
                    );
                }
                self.stripped_elements += sanitized.stripped_elements;
                self.stripped_attributes += sanitized.stripped_attributes;
                self.fragments.push(sanitized.fragment);
                self.merged.push(input.name.clone());
                true
            }
            Err(reason) => {
                log::warn!("Skipping {}: {}", input.name, reason);
                self.skipped.push(SkippedInput {
                    name: input.name.clone(),
                    reason,
                });
                false
            }
        }
    }

    /// Read an addition from disk and take it, named after its file name.
    ///
    /// A file that cannot be read is skipped with
    /// [`SkipReason::Unreadable`]. Returns `false` if it was skipped.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        let name = input_name(path);
        match std::fs::read(path) {
            Ok(bytes) => self.add(&PackageInput::new(name, bytes)),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                self.skipped.push(SkippedInput {
                    name,
                    reason: SkipReason::Unreadable(e.to_string()),
                });
                false
            }
        }
    }

    /// Additions skipped so far.
    pub fn skipped(&self) -> &[SkippedInput] {
        &self.skipped
    }

    /// Number of fragments waiting to be spliced.
    pub fn pending(&self) -> usize {
        self.fragments.len()
    }

    /// Splice all accumulated fragments and serialize the master.
    pub fn finish(mut self) -> Result<MergeOutput> {
        let splicer = Splicer::new(&self.options.tags.close, &self.options.separator);
        let body = splicer.splice(&self.master_body, &self.fragments)?;

        if !self.fragments.is_empty() {
            self.master.set_part(&self.options.part_path, body);
        }

        let bytes = self.master.serialize()?;
        log::info!(
            "Merged {} packages, skipped {}",
            self.merged.len(),
            self.skipped.len()
        );

        Ok(MergeOutput {
            bytes,
            merged: self.merged,
            skipped: self.skipped,
            stripped_elements: self.stripped_elements,
            stripped_attributes: self.stripped_attributes,
        })
    }

    fn extract(&self, input: &PackageInput) -> std::result::Result<String, SkipReason> {
        let path = &self.options.part_path;
        let xml = match read_part(&input.bytes, path) {
            Ok(Some(xml)) => xml,
            Ok(None) => return Err(SkipReason::PartMissing(path.clone())),
            Err(Error::PartEncoding(part)) => return Err(SkipReason::PartEncoding(part)),
            Err(Error::PackageCorrupt(detail)) => return Err(SkipReason::PackageCorrupt(detail)),
            Err(err) => return Err(SkipReason::PackageCorrupt(err.to_string())),
        };

        match extract_fragment(&xml, &self.options.tags) {
            Ok(fragment) => Ok(fragment.to_string()),
            Err(_) => Err(SkipReason::FragmentNotFound {
                open: self.options.tags.open.clone(),
                close: self.options.tags.close.clone(),
            }),
        }
    }
}

/// Merge the body content of `additions` into `master`, in order.
///
/// Fails when the master cannot be opened, lacks the merged part, or has
/// no closing body tag, and when cancelled. Additions that cannot be used
/// are reported in [`MergeOutput::skipped`].
pub fn merge_packages(
    master: &[u8],
    additions: &[PackageInput],
    options: &MergeOptions,
) -> Result<MergeOutput> {
    let cancel = options.cancel.as_ref();
    let mut job = MergeJob::open(master, options.clone())?;

    for input in additions {
        checkpoint(cancel)?;
        job.add(input);
    }

    checkpoint(cancel)?;
    job.finish()
}

/// Merge package files into the master file, in order.
///
/// Only the master must be readable; additions that cannot be read are
/// skipped like any other unusable input.
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(
    master: P,
    additions: &[Q],
    options: &MergeOptions,
) -> Result<MergeOutput> {
    let cancel = options.cancel.as_ref();
    let master = std::fs::read(master)?;
    let mut job = MergeJob::open(master, options.clone())?;

    for path in additions {
        checkpoint(cancel)?;
        job.add_file(path);
    }

    checkpoint(cancel)?;
    job.finish()
}

fn input_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
