//! OOXML package handling: part access, body fragment extraction,
//! sanitization and splicing, and multi-package merge.

mod archive;
mod fragment;
mod merge;
mod options;
mod sanitize;
mod splice;

pub use archive::{read_part, Package, CONTENT_TYPES_PART};
pub use fragment::extract_fragment;
pub use merge::{
    merge_files, merge_packages, MergeJob, MergeOutput, PackageInput, SkipReason, SkippedInput,
};
pub use options::{BodyTags, MergeOptions, PAGE_BREAK_PARAGRAPH};
pub use sanitize::{ContainerRule, FragmentSanitizer, SanitizeRules, Sanitized};
pub use splice::Splicer;
