//! Insertion of fragments into a master body.

use crate::error::{Error, Result};

/// Appends fragments before the last occurrence of a closing tag.
#[derive(Debug, Clone)]
pub struct Splicer<'a> {
    close_tag: &'a str,
    separator: &'a str,
}

impl<'a> Splicer<'a> {
    /// Create a splicer inserting before `close_tag`, each fragment preceded
    /// by `separator`.
    pub fn new(close_tag: &'a str, separator: &'a str) -> Self {
        Self {
            close_tag,
            separator,
        }
    }

    /// Build the new body. The separator precedes every fragment; nothing
    /// follows the last one. Everything before the close tag is kept as is.
    pub fn splice<S: AsRef<str>>(&self, master: &str, fragments: &[S]) -> Result<String> {
        let at = master
            .rfind(self.close_tag)
            .ok_or_else(|| Error::BodyCloseTagNotFound(self.close_tag.to_string()))?;

        let added: usize = fragments
            .iter()
            .map(|f| f.as_ref().len() + self.separator.len())
            .sum();

        let mut out = String::with_capacity(master.len() + added);
        out.push_str(&master[..at]);
        for fragment in fragments {
            out.push_str(self.separator);
            out.push_str(fragment.as_ref());
        }
        out.push_str(&master[at..]);
        Ok(out)
    }
}
