//! Body fragment extraction.

use crate::error::{Error, Result};

use super::options::BodyTags;

/// Return the content between the first open tag and the last close tag.
///
/// The open tag is matched as an element start: the prefix in
/// `tags.open` must be followed by whitespace, `>` or `/`, so `<w:body`
/// does not match `<w:bodyPr`. A self-closing open tag has no content and
/// is passed over. Nested elements of the same name end up inside the
/// returned span.
pub fn extract_fragment<'a>(xml: &'a str, tags: &BodyTags) -> Result<&'a str> {
    let not_found = || Error::FragmentNotFound {
        open: tags.open.clone(),
        close: tags.close.clone(),
    };

    let start = find_open_tag(xml, &tags.open).ok_or_else(not_found)?;
    let end = xml.rfind(tags.close.as_str()).ok_or_else(not_found)?;

    if end < start {
        return Err(not_found());
    }
    Ok(&xml[start..end])
}

/// Byte offset just past the `>` of the first non-empty open tag.
fn find_open_tag(xml: &str, open: &str) -> Option<usize> {
    let complete = open.ends_with('>');
    let mut from = 0;

    while let Some(pos) = xml[from..].find(open) {
        let tag_start = from + pos;
        let after = tag_start + open.len();
        from = after;

        if complete {
            return Some(after);
        }

        match xml[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {}
            _ => continue,
        }

        let close = after + xml[after..].find('>')?;
        if xml[..close].ends_with('/') {
            continue;
        }
        return Some(close + 1);
    }

    None
}
