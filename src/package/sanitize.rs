//! Removal of relationship-bound content from transplanted fragments.
//!
//! A fragment taken from one package may reference images, embedded
//! objects or other parts through relationship ids that do not exist in
//! the package it is spliced into. Such references make the merged file
//! fail to open, so they are dropped: whole elements for drawings and
//! objects, single attributes for stray `r:` references. Frames whose
//! content is only a relationship pointer, such as charts and SmartArt in
//! slides, are dropped as a whole when such a pointer is found inside
//! them. This is lossy. Images in appended content do not survive a merge.
//!
//! Sanitization walks the fragment with a streaming XML reader and
//! passes through every event it does not strip, so unknown markup is
//! kept byte for byte. If the fragment cannot be tokenized, a textual
//! pattern pass is used instead. Sanitization itself never fails.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// What to strip from a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SanitizeRules {
    /// Elements removed together with their whole subtree, at any depth
    pub strip_elements: Vec<String>,

    /// Elements removed only when they are direct children of the fragment
    /// root
    pub strip_top_level: Vec<String>,

    /// Attributes removed when their qualified name starts with one of
    /// these prefixes
    pub strip_attribute_prefixes: Vec<String>,

    /// Attributes removed by exact qualified name
    pub strip_attributes: Vec<String>,

    /// Elements removed with their subtree only when they contain one of
    /// the rule's marker elements
    #[serde(default)]
    pub strip_containers: Vec<ContainerRule>,
}

/// An element that is dropped when it contains any of `markers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRule {
    /// Qualified name of the container
    pub element: String,
    /// Qualified names of descendants that condemn the container
    pub markers: Vec<String>,
}

impl ContainerRule {
    /// Create a rule for `element` with the given marker descendants.
    pub fn new(element: impl Into<String>, markers: &[&str]) -> Self {
        Self {
            element: element.into(),
            markers: strings(markers),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl SanitizeRules {
    /// Rules that strip nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Rules for word-processing bodies.
    ///
    /// Header and footer references are dropped with their element since
    /// they are meaningless without their `r:id`. A top-level `w:sectPr`
    /// is dropped so the master keeps a single body section.
    pub fn wordprocessing() -> Self {
        Self {
            strip_elements: strings(&[
                "w:drawing",
                "w:pict",
                "w:object",
                "w:headerReference",
                "w:footerReference",
            ]),
            strip_top_level: strings(&["w:sectPr"]),
            strip_attribute_prefixes: strings(&["r:"]),
            strip_attributes: Vec::new(),
            strip_containers: Vec::new(),
        }
    }

    /// Rules for slide shape trees.
    ///
    /// The group properties every `p:spTree` starts with are dropped from
    /// the fragment because the master tree already has them. A
    /// `p:graphicFrame` holding a chart, a SmartArt diagram or an OLE
    /// object is dropped whole; table frames are kept.
    pub fn presentation() -> Self {
        Self {
            strip_elements: strings(&["p:pic", "p:oleObj"]),
            strip_top_level: strings(&["p:nvGrpSpPr", "p:grpSpPr"]),
            strip_attribute_prefixes: strings(&["r:"]),
            strip_attributes: Vec::new(),
            strip_containers: vec![ContainerRule::new(
                "p:graphicFrame",
                &["c:chart", "dgm:relIds", "p:oleObj"],
            )],
        }
    }

    /// Also strip `qname` with its subtree wherever it appears.
    pub fn with_element(mut self, qname: impl Into<String>) -> Self {
        self.strip_elements.push(qname.into());
        self
    }

    /// Also strip `qname` when it is a direct child of the fragment root.
    pub fn with_top_level_element(mut self, qname: impl Into<String>) -> Self {
        self.strip_top_level.push(qname.into());
        self
    }

    /// Also strip attributes whose name starts with `prefix`.
    pub fn with_attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_attribute_prefixes.push(prefix.into());
        self
    }

    /// Also strip the attribute named `qname`.
    pub fn with_attribute(mut self, qname: impl Into<String>) -> Self {
        self.strip_attributes.push(qname.into());
        self
    }

    /// Also strip `element` whenever it contains one of `markers`.
    pub fn with_container(mut self, element: impl Into<String>, markers: &[&str]) -> Self {
        self.strip_containers.push(ContainerRule::new(element, markers));
        self
    }

    /// Whether these rules strip anything at all.
    pub fn is_empty(&self) -> bool {
        self.strip_elements.is_empty()
            && self.strip_top_level.is_empty()
            && self.strip_attribute_prefixes.is_empty()
            && self.strip_attributes.is_empty()
            && self.strip_containers.is_empty()
    }

    fn container(&self, name: &[u8]) -> Option<&ContainerRule> {
        self.strip_containers
            .iter()
            .find(|rule| rule.element.as_bytes() == name)
    }

    fn strips_element(&self, name: &[u8], depth: usize) -> bool {
        contains_name(&self.strip_elements, name)
            || (depth == 0 && contains_name(&self.strip_top_level, name))
    }

    fn strips_attribute(&self, key: &[u8]) -> bool {
        self.strip_attribute_prefixes
            .iter()
            .any(|p| key.starts_with(p.as_bytes()))
            || contains_name(&self.strip_attributes, key)
    }
}

fn contains_name(names: &[String], name: &[u8]) -> bool {
    names.iter().any(|n| n.as_bytes() == name)
}

/// Outcome of sanitizing one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    /// The fragment with stripped content removed
    pub fragment: String,
    /// Elements removed, each counting its whole subtree once
    pub stripped_elements: usize,
    /// Attributes removed from kept elements
    pub stripped_attributes: usize,
    /// False when the textual fallback was used
    pub structural: bool,
}

impl Sanitized {
    /// Whether nothing was removed.
    pub fn is_untouched(&self) -> bool {
        self.stripped_elements == 0 && self.stripped_attributes == 0
    }
}

/// Applies [`SanitizeRules`] to fragments.
#[derive(Debug, Clone)]
pub struct FragmentSanitizer {
    rules: SanitizeRules,
    container_patterns: Vec<(Regex, Vec<String>)>,
    element_patterns: Vec<Regex>,
    attribute_patterns: Vec<Regex>,
}

impl FragmentSanitizer {
    /// Create a sanitizer, compiling the patterns of the textual fallback.
    pub fn new(rules: SanitizeRules) -> Self {
        let container_patterns = rules
            .strip_containers
            .iter()
            .filter_map(|rule| {
                let n = regex::escape(&rule.element);
                Regex::new(&format!(r"(?s)<{n}(?:\s[^>]*)?>.*?</{n}\s*>"))
                    .ok()
                    .map(|pattern| (pattern, rule.markers.clone()))
            })
            .collect();

        let element_patterns = rules
            .strip_elements
            .iter()
            .filter_map(|name| {
                let n = regex::escape(name);
                Regex::new(&format!(
                    r"(?s)<{n}(?:\s[^>]*)?/>|<{n}(?:\s[^>]*)?>.*?</{n}\s*>"
                ))
                .ok()
            })
            .collect();

        let value = r#"\s*=\s*(?:"[^"]*"|'[^']*')"#;
        let attribute_patterns = rules
            .strip_attribute_prefixes
            .iter()
            .map(|p| format!(r"\s+{}[\w.:-]*{}", regex::escape(p), value))
            .chain(
                rules
                    .strip_attributes
                    .iter()
                    .map(|a| format!(r"\s+{}{}", regex::escape(a), value)),
            )
            .filter_map(|pattern| Regex::new(&pattern).ok())
            .collect();

        Self {
            rules,
            container_patterns,
            element_patterns,
            attribute_patterns,
        }
    }

    /// The rules this sanitizer applies.
    pub fn rules(&self) -> &SanitizeRules {
        &self.rules
    }

    /// Sanitize a fragment.
    pub fn sanitize(&self, fragment: &str) -> Sanitized {
        if self.rules.is_empty() {
            return Sanitized {
                fragment: fragment.to_string(),
                stripped_elements: 0,
                stripped_attributes: 0,
                structural: true,
            };
        }

        match self.sanitize_structural(fragment) {
            Ok(sanitized) => sanitized,
            Err(reason) => {
                log::warn!("Fragment is not well-formed ({}), stripping textually", reason);
                self.sanitize_textual(fragment)
            }
        }
    }

    fn sanitize_structural(&self, fragment: &str) -> Result<Sanitized, String> {
        let doomed = self.doomed_containers(fragment)?;
        let mut containers_seen = 0usize;

        let mut reader = Reader::from_str(fragment);
        reader.check_end_names(false);
        let mut writer = Writer::new(Vec::with_capacity(fragment.len()));

        let mut depth = 0usize;
        let mut skipping = 0usize;
        let mut stripped_elements = 0;
        let mut stripped_attributes = 0;

        loop {
            let event = reader.read_event().map_err(|e| e.to_string())?;
            let event = match event {
                Event::Eof => break,
                Event::Start(e) => {
                    let condemned = self.next_container(&e, &doomed, &mut containers_seen);
                    if skipping > 0 {
                        skipping += 1;
                        continue;
                    }
                    if condemned || self.rules.strips_element(e.name().as_ref(), depth) {
                        skipping = 1;
                        stripped_elements += 1;
                        continue;
                    }
                    depth += 1;
                    Event::Start(self.strip_attributes(e, &mut stripped_attributes)?)
                }
                Event::Empty(e) => {
                    self.next_container(&e, &doomed, &mut containers_seen);
                    if skipping > 0 {
                        continue;
                    }
                    if self.rules.strips_element(e.name().as_ref(), depth) {
                        stripped_elements += 1;
                        continue;
                    }
                    Event::Empty(self.strip_attributes(e, &mut stripped_attributes)?)
                }
                Event::End(e) => {
                    if skipping > 0 {
                        skipping -= 1;
                        continue;
                    }
                    depth = depth.saturating_sub(1);
                    Event::End(e)
                }
                other => {
                    if skipping > 0 {
                        continue;
                    }
                    other
                }
            };
            writer.write_event(event).map_err(|e| e.to_string())?;
        }

        let fragment = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
        Ok(Sanitized {
            fragment,
            stripped_elements,
            stripped_attributes,
            structural: true,
        })
    }

    /// Flags, by order of appearance, the containers that hold a marker.
    fn doomed_containers(&self, fragment: &str) -> Result<Vec<bool>, String> {
        let mut doomed = Vec::new();
        if self.rules.strip_containers.is_empty() {
            return Ok(doomed);
        }

        let mut reader = Reader::from_str(fragment);
        reader.check_end_names(false);
        // (ordinal, depth at open, rule)
        let mut open: Vec<(usize, usize, &ContainerRule)> = Vec::new();
        let mut depth = 0usize;

        loop {
            match reader.read_event().map_err(|e| e.to_string())? {
                Event::Eof => break,
                Event::Start(e) => {
                    mark_markers(e.name().as_ref(), &open, &mut doomed);
                    if let Some(rule) = self.rules.container(e.name().as_ref()) {
                        open.push((doomed.len(), depth, rule));
                        doomed.push(false);
                    }
                    depth += 1;
                }
                Event::Empty(e) => {
                    mark_markers(e.name().as_ref(), &open, &mut doomed);
                    if self.rules.container(e.name().as_ref()).is_some() {
                        doomed.push(false);
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    while open.last().is_some_and(|&(_, opened, _)| opened >= depth) {
                        open.pop();
                    }
                }
                _ => {}
            }
        }

        Ok(doomed)
    }

    /// Whether `tag` is a container flagged by [`Self::doomed_containers`].
    /// Must see every start tag, skipped or not, to keep ordinals aligned.
    fn next_container(&self, tag: &BytesStart<'_>, doomed: &[bool], seen: &mut usize) -> bool {
        if self.rules.container(tag.name().as_ref()).is_none() {
            return false;
        }
        let flagged = doomed.get(*seen).copied().unwrap_or(false);
        *seen += 1;
        flagged
    }

    /// Returns the tag unchanged unless one of its attributes is stripped.
    fn strip_attributes<'a>(
        &self,
        tag: BytesStart<'a>,
        stripped: &mut usize,
    ) -> Result<BytesStart<'a>, String> {
        let mut removed = 0;
        for attr in tag.attributes().with_checks(false) {
            let attr = attr.map_err(|e| e.to_string())?;
            if self.rules.strips_attribute(attr.key.as_ref()) {
                removed += 1;
            }
        }

        if removed == 0 {
            return Ok(tag);
        }
        *stripped += removed;

        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let mut content = name.clone();
        for attr in tag.attributes().with_checks(false).flatten() {
            if self.rules.strips_attribute(attr.key.as_ref()) {
                continue;
            }
            let value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
            content.push(' ');
            content.push_str(&String::from_utf8_lossy(attr.key.as_ref()));
            content.push_str("=\"");
            content.push_str(&value);
            content.push('"');
        }

        Ok(BytesStart::from_content(content, name.len()))
    }

    fn sanitize_textual(&self, fragment: &str) -> Sanitized {
        let mut text = fragment.to_string();
        let mut stripped_elements = 0;
        let mut stripped_attributes = 0;

        for (pattern, markers) in &self.container_patterns {
            text = pattern
                .replace_all(&text, |caps: &Captures| {
                    if markers.iter().any(|m| mentions_element(&caps[0], m)) {
                        stripped_elements += 1;
                        String::new()
                    } else {
                        caps[0].to_string()
                    }
                })
                .into_owned();
        }
        for pattern in &self.element_patterns {
            stripped_elements += pattern.find_iter(&text).count();
            text = pattern.replace_all(&text, "").into_owned();
        }
        for pattern in &self.attribute_patterns {
            stripped_attributes += pattern.find_iter(&text).count();
            text = pattern.replace_all(&text, "").into_owned();
        }

        Sanitized {
            fragment: text,
            stripped_elements,
            stripped_attributes,
            structural: false,
        }
    }
}

fn mark_markers(name: &[u8], open: &[(usize, usize, &ContainerRule)], doomed: &mut [bool]) {
    for (ordinal, _, rule) in open {
        if contains_name(&rule.markers, name) {
            doomed[*ordinal] = true;
        }
    }
}

/// Whether `text` contains a start tag named `name`.
fn mentions_element(text: &str, name: &str) -> bool {
    let open = format!("<{}", name);
    text.match_indices(&open).any(|(at, _)| {
        matches!(
            text[at + open.len()..].chars().next(),
            Some(c) if c.is_whitespace() || c == '>' || c == '/'
        )
    })
}

impl Default for FragmentSanitizer {
    fn default() -> Self {
        Self::new(SanitizeRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docx() -> FragmentSanitizer {
        FragmentSanitizer::new(SanitizeRules::wordprocessing())
    }

    #[test]
    fn test_strips_drawing_subtree() {
        let input = concat!(
            "<w:p><w:r><w:t>before</w:t></w:r>",
            r#"<w:r><w:drawing><wp:inline><a:blip r:embed="rId5"/></wp:inline></w:drawing></w:r>"#,
            "<w:r><w:t>after</w:t></w:r></w:p>"
        );
        let result = docx().sanitize(input);

        assert!(result.structural);
        assert_eq!(result.stripped_elements, 1);
        assert_eq!(
            result.fragment,
            "<w:p><w:r><w:t>before</w:t></w:r><w:r></w:r><w:r><w:t>after</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_strips_nested_same_name() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::none().with_element("x"));
        let result = sanitizer.sanitize("<a><x><x>in</x>still</x>out</a>");
        assert_eq!(result.fragment, "<a>out</a>");
        assert_eq!(result.stripped_elements, 1);
    }

    #[test]
    fn test_strips_relationship_attributes() {
        let input = r#"<w:hyperlink r:id="rId9" w:history="1"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#;
        let result = docx().sanitize(input);

        assert_eq!(result.stripped_attributes, 1);
        assert_eq!(
            result.fragment,
            r#"<w:hyperlink w:history="1"><w:r><w:t>link</w:t></w:r></w:hyperlink>"#
        );
    }

    #[test]
    fn test_unknown_markup_passes_through() {
        let input = "<w:p w14:paraId=\"1A2B\"><!-- note --><w:r><w:t xml:space=\"preserve\"> a &amp; b </w:t></w:r></w:p>";
        let result = docx().sanitize(input);
        assert!(result.is_untouched());
        assert_eq!(result.fragment, input);
    }

    #[test]
    fn test_top_level_only_rules() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::presentation());
        let input = concat!(
            "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/></p:nvGrpSpPr>",
            "<p:grpSpPr/>",
            "<p:grpSp><p:grpSpPr/></p:grpSp>",
            "<p:sp><p:txBody/></p:sp>"
        );
        let result = sanitizer.sanitize(input);

        assert_eq!(result.stripped_elements, 2);
        assert_eq!(
            result.fragment,
            "<p:grpSp><p:grpSpPr/></p:grpSp><p:sp><p:txBody/></p:sp>"
        );
    }

    #[test]
    fn test_presentation_strips_pictures() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::presentation());
        let input = r#"<p:sp/><p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic><p:sp/>"#;
        let result = sanitizer.sanitize(input);
        assert_eq!(result.fragment, "<p:sp/><p:sp/>");
    }

    #[test]
    fn test_presentation_drops_chart_frames_keeps_tables() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::presentation());
        let chart = concat!(
            "<p:graphicFrame><p:nvGraphicFramePr/><a:graphic><a:graphicData uri=\"c\">",
            r#"<c:chart r:id="rId2"/>"#,
            "</a:graphicData></a:graphic></p:graphicFrame>"
        );
        let table = concat!(
            "<p:graphicFrame><a:graphic><a:graphicData uri=\"t\">",
            "<a:tbl><a:tr/></a:tbl>",
            "</a:graphicData></a:graphic></p:graphicFrame>"
        );
        let input = format!("{}{}<p:sp/>", chart, table);
        let result = sanitizer.sanitize(&input);

        assert!(result.structural);
        assert_eq!(result.stripped_elements, 1);
        assert_eq!(result.stripped_attributes, 0);
        assert_eq!(result.fragment, format!("{}<p:sp/>", table));
    }

    #[test]
    fn test_container_rule_counts_ordinals_inside_skipped_subtrees() {
        let sanitizer = FragmentSanitizer::new(
            SanitizeRules::none()
                .with_element("skip")
                .with_container("f", &["m"]),
        );
        let input = "<skip><f><m/></f></skip><f><x/></f><f><m/></f>";
        let result = sanitizer.sanitize(input);
        assert_eq!(result.fragment, "<f><x/></f>");
        assert_eq!(result.stripped_elements, 2);
    }

    #[test]
    fn test_textual_fallback_drops_diagram_frames() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::presentation());
        let input = concat!(
            "<p:graphicFrame><a:graphicData>",
            r#"<dgm:relIds r:dm="rId4"/>"#,
            "</a:graphicData></p:graphicFrame>",
            "<p:sp a=b/>"
        );
        let result = sanitizer.sanitize(input);

        assert!(!result.structural);
        assert_eq!(result.fragment, "<p:sp a=b/>");
        assert_eq!(result.stripped_elements, 1);
    }

    #[test]
    fn test_self_closing_stripped_element() {
        let result = docx().sanitize(r#"<w:r><w:object w:dxaOrig="10"/></w:r>"#);
        assert_eq!(result.fragment, "<w:r></w:r>");
        assert_eq!(result.stripped_elements, 1);
    }

    #[test]
    fn test_textual_fallback_on_malformed_fragment() {
        let input = r#"<w:p><w:drawing>img</w:drawing><w:r r:id="rId1" w:x=bad>x</w:r></w:p>"#;
        let result = docx().sanitize(input);

        assert!(!result.structural);
        assert_eq!(result.fragment, "<w:p><w:r w:x=bad>x</w:r></w:p>");
        assert_eq!(result.stripped_elements, 1);
        assert_eq!(result.stripped_attributes, 1);
    }

    #[test]
    fn test_no_rules_is_identity() {
        let sanitizer = FragmentSanitizer::new(SanitizeRules::none());
        let input = "<a r:id=\"x\"><w:drawing/></a>";
        assert_eq!(sanitizer.sanitize(input).fragment, input);
    }
}
