//! Zip-backed OOXML package model.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::detect::{package_kind, PackageKind};
use crate::error::{Error, Result};

/// Path of the content-types part present in every OOXML package.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// An OOXML package: named parts held in a zip container.
///
/// All parts are decompressed into memory when the package is opened.
/// Parts never touched by [`set_part`](Self::set_part) are written back
/// by copying their compressed entries verbatim, and a package with no
/// modifications serializes to exactly the bytes it was opened from.
#[derive(Debug, Clone)]
pub struct Package {
    source: Vec<u8>,
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
    /// Entry index in the source archive; `None` for parts added later
    origin: Option<usize>,
    modified: bool,
}

impl Package {
    /// Open a package from its bytes.
    pub fn open(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let source = bytes.into();
        let parts = read_parts(&source)?;
        log::debug!("Opened package with {} parts", parts.len());
        Ok(Self { source, parts })
    }

    /// Open a package from a file.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(std::fs::read(path)?)
    }

    /// Names of all parts in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Number of parts (directory entries included).
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Check whether a part exists.
    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Raw bytes of a part.
    pub fn part_bytes(&self, path: &str) -> Option<&[u8]> {
        self.find(path).map(|p| p.data.as_slice())
    }

    /// Text of a part, or `None` when the part does not exist.
    pub fn get_part(&self, path: &str) -> Result<Option<&str>> {
        match self.find(path) {
            Some(part) => std::str::from_utf8(&part.data)
                .map(Some)
                .map_err(|_| Error::PartEncoding(path.to_string())),
            None => Ok(None),
        }
    }

    /// Replace the content of a part, adding it if it does not exist.
    pub fn set_part(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        let data = content.into();
        match self.parts.iter_mut().find(|p| p.name == path) {
            Some(part) => {
                part.data = data;
                part.modified = true;
            }
            None => self.parts.push(Part {
                name: path.to_string(),
                data,
                origin: None,
                modified: true,
            }),
        }
    }

    /// Whether any part has been replaced or added.
    pub fn is_modified(&self) -> bool {
        self.parts.iter().any(|p| p.modified)
    }

    /// Kind of document, from `[Content_Types].xml`.
    pub fn kind(&self) -> PackageKind {
        match self.get_part(CONTENT_TYPES_PART) {
            Ok(Some(content_types)) => package_kind(content_types),
            _ => PackageKind::Unknown,
        }
    }

    /// Write the package back to zip bytes.
    ///
    /// Archive order is kept; added parts go at the end. Modified parts
    /// are deflated, untouched ones are raw-copied.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        if !self.is_modified() {
            return Ok(self.source.clone());
        }

        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.source.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            match part.origin {
                Some(index) if !part.modified => {
                    let entry = archive.by_index_raw(index)?;
                    writer.raw_copy_file(entry)?;
                }
                _ => {
                    writer.start_file(part.name.as_str(), options)?;
                    writer.write_all(&part.data)?;
                }
            }
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    fn find(&self, path: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == path)
    }
}

fn read_parts(source: &[u8]) -> Result<Vec<Part>> {
    let mut archive = ZipArchive::new(Cursor::new(source))?;
    let mut parts = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::PackageCorrupt(format!("{}: {}", name, e)))?;
        parts.push(Part {
            name,
            data,
            origin: Some(index),
            modified: false,
        });
    }

    Ok(parts)
}

/// Read a single part's text straight from package bytes.
///
/// Cheaper than [`Package::open`] when only one part of a package is
/// needed. Returns `Ok(None)` when the part is absent.
pub fn read_part(bytes: &[u8], path: &str) -> Result<Option<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut entry = match archive.by_name(path) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|e| Error::PackageCorrupt(format!("{}: {}", path, e)))?;

    String::from_utf8(data)
        .map(Some)
        .map_err(|_| Error::PartEncoding(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_open_and_get_part() {
        let bytes = build_zip(&[("a.xml", "<a/>"), ("dir/b.xml", "<b/>")]);
        let package = Package::open(bytes).unwrap();

        assert_eq!(package.part_count(), 2);
        assert_eq!(package.get_part("a.xml").unwrap(), Some("<a/>"));
        assert_eq!(package.get_part("missing.xml").unwrap(), None);
        assert!(package.contains("dir/b.xml"));
        assert_eq!(
            package.part_names().collect::<Vec<_>>(),
            vec!["a.xml", "dir/b.xml"]
        );
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let result = Package::open(b"definitely not a zip".to_vec());
        assert!(matches!(result, Err(Error::PackageCorrupt(_))));
    }

    #[test]
    fn test_unmodified_round_trip_is_byte_identical() {
        let bytes = build_zip(&[("a.xml", "<a/>"), ("b.xml", "<b/>")]);
        let package = Package::open(bytes.clone()).unwrap();
        assert!(!package.is_modified());
        assert_eq!(package.serialize().unwrap(), bytes);
    }

    #[test]
    fn test_set_part_and_serialize() {
        let bytes = build_zip(&[("a.xml", "<a/>"), ("b.xml", "<b/>")]);
        let mut package = Package::open(bytes).unwrap();
        package.set_part("a.xml", "<a>changed</a>");
        package.set_part("c.xml", "<c/>");
        assert!(package.is_modified());

        let reopened = Package::open(package.serialize().unwrap()).unwrap();
        assert_eq!(reopened.get_part("a.xml").unwrap(), Some("<a>changed</a>"));
        assert_eq!(reopened.get_part("b.xml").unwrap(), Some("<b/>"));
        assert_eq!(reopened.get_part("c.xml").unwrap(), Some("<c/>"));
        assert_eq!(
            reopened.part_names().collect::<Vec<_>>(),
            vec!["a.xml", "b.xml", "c.xml"]
        );
    }

    #[test]
    fn test_serialize_is_deterministic() {
        let bytes = build_zip(&[("a.xml", "<a/>")]);
        let mut package = Package::open(bytes).unwrap();
        package.set_part("a.xml", "<a>x</a>");
        assert_eq!(package.serialize().unwrap(), package.serialize().unwrap());
    }

    #[test]
    fn test_untouched_part_bytes_survive_rewrite() {
        let bytes = build_zip(&[("a.xml", "<a/>"), ("b.bin", "\u{1}\u{2}\u{3}")]);
        let mut package = Package::open(bytes).unwrap();
        package.set_part("a.xml", "<a>new</a>");

        let reopened = Package::open(package.serialize().unwrap()).unwrap();
        assert_eq!(reopened.part_bytes("b.bin"), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_get_part_rejects_invalid_utf8() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("bad.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(&[0xFF, 0xFE, 0x00]).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let package = Package::open(bytes.clone()).unwrap();
        assert!(matches!(
            package.get_part("bad.xml"),
            Err(Error::PartEncoding(_))
        ));
        assert!(matches!(
            read_part(&bytes, "bad.xml"),
            Err(Error::PartEncoding(_))
        ));
    }

    #[test]
    fn test_read_part() {
        let bytes = build_zip(&[("word/document.xml", "<w:body/>")]);
        assert_eq!(
            read_part(&bytes, "word/document.xml").unwrap().as_deref(),
            Some("<w:body/>")
        );
        assert_eq!(read_part(&bytes, "nope.xml").unwrap(), None);
        assert!(read_part(b"garbage", "x").is_err());
    }

    #[test]
    fn test_kind_from_content_types() {
        let content_types = r#"<Types><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;
        let bytes = build_zip(&[(CONTENT_TYPES_PART, content_types)]);
        let package = Package::open(bytes).unwrap();
        assert_eq!(package.kind(), PackageKind::Wordprocessing);

        let bare = Package::open(build_zip(&[("a.xml", "<a/>")])).unwrap();
        assert_eq!(bare.kind(), PackageKind::Unknown);
    }
}
