// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OPC packaging: relationships, content types, document properties, and the
// ZIP container.
//
// Entries are deflated and stamped with the ZIP epoch so that identical parts
// always produce identical archive bytes.

use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use docxpress_core::error::{DocxpressError, Result};

use super::xml::XmlWriter;

const RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";
/// Namespace of `r:` attributes in WordprocessingML parts.
pub const R_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship types used by the package.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const SETTINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// Content types of the parts this crate writes.
pub mod content_type {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
    pub const NUMBERING: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
    pub const SETTINGS: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
    pub const HEADER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
    pub const FOOTER: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    rel_type: &'static str,
    target: String,
    external: bool,
}

/// The relationship set of one part, with sequential `rIdN` ids.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Add an internal relationship and return its id.
    pub fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        self.push(rel_type, target.into(), false)
    }

    /// Add an external hyperlink and return its id. Repeated targets share
    /// one relationship.
    pub fn add_hyperlink(&mut self, target: &str) -> String {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|r| r.external && r.rel_type == rel_type::HYPERLINK && r.target == target)
        {
            return existing.id.clone();
        }
        self.push(rel_type::HYPERLINK, target.to_owned(), true)
    }

    fn push(&mut self, rel_type: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type,
            target,
            external,
        });
        id
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new()?;
        w.start("Relationships", &[("xmlns", RELS_NAMESPACE)])?;
        for rel in &self.entries {
            let mut attrs = vec![
                ("Id", rel.id.as_str()),
                ("Type", rel.rel_type),
                ("Target", rel.target.as_str()),
            ];
            if rel.external {
                attrs.push(("TargetMode", "External"));
            }
            w.empty("Relationship", &attrs)?;
        }
        w.end("Relationships")?;
        Ok(w.finish())
    }
}

// ---------------------------------------------------------------------------
// Package
// ---------------------------------------------------------------------------

/// An OPC package under construction.
#[derive(Debug, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<(String, &'static str)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an XML part with its content type.
    pub fn add_part(&mut self, name: &str, content_type: &'static str, data: Vec<u8>) {
        self.overrides.push((format!("/{name}"), content_type));
        self.parts.push((name.to_owned(), data));
    }

    /// Add a `.rels` part (covered by the default extension mapping).
    pub fn add_relationships(&mut self, name: &str, rels: &Relationships) -> Result<()> {
        self.parts.push((name.to_owned(), rels.to_xml()?));
        Ok(())
    }

    fn content_types(&self) -> Result<Vec<u8>> {
        let mut w = XmlWriter::new()?;
        w.start("Types", &[("xmlns", CONTENT_TYPES_NAMESPACE)])?;
        w.empty(
            "Default",
            &[("Extension", "rels"), ("ContentType", content_type::RELATIONSHIPS)],
        )?;
        w.empty("Default", &[("Extension", "xml"), ("ContentType", content_type::XML)])?;
        for (part, ct) in &self.overrides {
            w.empty("Override", &[("PartName", part.as_str()), ("ContentType", ct)])?;
        }
        w.end("Types")?;
        Ok(w.finish())
    }

    /// Write the ZIP container. `[Content_Types].xml` is always the first
    /// entry.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let content_types = self.content_types()?;
        let entries = std::iter::once(("[Content_Types].xml", content_types.as_slice()))
            .chain(self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice())));

        for (name, data) in entries {
            zip.start_file(name, options)
                .map_err(|e| DocxpressError::Package(format!("{name}: {e}")))?;
            zip.write_all(data)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| DocxpressError::Package(e.to_string()))?;
        let bytes = cursor.into_inner();
        debug!(parts = self.parts.len() + 1, bytes = bytes.len(), "packaged DOCX");
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// Document properties
// ---------------------------------------------------------------------------

/// `docProps/core.xml`.
pub fn core_properties(created: DateTime<Utc>) -> Result<Vec<u8>> {
    let stamp = created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut w = XmlWriter::new()?;
    w.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    w.element("dc:creator", &[], "docxpress")?;
    w.element("cp:lastModifiedBy", &[], "docxpress")?;
    w.element("cp:revision", &[], "1")?;
    w.element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    w.element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    w.end("cp:coreProperties")?;
    Ok(w.finish())
}

/// `docProps/app.xml`.
pub fn app_properties() -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start(
        "Properties",
        &[
            (
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            ),
            (
                "xmlns:vt",
                "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
            ),
        ],
    )?;
    w.element(
        "Application",
        &[],
        concat!("docxpress/", env!("CARGO_PKG_VERSION")),
    )?;
    w.element("DocSecurity", &[], "0")?;
    w.end("Properties")?;
    Ok(w.finish())
}

/// `_rels/.rels`: points at the main document and the property parts.
pub fn package_relationships() -> Relationships {
    let mut rels = Relationships::default();
    rels.add(rel_type::OFFICE_DOCUMENT, "word/document.xml");
    rels.add(rel_type::CORE_PROPERTIES, "docProps/core.xml");
    rels.add(rel_type::EXTENDED_PROPERTIES, "docProps/app.xml");
    rels
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn relationship_ids_are_sequential_and_links_dedupe() {
        let mut rels = Relationships::default();
        assert_eq!(rels.add(rel_type::STYLES, "styles.xml"), "rId1");
        assert_eq!(rels.add_hyperlink("https://example.com"), "rId2");
        assert_eq!(rels.add_hyperlink("https://example.com"), "rId2");
        assert_eq!(rels.add_hyperlink("https://example.org"), "rId3");

        let xml = String::from_utf8(rels.to_xml().unwrap()).unwrap();
        assert_eq!(xml.matches("TargetMode=\"External\"").count(), 2);
    }

    #[test]
    fn zip_contains_content_types_first() {
        let mut package = Package::new();
        package.add_part("word/document.xml", content_type::DOCUMENT, b"<doc/>".to_vec());
        package
            .add_relationships("_rels/.rels", &package_relationships())
            .unwrap();
        let bytes = package.to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "[Content_Types].xml");

        let mut types = String::new();
        archive
            .by_name("[Content_Types].xml")
            .unwrap()
            .read_to_string(&mut types)
            .unwrap();
        assert!(types.contains(r#"PartName="/word/document.xml""#));

        let mut doc = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut doc)
            .unwrap();
        assert_eq!(doc, "<doc/>");
    }

    #[test]
    fn identical_parts_give_identical_archives() {
        let build = || {
            let mut package = Package::new();
            package.add_part("a.xml", content_type::XML, b"<a/>".to_vec());
            package.to_bytes().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn core_properties_carry_creation_time() {
        let created = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let xml = String::from_utf8(core_properties(created).unwrap()).unwrap();
        assert!(xml.contains("2026-03-04T05:06:07Z"));
    }
}
