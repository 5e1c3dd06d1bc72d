// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thin event-writer over quick-xml used by every package part.

use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use docxpress_core::error::{DocxpressError, Result};

/// Streaming XML writer producing a standalone UTF-8 part.
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Create a writer and emit the XML declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Self {
            inner: Writer::new(Vec::with_capacity(4096)),
        };
        writer.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(writer)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| DocxpressError::Xml(e.to_string()))
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = tag_with_attributes(name, attrs);
        self.write(Event::Start(tag))
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Self-closing element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let tag = tag_with_attributes(name, attrs);
        self.write(Event::Empty(tag))
    }

    /// Escaped character data. Characters XML 1.0 cannot carry are dropped.
    pub fn text(&mut self, text: &str) -> Result<()> {
        let text = xml_safe(text);
        self.write(Event::Text(BytesText::new(&text)))
    }

    /// `<name attrs>text</name>`.
    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

/// Start tag with escaped attributes; values lose characters XML 1.0 cannot
/// carry, like text does.
fn tag_with_attributes<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut tag = BytesStart::new(name);
    for (key, value) in attrs {
        let value = xml_safe(value);
        tag.push_attribute((*key, value.as_ref()));
    }
    tag
}

fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_declaration_and_escapes() {
        let mut w = XmlWriter::new().unwrap();
        w.start("w:p", &[("w:rsidR", "00")]).unwrap();
        w.element("w:t", &[], "a < b & \"c\"").unwrap();
        w.empty("w:br", &[]).unwrap();
        w.end("w:p").unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
        assert!(xml.contains(r#"<w:p w:rsidR="00">"#));
        assert!(xml.contains("a &lt; b &amp;"));
        assert!(xml.contains("<w:br/>"));
    }

    #[test]
    fn strips_control_characters() {
        let mut w = XmlWriter::new().unwrap();
        w.element("t", &[], "a\u{1}b\u{FFFF}c").unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.ends_with("<t>abc</t>"));
    }

    #[test]
    fn strips_control_characters_from_attributes() {
        let mut w = XmlWriter::new().unwrap();
        w.empty("v:textpath", &[("string", "DRAFT\u{1}X"), ("style", "a&\u{8}b")])
            .unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.ends_with(r#"<v:textpath string="DRAFTX" style="a&amp;b"/>"#));
    }
}
