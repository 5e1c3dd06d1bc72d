// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML parser: turns an HTML string into an owned tree of elements and text.
//
// `tl` does the tokenising; this module copies the borrowed VDom into owned
// nodes, lowercases tag and attribute names, decodes character references,
// and drops non-rendered subtrees (head, script, style, ...).

use std::collections::BTreeMap;

use tl::{Node, NodeHandle, Parser, ParserOptions};
use tracing::debug;

use docxpress_core::error::{DocxpressError, Result};

/// Elements whose subtree never contributes document content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "title", "meta", "link", "template", "noscript",
];

/// Nesting depth beyond which subtrees are dropped.
const MAX_DEPTH: usize = 256;

/// A node in the owned HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    /// Text with character references already decoded.
    Text(String),
}

/// An element with lowercase name and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Attribute value by (lowercase) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Parse an HTML document or fragment.
///
/// When the input contains a `<body>` element only its children are
/// returned, so whole documents (as produced by the CSS inliner) and bare
/// fragments yield the same tree.
pub fn parse_html(html: &str) -> Result<Vec<HtmlNode>> {
    let dom = tl::parse(html, ParserOptions::default())
        .map_err(|e| DocxpressError::HtmlParse(e.to_string()))?;
    let parser = dom.parser();

    let nodes: Vec<HtmlNode> = dom
        .children()
        .iter()
        .filter_map(|handle| convert_node(handle, parser, 0))
        .collect();

    let nodes = match take_body(&nodes) {
        Some(body) => body,
        None => nodes,
    };

    debug!(input_len = html.len(), top_level = nodes.len(), "parsed HTML");
    Ok(nodes)
}

fn convert_node(handle: &NodeHandle, parser: &Parser<'_>, depth: usize) -> Option<HtmlNode> {
    if depth > MAX_DEPTH {
        return None;
    }

    match handle.get(parser)? {
        Node::Raw(bytes) => {
            let raw = bytes.as_utf8_str();
            if raw.is_empty() {
                None
            } else {
                Some(HtmlNode::Text(decode_entities(&raw)))
            }
        }
        Node::Comment(_) => None,
        Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();
            // Doctype and processing instructions surface as tags starting with '!' or '?'.
            if name.starts_with('!') || name.starts_with('?') {
                return None;
            }
            if SKIPPED_ELEMENTS.contains(&name.as_str()) {
                return None;
            }

            let mut element = Element::new(name);
            for (key, value) in tag.attributes().iter() {
                let value = value.map(|v| decode_entities(&v)).unwrap_or_default();
                element.attributes.insert(key.to_ascii_lowercase(), value);
            }

            let children = tag.children();
            for child in children.top().iter() {
                if let Some(node) = convert_node(&child, parser, depth + 1) {
                    element.children.push(node);
                }
            }

            Some(HtmlNode::Element(element))
        }
    }
}

/// Find the first `<body>` element and return a copy of its children.
fn take_body(nodes: &[HtmlNode]) -> Option<Vec<HtmlNode>> {
    for node in nodes {
        if let HtmlNode::Element(el) = node {
            if el.name == "body" {
                return Some(el.children.clone());
            }
            if let Some(found) = take_body(&el.children) {
                return Some(found);
            }
        }
    }
    None
}

/// Decode HTML character references (`&amp;`, `&#169;`, `&#xA9;`, ...).
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        // References are short; look for the terminating ';' close by.
        let decoded = tail
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .and_then(|(semi, _)| resolve_reference(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bull" => '\u{2022}',
        "middot" => '\u{00B7}',
        "euro" => '\u{20AC}',
        "pound" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "sect" => '\u{00A7}',
        "para" => '\u{00B6}',
        "deg" => '\u{00B0}',
        "plusmn" => '\u{00B1}',
        "times" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &HtmlNode) -> &Element {
        match node {
            HtmlNode::Element(el) => el,
            HtmlNode::Text(t) => panic!("expected element, got text {t:?}"),
        }
    }

    #[test]
    fn parses_nested_fragment() {
        let nodes = parse_html("<p>Hello <b>world</b></p>").unwrap();
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.name, "p");
        assert_eq!(p.children.len(), 2);
        assert_eq!(p.text_content(), "Hello world");
    }

    #[test]
    fn full_document_yields_body_children() {
        let html = "<!DOCTYPE html><html><head><title>T</title><style>p{}</style></head>\
                    <body><h1>Title</h1><p>Body</p></body></html>";
        let nodes = parse_html(html).unwrap();
        let names: Vec<_> = nodes
            .iter()
            .filter_map(|n| match n {
                HtmlNode::Element(el) => Some(el.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["h1", "p"]);
    }

    #[test]
    fn names_are_lowercased_and_attributes_kept() {
        let nodes = parse_html(r#"<DIV Style="color: red" ALIGN="center">x</DIV>"#).unwrap();
        let div = element(&nodes[0]);
        assert_eq!(div.name, "div");
        assert_eq!(div.attr("style"), Some("color: red"));
        assert_eq!(div.attr("align"), Some("center"));
    }

    #[test]
    fn scripts_and_comments_are_dropped() {
        let nodes = parse_html("<p>a<!-- hidden --><script>var x;</script>b</p>").unwrap();
        assert_eq!(element(&nodes[0]).text_content(), "ab");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&#169; &#xA9;"), "\u{A9} \u{A9}");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{A0}b");
        assert_eq!(decode_entities("AT&T & co"), "AT&T & co");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
    }

    #[test]
    fn attribute_values_are_decoded() {
        let nodes = parse_html(r#"<a href="/q?a=1&amp;b=2">link</a>"#).unwrap();
        assert_eq!(element(&nodes[0]).attr("href"), Some("/q?a=1&b=2"));
    }
}
