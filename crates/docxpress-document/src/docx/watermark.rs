// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text watermark rendered as a VML WordArt shape in the header.
//
// This is the construct word processors emit for their own "DRAFT" style
// watermarks: a page-centred text path behind the body text, repeated on
// every page because it lives in the default header.

use docxpress_core::error::Result;
use docxpress_core::types::WatermarkOptions;

use super::xml::XmlWriter;
use crate::html::style::{first_font_family, parse_color};
use crate::html::{Declarations, Element, HtmlNode, parse_html};

pub const VML_NAMESPACE: &str = "urn:schemas-microsoft-com:vml";
pub const OFFICE_NAMESPACE: &str = "urn:schemas-microsoft-com:office:office";
pub const WORD10_NAMESPACE: &str = "urn:schemas-microsoft-com:office:word";

const DEFAULT_COLOR: &str = "C0C0C0";
const DEFAULT_FONT: &str = "Calibri";

/// Shape-type formulas of the plain text WordArt preset (`o:spt="136"`).
const TEXT_PATH_FORMULAS: &[&str] = &[
    "sum #0 0 10800",
    "prod #0 2 1",
    "sum 21600 0 @1",
    "sum 0 0 @2",
    "sum 21600 0 @3",
    "if @0 @3 0",
    "if @0 21600 @1",
    "if @0 0 @2",
    "if @0 @4 21600",
    "mid @5 @6",
    "mid @8 @5",
    "mid @7 @8",
    "mid @6 @7",
    "sum @6 0 @5",
];

/// A resolved watermark ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub width_pt: f64,
    pub height_pt: f64,
    /// Clockwise rotation normalised to `[0, 360)`.
    pub rotation_deg: f64,
    pub opacity: f64,
    /// Fill colour as `RRGGBB`.
    pub color: String,
    pub font: String,
}

impl Watermark {
    /// Resolve watermark options. Returns `None` when the HTML has no
    /// visible text.
    pub fn from_options(options: &WatermarkOptions) -> Result<Option<Self>> {
        let nodes = parse_html(&options.html)?;
        let text = nodes
            .iter()
            .map(node_text)
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return Ok(None);
        }

        let color = find_style(&nodes, &|el| {
            el.attr("style")
                .map(Declarations::parse)
                .and_then(|d| d.get("color").and_then(parse_color))
                .or_else(|| el.attr("color").and_then(parse_color))
        })
        .unwrap_or_else(|| DEFAULT_COLOR.to_owned());

        let font = find_style(&nodes, &|el| {
            el.attr("style")
                .map(Declarations::parse)
                .and_then(|d| d.get("font-family").and_then(first_font_family))
                .or_else(|| el.attr("face").and_then(first_font_family))
        })
        .unwrap_or_else(|| DEFAULT_FONT.to_owned());

        Ok(Some(Self {
            text,
            width_pt: options.width_pt,
            height_pt: options.height_pt,
            rotation_deg: normalize_rotation(options.rotation_deg),
            opacity: options.opacity.clamp(0.0, 1.0),
            color,
            font,
        }))
    }

    /// Write the watermark as a run (`w:r` containing `w:pict`).
    pub fn write_run(&self, w: &mut XmlWriter) -> Result<()> {
        w.start("w:r", &[])?;
        w.start("w:rPr", &[])?;
        w.empty("w:noProof", &[])?;
        w.end("w:rPr")?;
        w.start("w:pict", &[])?;

        write_shape_type(w)?;

        let style = format!(
            "position:absolute;margin-left:0;margin-top:0;width:{}pt;height:{}pt;\
             rotation:{};z-index:-251657216;mso-position-horizontal:center;\
             mso-position-horizontal-relative:page;mso-position-vertical:center;\
             mso-position-vertical-relative:page",
            self.width_pt, self.height_pt, self.rotation_deg
        );
        let fill = format!("#{}", self.color);
        w.start(
            "v:shape",
            &[
                ("id", "PowerPlusWaterMarkObject1"),
                ("o:spid", "_x0000_s2049"),
                ("type", "#_x0000_t136"),
                ("style", &style),
                ("o:allowincell", "f"),
                ("fillcolor", &fill),
                ("stroked", "f"),
            ],
        )?;
        w.empty("v:fill", &[("opacity", &self.opacity.to_string())])?;
        let text_style = format!("font-family:\"{}\";font-size:1pt", self.font);
        w.empty(
            "v:textpath",
            &[("style", &text_style), ("string", &self.text)],
        )?;
        w.empty("w10:wrap", &[("anchorx", "page"), ("anchory", "page")])?;
        w.end("v:shape")?;

        w.end("w:pict")?;
        w.end("w:r")
    }
}

fn write_shape_type(w: &mut XmlWriter) -> Result<()> {
    w.start(
        "v:shapetype",
        &[
            ("id", "_x0000_t136"),
            ("coordsize", "21600,21600"),
            ("o:spt", "136"),
            ("adj", "10800"),
            ("path", "m@7,l@8,m@5,21600l@6,21600e"),
        ],
    )?;
    w.start("v:formulas", &[])?;
    for eqn in TEXT_PATH_FORMULAS {
        w.empty("v:f", &[("eqn", eqn)])?;
    }
    w.end("v:formulas")?;
    w.empty(
        "v:path",
        &[
            ("textpathok", "t"),
            ("o:connecttype", "custom"),
            ("o:connectlocs", "@9,0;@10,10800;@11,21600;@12,10800"),
            ("o:connectangles", "270,180,90,0"),
        ],
    )?;
    w.empty("v:textpath", &[("on", "t"), ("fitshape", "t")])?;
    w.start("v:handles", &[])?;
    w.empty("v:h", &[("position", "#0,bottomRight"), ("xrange", "6629,14971")])?;
    w.end("v:handles")?;
    w.empty("o:lock", &[("v:ext", "edit"), ("text", "t"), ("shapetype", "t")])?;
    w.end("v:shapetype")
}

/// Map any angle onto `[0, 360)`.
pub fn normalize_rotation(deg: f64) -> f64 {
    let normalized = deg.rem_euclid(360.0);
    if normalized.is_finite() { normalized } else { 0.0 }
}

fn node_text(node: &HtmlNode) -> String {
    match node {
        HtmlNode::Text(text) => text.clone(),
        // Block boundaries separate words.
        HtmlNode::Element(el) => format!(" {} ", el.text_content()),
    }
}

/// First value produced by `pick` in document order.
fn find_style(nodes: &[HtmlNode], pick: &dyn Fn(&Element) -> Option<String>) -> Option<String> {
    nodes.iter().find_map(|node| match node {
        HtmlNode::Element(el) => pick(el).or_else(|| find_style(&el.children, pick)),
        HtmlNode::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(html: &str) -> WatermarkOptions {
        WatermarkOptions {
            html: html.into(),
            width_pt: 200.0,
            height_pt: 100.0,
            rotation_deg: -45.0,
            opacity: 0.2,
        }
    }

    #[test]
    fn resolves_text_color_and_font() {
        let wm = Watermark::from_options(&options(
            r#"<div style="font-family: 'Arial Black'"><span style="color: red">CONFIDENTIAL</span>
               copy</div>"#,
        ))
        .unwrap()
        .unwrap();
        assert_eq!(wm.text, "CONFIDENTIAL copy");
        assert_eq!(wm.color, "FF0000");
        assert_eq!(wm.font, "Arial Black");
        assert_eq!(wm.rotation_deg, 315.0);
    }

    #[test]
    fn defaults_and_empty_text() {
        let wm = Watermark::from_options(&options("<p>DRAFT</p>")).unwrap().unwrap();
        assert_eq!(wm.color, DEFAULT_COLOR);
        assert_eq!(wm.font, DEFAULT_FONT);
        assert!(Watermark::from_options(&options("<p>  </p>")).unwrap().is_none());
    }

    #[test]
    fn rotation_is_normalized() {
        assert_eq!(normalize_rotation(-45.0), 315.0);
        assert_eq!(normalize_rotation(180.0), 180.0);
        assert_eq!(normalize_rotation(-180.0), 180.0);
        assert_eq!(normalize_rotation(0.0), 0.0);
    }

    #[test]
    fn writes_vml_shape() {
        let wm = Watermark::from_options(&options("<b>DRAFT</b>")).unwrap().unwrap();
        let mut w = XmlWriter::new().unwrap();
        wm.write_run(&mut w).unwrap();
        let xml = String::from_utf8(w.finish()).unwrap();
        assert!(xml.contains(r#"string="DRAFT""#));
        assert!(xml.contains("width:200pt;height:100pt;rotation:315"));
        assert!(xml.contains(r#"<v:fill opacity="0.2"/>"#));
        assert!(xml.contains(r##"fillcolor="#C0C0C0""##));
    }
}
