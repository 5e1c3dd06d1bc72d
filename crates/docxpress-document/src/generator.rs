// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document generation: HTML stories in, `.docx` bytes out.
//
// `DocumentGenerator::generate` converts the body, header, and footer HTML
// into one package. `render_request` is the complete `/generate-docx`
// pipeline on top of it and `render_format` the `/generate-document` one;
// `demo_document` builds the fixed test document.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

use docxpress_core::error::Result;
use docxpress_core::types::{DocumentDefaults, DocumentRequest, DocumentType, GenerateOptions};

use crate::docx::package::{self, Package, Relationships, content_type, rel_type};
use crate::docx::writer::{self, SectionRefs, StoryWriter};
use crate::docx::{HtmlConverter, Numbering, Watermark};
use crate::inline::CssInliner;
use crate::pdf::PdfGenerator;

/// Body of the demonstration document.
pub const DEMO_CONTENT_HTML: &str =
    "<p>This is a simple test document generated from hardcoded HTML</p>";

/// Header of the demonstration document.
pub const DEMO_HEADER_HTML: &str = "<h1>ACME Corporation - Confidential</h1>";

/// Footer of the demonstration document for the given date.
pub fn demo_footer_html(date: NaiveDate) -> String {
    format!(
        "<div style=\"text-align: center; font-size: 10px; color: #666;\">\
         Page {{page_number}} | Generated on {}</div>",
        date.format("%-m/%-d/%Y")
    )
}

/// Converts HTML stories into a WordprocessingML package.
pub struct DocumentGenerator;

impl DocumentGenerator {
    /// Build a `.docx` from body HTML plus optional header and footer HTML.
    ///
    /// A header part is written when `options.header` is set or a watermark
    /// is requested; a footer part only when `options.footer` is set. Absent
    /// header or footer HTML yields an empty region.
    #[instrument(skip_all, fields(
        content_len = content.len(),
        header = options.header,
        footer = options.footer,
        watermark = options.watermark.is_some(),
    ))]
    pub fn generate(
        content: &str,
        header: Option<&str>,
        options: &GenerateOptions,
        footer: Option<&str>,
    ) -> Result<Vec<u8>> {
        let defaults = &options.defaults;
        let width = defaults.page.content_width(options.orientation);

        let mut numbering = Numbering::default();
        let mut converter = HtmlConverter::new(&mut numbering, defaults.font_size_pt);
        let body = converter.convert_html(content)?;
        let header_blocks = if options.header {
            Some(converter.convert_html(header.unwrap_or_default())?)
        } else {
            None
        };
        let footer_blocks = if options.footer {
            Some(converter.convert_html(footer.unwrap_or_default())?)
        } else {
            None
        };

        let watermark = match &options.watermark {
            Some(mark) => Watermark::from_options(mark)?,
            None => None,
        };

        let mut doc_rels = Relationships::default();
        doc_rels.add(rel_type::STYLES, "styles.xml");
        doc_rels.add(rel_type::NUMBERING, "numbering.xml");
        doc_rels.add(rel_type::SETTINGS, "settings.xml");
        let mut section = SectionRefs::default();
        let mut story_parts = Vec::new();

        if header_blocks.is_some() || watermark.is_some() {
            let blocks = header_blocks.unwrap_or_default();
            let mut rels = Relationships::default();
            let xml = StoryWriter::header(&blocks, &mut rels, width, watermark.as_ref())?;
            story_parts.push(("header1.xml", content_type::HEADER, xml, rels));
            section.header = Some(doc_rels.add(rel_type::HEADER, "header1.xml"));
        }

        let last_page_footer = options.footer && options.footer_last_page_only;
        if let Some(blocks) = footer_blocks {
            let mut rels = Relationships::default();
            let xml = StoryWriter::footer(&blocks, &mut rels, width, last_page_footer)?;
            story_parts.push(("footer1.xml", content_type::FOOTER, xml, rels));
            section.footer = Some(doc_rels.add(rel_type::FOOTER, "footer1.xml"));
        }

        let document = StoryWriter::document(
            &body,
            &mut doc_rels,
            defaults,
            options.orientation,
            &section,
        )?;

        let mut package = Package::new();
        package.add_part("word/document.xml", content_type::DOCUMENT, document);
        package.add_relationships("word/_rels/document.xml.rels", &doc_rels)?;
        package.add_part("word/styles.xml", content_type::STYLES, writer::styles(defaults)?);
        package.add_part("word/numbering.xml", content_type::NUMBERING, numbering.to_xml()?);
        package.add_part(
            "word/settings.xml",
            content_type::SETTINGS,
            writer::settings(last_page_footer)?,
        );
        for (name, ct, xml, rels) in story_parts {
            package.add_part(&format!("word/{name}"), ct, xml);
            if !rels.is_empty() {
                package.add_relationships(&format!("word/_rels/{name}.rels"), &rels)?;
            }
        }
        package.add_part(
            "docProps/core.xml",
            content_type::CORE_PROPERTIES,
            package::core_properties(options.created)?,
        );
        package.add_part(
            "docProps/app.xml",
            content_type::EXTENDED_PROPERTIES,
            package::app_properties()?,
        );
        package.add_relationships("_rels/.rels", &package::package_relationships())?;

        debug!(
            body_blocks = body.len(),
            lists = numbering.instances().len(),
            "document assembled"
        );
        package.to_bytes()
    }
}

/// Validate a request, inline its CSS, and generate the document.
///
/// Header and footer HTML are inlined independently of the body.
pub fn render_request(
    request: &DocumentRequest,
    inliner: &CssInliner,
    defaults: &DocumentDefaults,
) -> Result<Vec<u8>> {
    let content = request.validate()?;
    let options = GenerateOptions::for_request(request, defaults);

    let content = inliner.inline(content)?;
    let header = inliner.inline(request.header_html())?;
    let footer = inliner.inline(request.footer_html())?;

    let bytes = DocumentGenerator::generate(&content, Some(&header), &options, Some(&footer))?;
    info!(bytes = bytes.len(), footer = options.footer, "document generated");
    Ok(bytes)
}

/// Inline a request's CSS and render it in the requested format.
///
/// The request is assumed validated; only the presence of `content_html` is
/// rechecked.
pub fn render_format(
    kind: DocumentType,
    request: &DocumentRequest,
    inliner: &CssInliner,
    defaults: &DocumentDefaults,
) -> Result<Vec<u8>> {
    if kind == DocumentType::Docx {
        return render_request(request, inliner, defaults);
    }

    let content = request.validate()?;
    let options = GenerateOptions::for_request(request, defaults);

    let content = inliner.inline(content)?;
    let header = inliner.inline(request.header_html())?;
    let footer = inliner.inline(request.footer_html())?;

    let bytes = PdfGenerator::generate(&content, Some(&header), &options, Some(&footer))?;
    info!(bytes = bytes.len(), footer = options.footer, "PDF generated");
    Ok(bytes)
}

/// The fixed demonstration document, footer dated today (local time).
pub fn demo_document(defaults: &DocumentDefaults) -> Result<Vec<u8>> {
    let footer = demo_footer_html(Local::now().date_naive());
    let options = GenerateOptions {
        header: true,
        footer: true,
        defaults: defaults.clone(),
        ..GenerateOptions::default()
    };
    DocumentGenerator::generate(DEMO_CONTENT_HTML, Some(DEMO_HEADER_HTML), &options, Some(&footer))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use chrono::{TimeZone, Utc};
    use docxpress_core::DocxpressError;
    use docxpress_core::types::{Orientation, WatermarkOptions};

    use super::*;

    fn part(bytes: &[u8], name: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        Some(out)
    }

    fn fixed_options() -> GenerateOptions {
        GenerateOptions {
            created: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            ..GenerateOptions::default()
        }
    }

    #[test]
    fn generates_minimal_package() {
        let bytes =
            DocumentGenerator::generate("<p>Hello</p>", None, &fixed_options(), None).unwrap();
        assert!(bytes.starts_with(b"PK"));
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "word/settings.xml",
            "word/header1.xml",
            "docProps/core.xml",
            "docProps/app.xml",
        ] {
            assert!(part(&bytes, name).is_some(), "missing {name}");
        }
        assert!(part(&bytes, "word/footer1.xml").is_none());
        let doc = part(&bytes, "word/document.xml").unwrap();
        assert!(doc.contains("Hello"));
        assert!(doc.contains("w:headerReference"));
        assert!(!doc.contains("w:footerReference"));
    }

    #[test]
    fn header_flag_off_and_footer_on() {
        let options = GenerateOptions {
            header: false,
            footer: true,
            ..fixed_options()
        };
        let bytes = DocumentGenerator::generate(
            "<p>x</p>",
            Some("<p>ignored</p>"),
            &options,
            Some("<p>Page {page_number}</p>"),
        )
        .unwrap();
        assert!(part(&bytes, "word/header1.xml").is_none());
        let footer = part(&bytes, "word/footer1.xml").unwrap();
        assert!(footer.contains(" PAGE "));
        let types = part(&bytes, "[Content_Types].xml").unwrap();
        assert!(types.contains("/word/footer1.xml"));
        assert!(!types.contains("/word/header1.xml"));
    }

    #[test]
    fn landscape_swaps_page_size() {
        let options = GenerateOptions {
            orientation: Orientation::Landscape,
            ..fixed_options()
        };
        let bytes = DocumentGenerator::generate("<p>x</p>", None, &options, None).unwrap();
        let doc = part(&bytes, "word/document.xml").unwrap();
        assert!(doc.contains(r#"<w:pgSz w:w="15840" w:h="12240" w:orient="landscape"/>"#));
    }

    #[test]
    fn same_input_gives_identical_bytes() {
        let options = fixed_options();
        let html = "<h1>T</h1><ol><li>a</li></ol><table border=\"1\"><tr><td>c</td></tr></table>";
        let a = DocumentGenerator::generate(html, Some("<b>H</b>"), &options, None).unwrap();
        let b = DocumentGenerator::generate(html, Some("<b>H</b>"), &options, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn watermark_creates_header_even_without_header_flag() {
        let options = GenerateOptions {
            header: false,
            watermark: Some(WatermarkOptions {
                html: "<p>DRAFT</p>".into(),
                width_pt: 300.0,
                height_pt: 150.0,
                rotation_deg: -45.0,
                opacity: 0.5,
            }),
            ..fixed_options()
        };
        let bytes = DocumentGenerator::generate("<p>x</p>", None, &options, None).unwrap();
        let header = part(&bytes, "word/header1.xml").unwrap();
        assert!(header.contains(r#"string="DRAFT""#));
        assert!(header.contains("width:300pt;height:150pt;rotation:315"));
    }

    fn assert_well_formed(xml: &str) {
        assert!(
            !xml.chars().any(|c| c < ' ' && !matches!(c, '\t' | '\n' | '\r')),
            "control character in {xml}"
        );
        let mut reader = quick_xml::Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Eof => break,
                quick_xml::events::Event::Start(tag) | quick_xml::events::Event::Empty(tag) => {
                    for attr in tag.attributes() {
                        attr.unwrap();
                    }
                }
                _ => {}
            }
        }
    }

    #[test]
    fn control_characters_never_reach_parts() {
        let options = GenerateOptions {
            watermark: Some(WatermarkOptions {
                html: "<p>DRAFT&#1;X</p>".into(),
                width_pt: 200.0,
                height_pt: 100.0,
                rotation_deg: -45.0,
                opacity: 0.2,
            }),
            ..fixed_options()
        };
        let bytes = DocumentGenerator::generate(
            r#"<p><a href="http://a/&#1;">link</a> <span style="font-family: 'A&#2;B'">f</span></p>"#,
            None,
            &options,
            None,
        )
        .unwrap();

        let header = part(&bytes, "word/header1.xml").unwrap();
        assert!(header.contains(r#"string="DRAFTX""#));
        for name in ["word/header1.xml", "word/document.xml", "word/_rels/document.xml.rels"] {
            assert_well_formed(&part(&bytes, name).unwrap());
        }
        let rels = part(&bytes, "word/_rels/document.xml.rels").unwrap();
        assert!(rels.contains(r#"Target="http://a/""#));
    }

    #[test]
    fn last_page_footer_sets_update_fields() {
        let options = GenerateOptions {
            footer: true,
            footer_last_page_only: true,
            ..fixed_options()
        };
        let bytes =
            DocumentGenerator::generate("<p>x</p>", None, &options, Some("<p>Sign here</p>"))
                .unwrap();
        assert!(part(&bytes, "word/settings.xml").unwrap().contains("w:updateFields"));
        assert!(part(&bytes, "word/footer1.xml").unwrap().contains(" IF "));
    }

    #[test]
    fn hyperlinks_in_header_get_part_relationships() {
        let bytes = DocumentGenerator::generate(
            "<p>x</p>",
            Some(r#"<a href="https://example.com">site</a>"#),
            &fixed_options(),
            None,
        )
        .unwrap();
        let rels = part(&bytes, "word/_rels/header1.xml.rels").unwrap();
        assert!(rels.contains("https://example.com"));
    }

    #[test]
    fn render_request_applies_footer_rule_and_inlines_css() {
        let inliner = CssInliner::new();
        let defaults = DocumentDefaults::default();

        let mut request = DocumentRequest::with_content(
            "<style>.big { font-weight: bold; }</style><p class=\"big\">Styled</p>",
        );
        let bytes = render_request(&request, &inliner, &defaults).unwrap();
        assert!(part(&bytes, "word/footer1.xml").is_none());
        let doc = part(&bytes, "word/document.xml").unwrap();
        assert!(doc.contains("<w:b/>"));
        assert!(doc.contains("Styled"));

        request.footer_html = Some("<p>Footer</p>".into());
        let bytes = render_request(&request, &inliner, &defaults).unwrap();
        assert!(part(&bytes, "word/footer1.xml").unwrap().contains("Footer"));
    }

    #[test]
    fn render_request_rejects_missing_content() {
        let err = render_request(
            &DocumentRequest::default(),
            &CssInliner::new(),
            &DocumentDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DocxpressError::MissingField("content_html")));
    }

    #[test]
    fn render_format_dispatches_on_document_type() {
        let inliner = CssInliner::new();
        let defaults = DocumentDefaults::default();
        let mut request = DocumentRequest::with_content("<style>p { color: red }</style><p>Hi</p>");
        request.watermark_html = Some("<p>DRAFT</p>".into());
        request.footer_html = Some("<p>{page_number}</p>".into());

        let pdf = render_format(DocumentType::Pdf, &request, &inliner, &defaults).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 1);

        let docx = render_format(DocumentType::Docx, &request, &inliner, &defaults).unwrap();
        assert!(part(&docx, "word/document.xml").unwrap().contains("FF0000"));
    }

    #[test]
    fn demo_document_has_header_and_dated_footer() {
        let bytes = demo_document(&DocumentDefaults::default()).unwrap();
        let header = part(&bytes, "word/header1.xml").unwrap();
        assert!(header.contains("ACME Corporation - Confidential"));
        let footer = part(&bytes, "word/footer1.xml").unwrap();
        assert!(footer.contains("Generated on"));
        assert!(footer.contains(" PAGE "));
    }

    #[test]
    fn demo_footer_uses_unpadded_us_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert!(demo_footer_html(date).contains("Generated on 3/7/2026</div>"));
    }
}
