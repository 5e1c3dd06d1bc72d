// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF serialisation using `printpdf` 0.8.
//
// Pages are built as `Vec<Op>` lists from the composed page layouts and saved
// with `PdfDocument::save`. Text uses the fourteen standard fonts, so glyphs
// outside Windows-1252 are replaced.

use printpdf::color::Color as PdfColor;
use printpdf::graphics::{LinePoint, PaintMode, Polygon, PolygonRing, WindingOrder};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, Rgb, TextItem,
    TextMatrix,
};
use tracing::{debug, instrument};

use docxpress_core::error::Result;
use docxpress_core::types::GenerateOptions;

use super::compose::{PageGeometry, PageLayout, Regions, paginate};
use super::layout::{Color, Draw, FontFace, FontFamily, Piece, TextLayout};
use crate::docx::{HtmlConverter, Numbering, Watermark};

/// Title written to the document information dictionary.
const PDF_TITLE: &str = "Document";
/// Share of the watermark box height used as font size.
const WATERMARK_FILL: f32 = 0.8;

/// Renders HTML stories into a paginated PDF.
pub struct PdfGenerator;

impl PdfGenerator {
    /// Build a PDF from body HTML plus optional header and footer HTML.
    ///
    /// The header is drawn at the top of every page and the footer at the
    /// bottom of every page, or only the last one when
    /// `options.footer_last_page_only` is set. The watermark sits centred
    /// beneath the content of every page.
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
        let geometry = PageGeometry::new(&defaults.page, options.orientation);

        let mut numbering = Numbering::default();
        let mut converter = HtmlConverter::new(&mut numbering, defaults.font_size_pt);
        let body = converter.convert_html(content)?;
        let header_blocks = if options.header {
            converter.convert_html(header.unwrap_or_default())?
        } else {
            Vec::new()
        };
        let footer_blocks = if options.footer {
            converter.convert_html(footer.unwrap_or_default())?
        } else {
            Vec::new()
        };

        let watermark = match &options.watermark {
            Some(mark) => Watermark::from_options(mark)?,
            None => None,
        };

        let width = geometry.content_width();
        let mut layout = TextLayout::new(
            &numbering,
            FontFamily::from_name(&defaults.font_family),
            defaults.font_size_pt,
        );
        let body = layout.layout(&body, width);
        let header = layout.layout(&header_blocks, width);
        let footer = layout.layout(&footer_blocks, width);

        let regions = Regions {
            header: &header,
            footer: &footer,
            footer_last_page_only: options.footer && options.footer_last_page_only,
        };
        let pages = paginate(body, &geometry, regions);

        let page_w = Mm(geometry.width * 25.4 / 72.0);
        let page_h = Mm(geometry.height * 25.4 / 72.0);
        let pdf_pages: Vec<PdfPage> = pages
            .iter()
            .map(|page| {
                let mut ops = Vec::new();
                if let Some(mark) = &watermark {
                    watermark_ops(mark, &geometry, &mut ops);
                }
                page_ops(page, geometry.height, &mut ops);
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        let mut doc = PdfDocument::new(PDF_TITLE);
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        debug!(
            pages = pages.len(),
            warnings = warnings.len(),
            bytes = output.len(),
            "PDF assembled"
        );
        Ok(output)
    }
}

fn pdf_color(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(color.r, color.g, color.b, None))
}

/// A point in PDF space from top-left page coordinates.
fn point(x: f32, y: f32, page_height: f32) -> LinePoint {
    LinePoint {
        p: Point {
            x: Pt(x),
            y: Pt(page_height - y),
        },
        bezier: false,
    }
}

fn page_ops(page: &PageLayout, page_height: f32, ops: &mut Vec<Op>) {
    for draw in &page.draws {
        match draw {
            Draw::Text { x, baseline, fragment } => {
                let Piece::Text(text) = &fragment.piece else {
                    continue;
                };
                let text = win_ansi(text);
                if text.trim().is_empty() {
                    continue;
                }
                let font = fragment.face.builtin();
                ops.push(Op::StartTextSection);
                ops.push(Op::SetFillColor {
                    col: pdf_color(fragment.color),
                });
                ops.push(Op::SetTextCursor {
                    pos: Point {
                        x: Pt(*x),
                        y: Pt(page_height - baseline),
                    },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(fragment.size_pt),
                    font,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(text)],
                    font,
                });
                ops.push(Op::EndTextSection);
            }
            Draw::Fill { x, y, width, height, color } => {
                let polygon = Polygon {
                    rings: vec![PolygonRing {
                        points: vec![
                            point(*x, *y, page_height),
                            point(x + width, *y, page_height),
                            point(x + width, y + height, page_height),
                            point(*x, y + height, page_height),
                        ],
                    }],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::EvenOdd,
                };
                ops.push(Op::SetFillColor { col: pdf_color(*color) });
                ops.push(Op::DrawPolygon { polygon });
            }
            Draw::Rule { x1, y1, x2, y2, thickness, color } => {
                let polygon = Polygon {
                    rings: vec![PolygonRing {
                        points: vec![point(*x1, *y1, page_height), point(*x2, *y2, page_height)],
                    }],
                    mode: PaintMode::Stroke,
                    winding_order: WindingOrder::EvenOdd,
                };
                ops.push(Op::SetOutlineThickness { pt: Pt(*thickness) });
                ops.push(Op::SetOutlineColor { col: pdf_color(*color) });
                ops.push(Op::DrawPolygon { polygon });
            }
        }
    }
}

/// Font size that fits `text` inside the watermark box.
fn watermark_size(mark: &Watermark, face: &FontFace) -> f32 {
    let chars = mark.text.chars().count().max(1) as f32;
    let by_height = mark.height_pt as f32 * WATERMARK_FILL;
    let by_width = mark.width_pt as f32 / face.measure(chars, 1.0);
    by_height.min(by_width).max(1.0)
}

/// Rotated watermark text centred on the page. Opacity is approximated by
/// blending the fill colour towards white.
fn watermark_ops(mark: &Watermark, geometry: &PageGeometry, ops: &mut Vec<Op>) {
    let face = FontFace {
        family: FontFamily::from_name(&mark.font),
        bold: false,
        italic: false,
    };
    let size = watermark_size(mark, &face);
    let text_width = face.measure(mark.text.chars().count() as f32, size);
    let color = Color::from_hex(&mark.color)
        .unwrap_or(Color::GRAY)
        .over_white(mark.opacity as f32);

    // Stored rotation is clockwise; PDF angles run counter-clockwise.
    let angle = (360.0 - mark.rotation_deg as f32).rem_euclid(360.0);
    let (sin, cos) = angle.to_radians().sin_cos();
    let (cx, cy) = (geometry.width / 2.0, geometry.height / 2.0);
    let half = text_width / 2.0;
    let lift = size * 0.35;
    let x = cx - half * cos + lift * sin;
    let y = cy - half * sin - lift * cos;

    let font = face.builtin();
    ops.push(Op::StartTextSection);
    ops.push(Op::SetFillColor { col: pdf_color(color) });
    ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size), font });
    ops.push(Op::SetTextMatrix {
        matrix: TextMatrix::TranslateRotate(Pt(x), Pt(y), angle),
    });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(win_ansi(&mark.text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Replace characters the standard fonts cannot encode.
fn win_ansi(text: &str) -> String {
    /// Code points Windows-1252 maps into 0x80..=0x9F.
    const EXTRA: [u32; 27] = [
        0x20AC, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
        0x0152, 0x017D, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122,
        0x0161, 0x203A, 0x0153, 0x017E, 0x0178,
    ];
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            ' '..='~' | '\u{A0}'..='\u{FF}' => c,
            c if EXTRA.contains(&u32::from(c)) => c,
            _ => '?',
        })
        .collect()
}
