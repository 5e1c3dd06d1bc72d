// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WordprocessingML serialisation of the block model.
//
// One `StoryWriter` renders one story part (document body, header, footer)
// and registers its hyperlinks in that part's relationship set. The fixed
// parts (styles, settings) are written by free functions.

use docxpress_core::error::Result;
use docxpress_core::types::{DocumentDefaults, Orientation, PageSetup};

use super::model::{
    Block, FieldCode, Inline, Paragraph, ParagraphProps, Run, RunContent, RunProps, Table,
    half_points,
};
use super::package::{R_NAMESPACE, Relationships};
use super::watermark::{OFFICE_NAMESPACE, VML_NAMESPACE, WORD10_NAMESPACE, Watermark};
use super::xml::XmlWriter;

pub const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Left plus right default cell margins (108 twips each).
const CELL_MARGINS_TWIPS: u32 = 216;

/// Heading run sizes in half-points, `h1` first.
pub const HEADING_SIZES: [u32; 6] = [32, 28, 26, 24, 22, 20];

/// Section-level references emitted in the body's `w:sectPr`.
#[derive(Debug, Clone, Default)]
pub struct SectionRefs {
    pub header: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextMode {
    /// Visible text (`w:t`).
    Display,
    /// Inside a field instruction (`w:instrText`).
    Instruction,
}

/// Renders one story part.
pub struct StoryWriter<'r> {
    w: XmlWriter,
    rels: &'r mut Relationships,
    /// Style applied to paragraphs without an explicit one.
    default_style: Option<&'static str>,
    /// Wrap each paragraph in `IF PAGE = NUMPAGES`.
    last_page_only: bool,
}

impl<'r> StoryWriter<'r> {
    fn new(rels: &'r mut Relationships) -> Result<Self> {
        Ok(Self {
            w: XmlWriter::new()?,
            rels,
            default_style: None,
            last_page_only: false,
        })
    }

    /// `word/document.xml`.
    pub fn document(
        blocks: &[Block],
        rels: &'r mut Relationships,
        defaults: &DocumentDefaults,
        orientation: Orientation,
        section: &SectionRefs,
    ) -> Result<Vec<u8>> {
        let mut story = Self::new(rels)?;
        let width = defaults.page.content_width(orientation);

        story.w.start(
            "w:document",
            &[("xmlns:w", W_NAMESPACE), ("xmlns:r", R_NAMESPACE)],
        )?;
        story.w.start("w:body", &[])?;
        story.write_story(blocks, width)?;
        story.write_section(&defaults.page, orientation, section)?;
        story.w.end("w:body")?;
        story.w.end("w:document")?;
        Ok(story.w.finish())
    }

    /// `word/header1.xml`; the watermark, if any, rides in the first
    /// paragraph.
    pub fn header(
        blocks: &[Block],
        rels: &'r mut Relationships,
        width: u32,
        watermark: Option<&Watermark>,
    ) -> Result<Vec<u8>> {
        let mut story = Self::new(rels)?;
        story.default_style = Some("Header");

        story.w.start("w:hdr", &story_namespaces())?;
        match (watermark, blocks.split_first()) {
            (Some(mark), Some((Block::Paragraph(first), rest))) => {
                story.write_paragraph_with(first, Some(mark))?;
                story.write_blocks(rest, width)?;
                story.close_story(blocks)?;
            }
            (Some(mark), _) => {
                story.write_paragraph_with(&Paragraph::default(), Some(mark))?;
                if !blocks.is_empty() {
                    story.write_story(blocks, width)?;
                }
            }
            (None, _) => story.write_story(blocks, width)?,
        }
        story.w.end("w:hdr")?;
        Ok(story.w.finish())
    }

    /// `word/footer1.xml`.
    pub fn footer(
        blocks: &[Block],
        rels: &'r mut Relationships,
        width: u32,
        last_page_only: bool,
    ) -> Result<Vec<u8>> {
        let mut story = Self::new(rels)?;
        story.default_style = Some("Footer");
        story.last_page_only = last_page_only;

        story.w.start("w:ftr", &story_namespaces())?;
        story.write_story(blocks, width)?;
        story.w.end("w:ftr")?;
        Ok(story.w.finish())
    }

    // -- Blocks ---------------------------------------------------------------

    /// Blocks followed by the closing paragraph every story needs.
    fn write_story(&mut self, blocks: &[Block], width: u32) -> Result<()> {
        self.write_blocks(blocks, width)?;
        self.close_story(blocks)
    }

    fn close_story(&mut self, blocks: &[Block]) -> Result<()> {
        if !matches!(blocks.last(), Some(Block::Paragraph(_))) {
            self.write_paragraph(&Paragraph::default())?;
        }
        Ok(())
    }

    fn write_blocks(&mut self, blocks: &[Block], width: u32) -> Result<()> {
        for block in blocks {
            match block {
                Block::Paragraph(p) => self.write_paragraph(p)?,
                Block::Table(t) => self.write_table(t, width)?,
            }
        }
        Ok(())
    }

    fn write_paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        self.write_paragraph_with(paragraph, None)
    }

    fn write_paragraph_with(
        &mut self,
        paragraph: &Paragraph,
        watermark: Option<&Watermark>,
    ) -> Result<()> {
        self.w.start("w:p", &[])?;
        self.write_paragraph_props(&paragraph.props)?;
        if let Some(mark) = watermark {
            mark.write_run(&mut self.w)?;
        }

        if self.last_page_only && !paragraph.inlines.is_empty() {
            self.write_last_page_condition(paragraph)?;
        } else {
            for inline in &paragraph.inlines {
                match inline {
                    Inline::Run(run) => self.write_run(run, TextMode::Display)?,
                    Inline::Hyperlink { target, runs } => {
                        let id = self.rels.add_hyperlink(target);
                        self.w.start("w:hyperlink", &[("r:id", &id), ("w:history", "1")])?;
                        for run in runs {
                            self.write_run(run, TextMode::Display)?;
                        }
                        self.w.end("w:hyperlink")?;
                    }
                }
            }
        }

        self.w.end("w:p")
    }

    /// `IF PAGE = NUMPAGES "<content>" ""`: the content runs become part of
    /// the instruction so the word processor shows them only on the last
    /// page.
    fn write_last_page_condition(&mut self, paragraph: &Paragraph) -> Result<()> {
        let plain = RunProps::default();
        self.field_char(&plain, "begin")?;
        self.instruction(&plain, " IF ")?;
        self.write_field(FieldCode::Page, &plain)?;
        self.instruction(&plain, " = ")?;
        self.write_field(FieldCode::NumPages, &plain)?;
        self.instruction(&plain, " \"")?;
        for run in paragraph.inlines.iter().flat_map(Inline::runs) {
            self.write_run(run, TextMode::Instruction)?;
        }
        self.instruction(&plain, "\" \"\" ")?;
        self.field_char(&plain, "separate")?;
        self.field_char(&plain, "end")
    }

    fn write_paragraph_props(&mut self, props: &ParagraphProps) -> Result<()> {
        let style = props
            .style
            .map(|s| s.style_id())
            .or_else(|| self.default_style.map(str::to_owned));
        if style.is_none() && *props == ParagraphProps::default() {
            return Ok(());
        }

        self.w.start("w:pPr", &[])?;
        if let Some(style) = &style {
            self.w.empty("w:pStyle", &[("w:val", style)])?;
        }
        if props.page_break_before {
            self.w.empty("w:pageBreakBefore", &[])?;
        }
        if let Some(numbering) = props.numbering {
            self.w.start("w:numPr", &[])?;
            self.w.empty("w:ilvl", &[("w:val", &numbering.level.to_string())])?;
            self.w.empty("w:numId", &[("w:val", &numbering.num_id.to_string())])?;
            self.w.end("w:numPr")?;
        }
        if props.bottom_border {
            self.w.start("w:pBdr", &[])?;
            self.w.empty(
                "w:bottom",
                &[
                    ("w:val", "single"),
                    ("w:sz", "6"),
                    ("w:space", "1"),
                    ("w:color", "auto"),
                ],
            )?;
            self.w.end("w:pBdr")?;
        }
        if let Some(fill) = &props.shading {
            self.shading(fill)?;
        }
        if props.spacing_before.is_some() || props.spacing_after.is_some() {
            let before = props.spacing_before.map(|v| v.to_string());
            let after = props.spacing_after.map(|v| v.to_string());
            let mut attrs = Vec::new();
            if let Some(before) = &before {
                attrs.push(("w:before", before.as_str()));
            }
            if let Some(after) = &after {
                attrs.push(("w:after", after.as_str()));
            }
            self.w.empty("w:spacing", &attrs)?;
        }
        if let Some(indent) = props.indent_left {
            self.w.empty("w:ind", &[("w:left", &indent.to_string())])?;
        }
        if let Some(align) = props.align {
            self.w.empty("w:jc", &[("w:val", align.ooxml_value())])?;
        }
        self.w.end("w:pPr")
    }

    // -- Runs -----------------------------------------------------------------

    fn write_run(&mut self, run: &Run, mode: TextMode) -> Result<()> {
        match &run.content {
            RunContent::Field(code) => return self.write_field(*code, &run.props),
            RunContent::Text(text) => {
                self.open_run(&run.props)?;
                match mode {
                    TextMode::Display => {
                        self.w.element("w:t", &[("xml:space", "preserve")], text)?;
                    }
                    TextMode::Instruction => {
                        let escaped = text.replace('"', "\\\"");
                        self.w
                            .element("w:instrText", &[("xml:space", "preserve")], &escaped)?;
                    }
                }
            }
            RunContent::LineBreak if mode == TextMode::Instruction => {
                self.open_run(&run.props)?;
                self.w.element("w:instrText", &[("xml:space", "preserve")], " ")?;
            }
            RunContent::LineBreak => {
                self.open_run(&run.props)?;
                self.w.empty("w:br", &[])?;
            }
            RunContent::PageBreak => {
                self.open_run(&run.props)?;
                self.w.empty("w:br", &[("w:type", "page")])?;
            }
            RunContent::Tab => {
                self.open_run(&run.props)?;
                self.w.empty("w:tab", &[])?;
            }
        }
        self.w.end("w:r")
    }

    /// A complete simple field with a placeholder result of `1`.
    fn write_field(&mut self, code: FieldCode, props: &RunProps) -> Result<()> {
        self.field_char(props, "begin")?;
        self.instruction(props, &format!(" {} ", code.instruction()))?;
        self.field_char(props, "separate")?;
        self.open_run(props)?;
        self.w.element("w:t", &[], "1")?;
        self.w.end("w:r")?;
        self.field_char(props, "end")
    }

    fn field_char(&mut self, props: &RunProps, kind: &str) -> Result<()> {
        self.open_run(props)?;
        self.w.empty("w:fldChar", &[("w:fldCharType", kind)])?;
        self.w.end("w:r")
    }

    fn instruction(&mut self, props: &RunProps, text: &str) -> Result<()> {
        self.open_run(props)?;
        self.w.element("w:instrText", &[("xml:space", "preserve")], text)?;
        self.w.end("w:r")
    }

    fn open_run(&mut self, props: &RunProps) -> Result<()> {
        self.w.start("w:r", &[])?;
        self.write_run_props(props)
    }

    fn write_run_props(&mut self, props: &RunProps) -> Result<()> {
        if *props == RunProps::default() {
            return Ok(());
        }

        self.w.start("w:rPr", &[])?;
        if props.hyperlink_style {
            self.w.empty("w:rStyle", &[("w:val", "Hyperlink")])?;
        }
        if let Some(font) = &props.font {
            self.w.empty(
                "w:rFonts",
                &[
                    ("w:ascii", font),
                    ("w:hAnsi", font),
                    ("w:eastAsia", font),
                    ("w:cs", font),
                ],
            )?;
        }
        if props.bold {
            self.w.empty("w:b", &[])?;
            self.w.empty("w:bCs", &[])?;
        }
        if props.italic {
            self.w.empty("w:i", &[])?;
            self.w.empty("w:iCs", &[])?;
        }
        if props.strike {
            self.w.empty("w:strike", &[])?;
        }
        if let Some(color) = &props.color {
            self.w.empty("w:color", &[("w:val", color)])?;
        }
        if let Some(size) = props.size_half_points {
            let size = size.to_string();
            self.w.empty("w:sz", &[("w:val", &size)])?;
            self.w.empty("w:szCs", &[("w:val", &size)])?;
        }
        if props.underline {
            self.w.empty("w:u", &[("w:val", "single")])?;
        }
        if let Some(fill) = &props.shading {
            self.shading(fill)?;
        }
        if props.superscript || props.subscript {
            let value = if props.superscript { "superscript" } else { "subscript" };
            self.w.empty("w:vertAlign", &[("w:val", value)])?;
        }
        self.w.end("w:rPr")
    }

    fn shading(&mut self, fill: &str) -> Result<()> {
        self.w.empty(
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)],
        )
    }

    // -- Tables ---------------------------------------------------------------

    fn write_table(&mut self, table: &Table, width: u32) -> Result<()> {
        let columns = table.grid_columns().max(1);
        let column_width = width / columns;
        let column_width_attr = column_width.to_string();

        self.w.start("w:tbl", &[])?;
        self.w.start("w:tblPr", &[])?;
        if table.borders {
            self.w.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
        }
        self.w.empty("w:tblW", &[("w:w", "5000"), ("w:type", "pct")])?;
        self.w.end("w:tblPr")?;

        self.w.start("w:tblGrid", &[])?;
        for _ in 0..columns {
            self.w.empty("w:gridCol", &[("w:w", &column_width_attr)])?;
        }
        self.w.end("w:tblGrid")?;

        for row in &table.rows {
            self.w.start("w:tr", &[])?;
            if row.header {
                self.w.start("w:trPr", &[])?;
                self.w.empty("w:tblHeader", &[])?;
                self.w.end("w:trPr")?;
            }
            for cell in &row.cells {
                let span = cell.col_span.max(1);
                let cell_width = column_width * span;

                self.w.start("w:tc", &[])?;
                self.w.start("w:tcPr", &[])?;
                self.w.empty(
                    "w:tcW",
                    &[("w:w", &cell_width.to_string()), ("w:type", "dxa")],
                )?;
                if span > 1 {
                    self.w.empty("w:gridSpan", &[("w:val", &span.to_string())])?;
                }
                if let Some(fill) = &cell.shading {
                    self.shading(fill)?;
                }
                self.w.end("w:tcPr")?;
                self.write_story(&cell.blocks, cell_width.saturating_sub(CELL_MARGINS_TWIPS))?;
                self.w.end("w:tc")?;
            }
            self.w.end("w:tr")?;
        }

        self.w.end("w:tbl")
    }

    // -- Section --------------------------------------------------------------

    fn write_section(
        &mut self,
        page: &PageSetup,
        orientation: Orientation,
        section: &SectionRefs,
    ) -> Result<()> {
        let (width, height) = page.dimensions(orientation);

        self.w.start("w:sectPr", &[])?;
        if let Some(id) = &section.header {
            self.w
                .empty("w:headerReference", &[("w:type", "default"), ("r:id", id)])?;
        }
        if let Some(id) = &section.footer {
            self.w
                .empty("w:footerReference", &[("w:type", "default"), ("r:id", id)])?;
        }
        self.w.empty(
            "w:pgSz",
            &[
                ("w:w", &width.to_string()),
                ("w:h", &height.to_string()),
                ("w:orient", orientation.ooxml_value()),
            ],
        )?;
        self.w.empty(
            "w:pgMar",
            &[
                ("w:top", &page.margin_top.to_string()),
                ("w:right", &page.margin_right.to_string()),
                ("w:bottom", &page.margin_bottom.to_string()),
                ("w:left", &page.margin_left.to_string()),
                ("w:header", &page.header_distance.to_string()),
                ("w:footer", &page.footer_distance.to_string()),
                ("w:gutter", "0"),
            ],
        )?;
        self.w.end("w:sectPr")
    }
}

fn story_namespaces() -> [(&'static str, &'static str); 5] {
    [
        ("xmlns:w", W_NAMESPACE),
        ("xmlns:r", R_NAMESPACE),
        ("xmlns:v", VML_NAMESPACE),
        ("xmlns:o", OFFICE_NAMESPACE),
        ("xmlns:w10", WORD10_NAMESPACE),
    ]
}

// ---------------------------------------------------------------------------
// Fixed parts
// ---------------------------------------------------------------------------

/// `word/styles.xml`: document defaults plus the styles the converter
/// references.
pub fn styles(defaults: &DocumentDefaults) -> Result<Vec<u8>> {
    let font = defaults.font_family.as_str();
    let size = half_points(defaults.font_size_pt).to_string();

    let mut w = XmlWriter::new()?;
    w.start("w:styles", &[("xmlns:w", W_NAMESPACE)])?;

    w.start("w:docDefaults", &[])?;
    w.start("w:rPrDefault", &[])?;
    w.start("w:rPr", &[])?;
    w.empty(
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:eastAsia", font), ("w:cs", font)],
    )?;
    w.empty("w:sz", &[("w:val", &size)])?;
    w.empty("w:szCs", &[("w:val", &size)])?;
    w.empty("w:lang", &[("w:val", "en-US"), ("w:eastAsia", "en-US"), ("w:bidi", "ar-SA")])?;
    w.end("w:rPr")?;
    w.end("w:rPrDefault")?;
    w.start("w:pPrDefault", &[])?;
    w.start("w:pPr", &[])?;
    w.empty("w:spacing", &[("w:after", "120"), ("w:line", "240"), ("w:lineRule", "auto")])?;
    w.end("w:pPr")?;
    w.end("w:pPrDefault")?;
    w.end("w:docDefaults")?;

    style_open(&mut w, "paragraph", "Normal", "Normal", true)?;
    w.empty("w:qFormat", &[])?;
    w.end("w:style")?;

    for (idx, size) in HEADING_SIZES.iter().enumerate() {
        let level = idx + 1;
        let id = format!("Heading{level}");
        let name = format!("heading {level}");
        style_open(&mut w, "paragraph", &id, &name, false)?;
        w.empty("w:basedOn", &[("w:val", "Normal")])?;
        w.empty("w:next", &[("w:val", "Normal")])?;
        w.empty("w:qFormat", &[])?;
        w.start("w:pPr", &[])?;
        w.empty("w:keepNext", &[])?;
        w.empty("w:spacing", &[("w:before", "240"), ("w:after", "60")])?;
        w.empty("w:outlineLvl", &[("w:val", &idx.to_string())])?;
        w.end("w:pPr")?;
        w.start("w:rPr", &[])?;
        w.empty("w:b", &[])?;
        w.empty("w:bCs", &[])?;
        w.empty("w:sz", &[("w:val", &size.to_string())])?;
        w.empty("w:szCs", &[("w:val", &size.to_string())])?;
        w.end("w:rPr")?;
        w.end("w:style")?;
    }

    style_open(&mut w, "paragraph", "ListParagraph", "List Paragraph", false)?;
    w.empty("w:basedOn", &[("w:val", "Normal")])?;
    w.empty("w:qFormat", &[])?;
    w.start("w:pPr", &[])?;
    w.empty("w:contextualSpacing", &[])?;
    w.end("w:pPr")?;
    w.end("w:style")?;

    style_open(&mut w, "paragraph", "HTMLPreformatted", "HTML Preformatted", false)?;
    w.empty("w:basedOn", &[("w:val", "Normal")])?;
    w.start("w:pPr", &[])?;
    w.empty("w:spacing", &[("w:after", "0")])?;
    w.end("w:pPr")?;
    w.start("w:rPr", &[])?;
    w.empty("w:rFonts", &[("w:ascii", "Courier New"), ("w:hAnsi", "Courier New"), ("w:cs", "Courier New")])?;
    w.empty("w:sz", &[("w:val", "20")])?;
    w.end("w:rPr")?;
    w.end("w:style")?;

    for (id, name) in [("Header", "header"), ("Footer", "footer")] {
        style_open(&mut w, "paragraph", id, name, false)?;
        w.empty("w:basedOn", &[("w:val", "Normal")])?;
        w.start("w:pPr", &[])?;
        w.start("w:tabs", &[])?;
        w.empty("w:tab", &[("w:val", "center"), ("w:pos", "4320")])?;
        w.empty("w:tab", &[("w:val", "right"), ("w:pos", "8640")])?;
        w.end("w:tabs")?;
        w.empty("w:spacing", &[("w:after", "0")])?;
        w.end("w:pPr")?;
        w.end("w:style")?;
    }

    style_open(&mut w, "character", "Hyperlink", "Hyperlink", false)?;
    w.start("w:rPr", &[])?;
    w.empty("w:color", &[("w:val", "0563C1")])?;
    w.empty("w:u", &[("w:val", "single")])?;
    w.end("w:rPr")?;
    w.end("w:style")?;

    style_open(&mut w, "table", "TableNormal", "Normal Table", true)?;
    w.start("w:tblPr", &[])?;
    w.empty("w:tblInd", &[("w:w", "0"), ("w:type", "dxa")])?;
    w.start("w:tblCellMar", &[])?;
    w.empty("w:top", &[("w:w", "0"), ("w:type", "dxa")])?;
    w.empty("w:left", &[("w:w", "108"), ("w:type", "dxa")])?;
    w.empty("w:bottom", &[("w:w", "0"), ("w:type", "dxa")])?;
    w.empty("w:right", &[("w:w", "108"), ("w:type", "dxa")])?;
    w.end("w:tblCellMar")?;
    w.end("w:tblPr")?;
    w.end("w:style")?;

    style_open(&mut w, "table", "TableGrid", "Table Grid", false)?;
    w.empty("w:basedOn", &[("w:val", "TableNormal")])?;
    w.start("w:tblPr", &[])?;
    w.start("w:tblBorders", &[])?;
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        w.empty(
            side,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    w.end("w:tblBorders")?;
    w.end("w:tblPr")?;
    w.end("w:style")?;

    w.end("w:styles")?;
    Ok(w.finish())
}

fn style_open(
    w: &mut XmlWriter,
    kind: &str,
    id: &str,
    name: &str,
    default: bool,
) -> Result<()> {
    let mut attrs = vec![("w:type", kind)];
    if default {
        attrs.push(("w:default", "1"));
    }
    attrs.push(("w:styleId", id));
    w.start("w:style", &attrs)?;
    w.empty("w:name", &[("w:val", name)])
}

/// `word/settings.xml`. `update_fields` asks the word processor to refresh
/// fields when the file is opened.
pub fn settings(update_fields: bool) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.start("w:settings", &[("xmlns:w", W_NAMESPACE)])?;
    w.empty("w:defaultTabStop", &[("w:val", "720")])?;
    if update_fields {
        w.empty("w:updateFields", &[("w:val", "true")])?;
    }
    w.empty("w:characterSpacingControl", &[("w:val", "doNotCompress")])?;
    w.start("w:compat", &[])?;
    w.empty(
        "w:compatSetting",
        &[
            ("w:name", "compatibilityMode"),
            ("w:uri", "http://schemas.microsoft.com/office/word"),
            ("w:val", "15"),
        ],
    )?;
    w.end("w:compat")?;
    w.end("w:settings")?;
    Ok(w.finish())
}
