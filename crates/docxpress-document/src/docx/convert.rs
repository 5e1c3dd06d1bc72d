// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML to block model lowering.
//
// The walk carries a `Context` (inherited character and paragraph
// properties, list nesting, active link) down the tree and feeds a
// `BlockSink`, which groups inline content into paragraphs and applies the
// HTML whitespace rules: runs of whitespace collapse to one space, and
// spaces at the start or end of a line are dropped. Block elements close the
// paragraph being built and open a new one on their first inline content.

use tracing::trace;

use docxpress_core::error::Result;

use super::model::{
    Block, FieldCode, Inline, MAX_FONT_PT, NumberingRef, Paragraph, ParagraphProps,
    ParagraphStyle, Run, RunContent, RunProps, Table, TableCell, TableRow, half_points,
};
use super::numbering::{ListKind, Numbering};
use crate::html::style::{
    first_font_family, legacy_font_size_pt, parse_color, parse_font_size_pt, parse_font_weight,
    parse_length_pt,
};
use crate::html::{Declarations, Element, HtmlNode, TextAlign, parse_html};

/// Deepest list level WordprocessingML supports (levels 0..=8).
const MAX_LIST_DEPTH: usize = 9;

/// Indent applied by `<blockquote>` and `<dd>`, in twips.
const BLOCK_INDENT_TWIPS: u32 = 720;

/// Largest indent or paragraph spacing Word accepts (22 inches), in twips.
const MAX_TWIPS: u32 = 31680;

/// Largest `colspan` honoured (the OOXML grid limit).
const MAX_COL_SPAN: u32 = 63;

const MONOSPACE_FONT: &str = "Courier New";

/// Elements that start a new paragraph.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "li", "dl", "dt", "dd",
    "section", "article", "header", "footer", "main", "nav", "aside", "figure", "figcaption",
    "address", "center", "form", "fieldset", "details", "summary", "body", "html",
];

/// Text placeholders expanded into page fields.
const PLACEHOLDERS: &[(&str, FieldCode)] = &[
    ("{page_number}", FieldCode::Page),
    ("{total_pages}", FieldCode::NumPages),
];

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ListLevel {
    kind: ListKind,
    num_id: u32,
}

/// Properties inherited from ancestors during the walk.
#[derive(Debug, Clone)]
struct Context {
    run: RunProps,
    para: ParagraphProps,
    /// Effective font size in points (base for `em` and `%`).
    font_pt: f32,
    preserve_whitespace: bool,
    link: Option<String>,
    lists: Vec<ListLevel>,
}

impl Context {
    fn root(font_pt: f32) -> Self {
        Self {
            run: RunProps::default(),
            para: ParagraphProps::default(),
            font_pt,
            preserve_whitespace: false,
            link: None,
            lists: Vec::new(),
        }
    }

    fn set_font_size(&mut self, pt: f32) {
        self.font_pt = pt.min(MAX_FONT_PT);
        self.run.size_half_points = Some(half_points(self.font_pt));
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Lowers HTML into blocks for one story (body, header, or footer).
///
/// List definitions are registered in the shared [`Numbering`] so that all
/// stories of a package reference the same `numbering.xml`.
pub struct HtmlConverter<'n> {
    numbering: &'n mut Numbering,
    base_font_pt: f32,
}

impl<'n> HtmlConverter<'n> {
    pub fn new(numbering: &'n mut Numbering, base_font_pt: f32) -> Self {
        Self {
            numbering,
            base_font_pt,
        }
    }

    /// Parse and convert an HTML string.
    pub fn convert_html(&mut self, html: &str) -> Result<Vec<Block>> {
        let nodes = parse_html(html)?;
        Ok(self.convert_nodes(&nodes))
    }

    /// Convert an already-parsed node list.
    pub fn convert_nodes(&mut self, nodes: &[HtmlNode]) -> Vec<Block> {
        let ctx = Context::root(self.base_font_pt);
        let mut sink = BlockSink::new();
        self.walk_nodes(nodes, &ctx, &mut sink);
        let blocks = sink.finish();
        trace!(blocks = blocks.len(), "converted HTML story");
        blocks
    }

    fn walk_nodes(&mut self, nodes: &[HtmlNode], ctx: &Context, sink: &mut BlockSink) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => sink.push_text(text, ctx),
                HtmlNode::Element(el) => self.walk_element(el, ctx, sink),
            }
        }
    }

    fn walk_element(&mut self, el: &Element, ctx: &Context, sink: &mut BlockSink) {
        let decls = el.attr("style").map(Declarations::parse).unwrap_or_default();
        if decls
            .get("display")
            .is_some_and(|d| d.eq_ignore_ascii_case("none"))
        {
            return;
        }

        match el.name.as_str() {
            "br" => sink.push_content(RunContent::LineBreak, ctx),
            "hr" => {
                let props = ParagraphProps {
                    bottom_border: true,
                    ..ctx.para.clone()
                };
                sink.push_block(Block::Paragraph(Paragraph::new(props)));
            }
            "img" => {
                if let Some(alt) = el.attr("alt").filter(|a| !a.trim().is_empty()) {
                    sink.push_text(&format!("[{}]", alt.trim()), ctx);
                }
            }
            "ul" | "ol" => self.walk_list(el, &decls, ctx, sink),
            "table" => {
                for block in self.convert_table(el, &decls, ctx) {
                    sink.push_block(block);
                }
            }
            name if BLOCK_ELEMENTS.contains(&name) => self.walk_block(el, &decls, ctx, sink),
            _ => {
                let child = inline_context(el, &decls, ctx);
                self.walk_nodes(&el.children, &child, sink);
            }
        }
    }

    fn walk_block(
        &mut self,
        el: &Element,
        decls: &Declarations,
        ctx: &Context,
        sink: &mut BlockSink,
    ) {
        sink.flush();

        let mut child = ctx.clone();
        child.para.spacing_before = None;
        child.para.spacing_after = None;

        match el.name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.name.as_bytes()[1] - b'0';
                child.para.style = Some(ParagraphStyle::Heading(level));
            }
            "pre" => {
                child.para.style = Some(ParagraphStyle::Preformatted);
                child.preserve_whitespace = true;
                child.run.font = Some(MONOSPACE_FONT.into());
            }
            "blockquote" | "dd" => {
                child.para.indent_left = Some(add_indent(child.para.indent_left, BLOCK_INDENT_TWIPS));
            }
            "center" => child.para.align = Some(TextAlign::Center),
            "dt" => child.run.bold = true,
            "address" => child.run.italic = true,
            "li" => {
                if let Some(level) = child.lists.last() {
                    child.para.numbering = Some(NumberingRef {
                        num_id: level.num_id,
                        level: (child.lists.len() - 1) as u8,
                    });
                    child.para.style = Some(ParagraphStyle::ListParagraph);
                }
            }
            _ => {}
        }

        if let Some(align) = el.attr("align").and_then(TextAlign::parse) {
            child.para.align = Some(align);
        }
        apply_block_declarations(&mut child, decls);

        if breaks_page(decls, "before") {
            sink.request_page_break();
        }

        let emitted = sink.emitted();
        self.walk_nodes(&el.children, &child, sink);

        // An explicit empty paragraph still takes up a line.
        if el.name == "p" && sink.emitted() == emitted && !sink.has_pending_content() {
            sink.push_empty_paragraph(&child);
        }
        sink.flush();

        if breaks_page(decls, "after") {
            sink.request_page_break();
        }
    }

    fn walk_list(
        &mut self,
        el: &Element,
        decls: &Declarations,
        ctx: &Context,
        sink: &mut BlockSink,
    ) {
        sink.flush();

        let kind = if el.name == "ol" {
            ListKind::Ordered
        } else {
            ListKind::Bullet
        };
        let depth = ctx.lists.len().min(MAX_LIST_DEPTH - 1);

        let num_id = match (kind, ctx.lists.last()) {
            // Nested ordered lists continue the parent's multi-level definition.
            (ListKind::Ordered, Some(parent)) if parent.kind == ListKind::Ordered => parent.num_id,
            (ListKind::Ordered, _) => {
                let start = el
                    .attr("start")
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .unwrap_or(1);
                self.numbering.ordered(depth as u8, start)
            }
            (ListKind::Bullet, _) => self.numbering.bullet(),
        };

        let mut child = ctx.clone();
        child.para.numbering = None;
        child.para.style = None;
        apply_block_declarations(&mut child, decls);
        if child.lists.len() < MAX_LIST_DEPTH {
            child.lists.push(ListLevel { kind, num_id });
        }

        self.walk_nodes(&el.children, &child, sink);
        sink.flush();
    }

    // -- Tables ---------------------------------------------------------------

    fn convert_table(&mut self, el: &Element, decls: &Declarations, ctx: &Context) -> Vec<Block> {
        let mut out = Vec::new();

        // Cells start a fresh paragraph context but keep character formatting.
        let mut cell_ctx = ctx.clone();
        cell_ctx.para = ParagraphProps::default();
        cell_ctx.lists.clear();
        cell_ctx.preserve_whitespace = false;
        apply_run_declarations(&mut cell_ctx, decls, false);

        let mut table = Table {
            rows: Vec::new(),
            borders: table_has_borders(el, decls),
        };

        for child in child_elements(el) {
            match child.name.as_str() {
                "caption" => {
                    let mut caption_ctx = cell_ctx.clone();
                    caption_ctx.para.align = Some(TextAlign::Center);
                    let mut sink = BlockSink::new();
                    self.walk_nodes(&child.children, &caption_ctx, &mut sink);
                    out.extend(sink.finish());
                }
                "tr" => table.rows.push(self.convert_row(child, false, &cell_ctx)),
                "thead" | "tbody" | "tfoot" => {
                    let header = child.name == "thead";
                    for tr in child_elements(child).filter(|c| c.name == "tr") {
                        table.rows.push(self.convert_row(tr, header, &cell_ctx));
                    }
                }
                _ => {}
            }
        }

        // Every OOXML row needs at least one cell.
        table.rows.retain(|row| !row.cells.is_empty());
        if !table.rows.is_empty() {
            out.push(Block::Table(table));
        }
        out
    }

    fn convert_row(&mut self, tr: &Element, header: bool, ctx: &Context) -> TableRow {
        let row_decls = tr.attr("style").map(Declarations::parse).unwrap_or_default();
        let row_shading = background(&row_decls).or_else(|| tr.attr("bgcolor").and_then(parse_color));

        let mut row = TableRow {
            cells: Vec::new(),
            header,
        };

        for cell in child_elements(tr).filter(|c| c.name == "td" || c.name == "th") {
            let decls = cell.attr("style").map(Declarations::parse).unwrap_or_default();
            let mut cell_ctx = ctx.clone();
            apply_run_declarations(&mut cell_ctx, &row_decls, false);
            if cell.name == "th" {
                cell_ctx.run.bold = true;
                cell_ctx.para.align = Some(TextAlign::Center);
            }
            if let Some(align) = cell.attr("align").and_then(TextAlign::parse) {
                cell_ctx.para.align = Some(align);
            }
            apply_block_declarations(&mut cell_ctx, &decls);

            // Cell backgrounds shade the cell, not each paragraph.
            let shading = cell_ctx
                .para
                .shading
                .take()
                .or_else(|| cell.attr("bgcolor").and_then(parse_color))
                .or_else(|| row_shading.clone());

            let mut sink = BlockSink::new();
            self.walk_nodes(&cell.children, &cell_ctx, &mut sink);
            let mut blocks = sink.finish();
            // A cell must end with a paragraph.
            if !matches!(blocks.last(), Some(Block::Paragraph(_))) {
                blocks.push(Block::Paragraph(Paragraph::new(cell_ctx.para.clone())));
            }

            let col_span = cell
                .attr("colspan")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(1)
                .clamp(1, MAX_COL_SPAN);

            row.cells.push(TableCell {
                blocks,
                col_span,
                shading,
            });
        }

        row
    }
}

fn child_elements(el: &Element) -> impl Iterator<Item = &Element> {
    el.children.iter().filter_map(|node| match node {
        HtmlNode::Element(child) => Some(child),
        HtmlNode::Text(_) => None,
    })
}

// ---------------------------------------------------------------------------
// Style application
// ---------------------------------------------------------------------------

fn inline_context(el: &Element, decls: &Declarations, ctx: &Context) -> Context {
    let mut child = ctx.clone();

    match el.name.as_str() {
        "b" | "strong" => child.run.bold = true,
        "i" | "em" | "cite" | "var" | "dfn" => child.run.italic = true,
        "u" | "ins" => child.run.underline = true,
        "s" | "strike" | "del" => child.run.strike = true,
        "sup" => {
            child.run.superscript = true;
            child.run.subscript = false;
        }
        "sub" => {
            child.run.subscript = true;
            child.run.superscript = false;
        }
        "code" | "kbd" | "samp" | "tt" => child.run.font = Some(MONOSPACE_FONT.into()),
        "mark" => child.run.shading = Some("FFFF00".into()),
        "small" => child.set_font_size(ctx.font_pt * 0.83),
        "big" => child.set_font_size(ctx.font_pt * 1.2),
        "font" => {
            if let Some(color) = el.attr("color").and_then(parse_color) {
                child.run.color = Some(color);
            }
            if let Some(face) = el.attr("face").and_then(first_font_family) {
                child.run.font = Some(face);
            }
            if let Some(size) = el.attr("size").and_then(legacy_font_size_pt) {
                child.set_font_size(size);
            }
        }
        "a" => {
            let target = el
                .attr("href")
                .map(str::trim)
                .filter(|href| is_external_link(href));
            if let Some(target) = target {
                child.link = Some(target.to_owned());
                child.run.hyperlink_style = true;
            }
        }
        _ => {}
    }

    apply_run_declarations(&mut child, decls, true);
    child
}

fn is_external_link(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href.to_ascii_lowercase().starts_with("javascript:")
}

fn apply_run_declarations(ctx: &mut Context, decls: &Declarations, shade_runs: bool) {
    if decls.is_empty() {
        return;
    }

    if let Some(color) = decls.get("color").and_then(parse_color) {
        ctx.run.color = Some(color);
    }
    if let Some(size) = decls
        .get("font-size")
        .and_then(|v| parse_font_size_pt(v, ctx.font_pt))
    {
        ctx.set_font_size(size);
    }
    if let Some(bold) = decls.get("font-weight").and_then(parse_font_weight) {
        ctx.run.bold = bold;
    }
    if let Some(style) = decls.get("font-style") {
        match style.to_ascii_lowercase().as_str() {
            "italic" | "oblique" => ctx.run.italic = true,
            "normal" => ctx.run.italic = false,
            _ => {}
        }
    }
    if let Some(decoration) = decls
        .get("text-decoration")
        .or_else(|| decls.get("text-decoration-line"))
    {
        let decoration = decoration.to_ascii_lowercase();
        if decoration.trim() == "none" {
            ctx.run.underline = false;
            ctx.run.strike = false;
        }
        if decoration.contains("underline") {
            ctx.run.underline = true;
        }
        if decoration.contains("line-through") {
            ctx.run.strike = true;
        }
    }
    if let Some(family) = decls.get("font-family").and_then(first_font_family) {
        ctx.run.font = Some(family);
    }
    if let Some(align) = decls.get("vertical-align") {
        match align.to_ascii_lowercase().as_str() {
            "super" => {
                ctx.run.superscript = true;
                ctx.run.subscript = false;
            }
            "sub" => {
                ctx.run.subscript = true;
                ctx.run.superscript = false;
            }
            "baseline" => {
                ctx.run.superscript = false;
                ctx.run.subscript = false;
            }
            _ => {}
        }
    }
    if shade_runs {
        if let Some(fill) = background(decls) {
            ctx.run.shading = Some(fill);
        }
    }
}

fn apply_block_declarations(ctx: &mut Context, decls: &Declarations) {
    if decls.is_empty() {
        return;
    }

    apply_run_declarations(ctx, decls, false);

    if let Some(align) = decls.get("text-align").and_then(TextAlign::parse) {
        ctx.para.align = Some(align);
    }

    let margins = decls.get("margin").and_then(box_sides);
    let margin_top = decls.get("margin-top").or(margins.map(|m| m[0]));
    let margin_bottom = decls.get("margin-bottom").or(margins.map(|m| m[2]));
    let margin_left = decls.get("margin-left").or(margins.map(|m| m[3]));
    let padding_left = decls
        .get("padding-left")
        .or_else(|| decls.get("padding").and_then(box_sides).map(|p| p[3]));

    let indent_pt: f32 = [margin_left, padding_left]
        .into_iter()
        .flatten()
        .filter_map(|v| parse_length_pt(v, ctx.font_pt))
        .filter(|pt| *pt > 0.0)
        .sum();
    if indent_pt > 0.0 {
        ctx.para.indent_left = Some(add_indent(ctx.para.indent_left, twips(indent_pt)));
    }
    if let Some(pt) = margin_top.and_then(|v| parse_length_pt(v, ctx.font_pt)) {
        ctx.para.spacing_before = Some(twips(pt));
    }
    if let Some(pt) = margin_bottom.and_then(|v| parse_length_pt(v, ctx.font_pt)) {
        ctx.para.spacing_after = Some(twips(pt));
    }
    if let Some(fill) = background(decls) {
        ctx.para.shading = Some(fill);
    }
}

/// Expand a 1-4 value box shorthand into `[top, right, bottom, left]`.
fn box_sides(value: &str) -> Option<[&str; 4]> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [all] => Some([all, all, all, all]),
        [vertical, horizontal] => Some([vertical, horizontal, vertical, horizontal]),
        [top, horizontal, bottom] => Some([top, horizontal, bottom, horizontal]),
        [top, right, bottom, left] => Some([top, right, bottom, left]),
        _ => None,
    }
}

fn background(decls: &Declarations) -> Option<String> {
    if let Some(color) = decls.get("background-color").and_then(parse_color) {
        return Some(color);
    }
    decls
        .get("background")
        .and_then(|value| value.split_whitespace().find_map(parse_color))
}

fn breaks_page(decls: &Declarations, side: &str) -> bool {
    let legacy = decls.get(&format!("page-break-{side}"));
    let modern = decls.get(&format!("break-{side}"));
    [legacy, modern].into_iter().flatten().any(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "always" | "page" | "left" | "right"
        )
    })
}

fn declares_border(decls: &Declarations) -> bool {
    decls.iter().any(|(prop, value)| {
        prop.starts_with("border")
            && !matches!(prop, "border-collapse" | "border-spacing" | "border-radius")
            && !matches!(value.trim(), "none" | "0" | "hidden" | "0px")
    })
}

fn table_has_borders(el: &Element, decls: &Declarations) -> bool {
    let attr = el
        .attr("border")
        .and_then(|b| b.trim().parse::<u32>().ok())
        .is_some_and(|b| b > 0);
    attr || declares_border(decls) || cells_declare_border(el)
}

fn cells_declare_border(el: &Element) -> bool {
    child_elements(el).any(|child| match child.name.as_str() {
        "thead" | "tbody" | "tfoot" | "tr" => cells_declare_border(child),
        "td" | "th" => child
            .attr("style")
            .map(Declarations::parse)
            .is_some_and(|d| declares_border(&d)),
        _ => false,
    })
}

fn twips(pt: f32) -> u32 {
    ((pt * 20.0).round().max(0.0) as u32).min(MAX_TWIPS)
}

fn add_indent(current: Option<u32>, extra: u32) -> u32 {
    current.unwrap_or(0).saturating_add(extra).min(MAX_TWIPS)
}

// ---------------------------------------------------------------------------
// Block sink
// ---------------------------------------------------------------------------

/// Accumulates inline content into paragraphs and collects finished blocks.
struct BlockSink {
    blocks: Vec<Block>,
    pending: Option<Paragraph>,
    /// Pending paragraph keeps its whitespace verbatim.
    pending_preserve: bool,
    /// Nothing visible since the paragraph start or the last line break.
    at_line_start: bool,
    /// Last text pushed ended with a collapsible space.
    last_space: bool,
    /// Next paragraph starts on a new page.
    page_break_next: bool,
}

impl BlockSink {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            pending: None,
            pending_preserve: false,
            at_line_start: true,
            last_space: false,
            page_break_next: false,
        }
    }

    fn emitted(&self) -> usize {
        self.blocks.len()
    }

    fn has_pending_content(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.inlines.is_empty())
    }

    fn request_page_break(&mut self) {
        self.page_break_next = true;
    }

    fn ensure_paragraph(&mut self, ctx: &Context) -> &mut Paragraph {
        if self.pending.is_none() {
            let mut props = ctx.para.clone();
            props.page_break_before = std::mem::take(&mut self.page_break_next);
            self.pending = Some(Paragraph::new(props));
            self.pending_preserve = ctx.preserve_whitespace;
            self.at_line_start = true;
            self.last_space = false;
        }
        self.pending.get_or_insert_with(Paragraph::default)
    }

    fn push_text(&mut self, text: &str, ctx: &Context) {
        if ctx.preserve_whitespace {
            self.push_preformatted(text, ctx);
            return;
        }

        let collapsed = collapse_whitespace(text);
        let drop_leading =
            self.pending.is_none() || self.at_line_start || self.last_space;
        let text = match collapsed.strip_prefix(' ') {
            Some(rest) if drop_leading => rest,
            _ => collapsed.as_str(),
        };
        if text.is_empty() {
            return;
        }

        for (segment, field) in split_placeholders(text) {
            let content = match field {
                Some(code) => RunContent::Field(code),
                None => RunContent::Text(segment.to_owned()),
            };
            self.push_run(
                Run {
                    props: ctx.run.clone(),
                    content,
                },
                ctx,
            );
        }

        self.at_line_start = false;
        self.last_space = text.ends_with(' ');
    }

    fn push_preformatted(&mut self, text: &str, ctx: &Context) {
        // A newline directly after `<pre>` is not rendered.
        let text = match (&self.pending, text.strip_prefix('\n')) {
            (None, Some(rest)) => rest,
            _ => text,
        };

        for (line_idx, line) in text.split('\n').enumerate() {
            if line_idx > 0 {
                self.push_content(RunContent::LineBreak, ctx);
            }
            for (tab_idx, part) in line.trim_end_matches('\r').split('\t').enumerate() {
                if tab_idx > 0 {
                    self.push_content(RunContent::Tab, ctx);
                }
                if !part.is_empty() {
                    self.push_run(Run::text(part, ctx.run.clone()), ctx);
                }
            }
        }
        self.at_line_start = false;
        self.last_space = false;
    }

    fn push_content(&mut self, content: RunContent, ctx: &Context) {
        let is_break = matches!(content, RunContent::LineBreak);
        self.push_run(
            Run {
                props: ctx.run.clone(),
                content,
            },
            ctx,
        );
        if is_break {
            self.at_line_start = true;
            self.last_space = false;
        }
    }

    fn push_run(&mut self, run: Run, ctx: &Context) {
        let link = ctx.link.clone();
        let paragraph = self.ensure_paragraph(ctx);
        match link {
            Some(target) => match paragraph.inlines.last_mut() {
                Some(Inline::Hyperlink { target: current, runs }) if *current == target => {
                    runs.push(run);
                }
                _ => paragraph.inlines.push(Inline::Hyperlink {
                    target,
                    runs: vec![run],
                }),
            },
            None => paragraph.inlines.push(Inline::Run(run)),
        }
    }

    fn push_empty_paragraph(&mut self, ctx: &Context) {
        self.flush();
        let mut props = ctx.para.clone();
        props.page_break_before = std::mem::take(&mut self.page_break_next);
        self.blocks.push(Block::Paragraph(Paragraph::new(props)));
    }

    fn push_block(&mut self, block: Block) {
        self.flush();
        let block = match block {
            Block::Paragraph(mut p) => {
                p.props.page_break_before |= std::mem::take(&mut self.page_break_next);
                Block::Paragraph(p)
            }
            Block::Table(table) => {
                if std::mem::take(&mut self.page_break_next) {
                    let mut breaker = Paragraph::default();
                    breaker.inlines.push(Inline::Run(Run {
                        props: RunProps::default(),
                        content: RunContent::PageBreak,
                    }));
                    self.blocks.push(Block::Paragraph(breaker));
                }
                Block::Table(table)
            }
        };
        self.blocks.push(block);
    }

    /// Close the pending paragraph, dropping it if nothing visible remains.
    fn flush(&mut self) {
        if let Some(mut paragraph) = self.pending.take() {
            if !self.pending_preserve {
                trim_trailing_space(&mut paragraph.inlines);
            }
            if paragraph.inlines.is_empty() {
                // Keep a requested page break for the next paragraph.
                self.page_break_next |= paragraph.props.page_break_before;
            } else {
                self.blocks.push(Block::Paragraph(paragraph));
            }
        }
        self.pending_preserve = false;
        self.at_line_start = true;
        self.last_space = false;
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}

/// Collapse ASCII whitespace runs to single spaces (non-breaking spaces are
/// content and survive).
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Split text around page placeholders. Each item is a text segment, or a
/// placeholder with its field code.
fn split_placeholders(text: &str) -> Vec<(&str, Option<FieldCode>)> {
    let mut out = Vec::new();
    let mut rest = text;

    loop {
        let next = PLACEHOLDERS
            .iter()
            .filter_map(|(token, code)| rest.find(token).map(|idx| (idx, *token, *code)))
            .min_by_key(|(idx, _, _)| *idx);

        match next {
            Some((idx, token, code)) => {
                if idx > 0 {
                    out.push((&rest[..idx], None));
                }
                out.push((token, Some(code)));
                rest = &rest[idx + token.len()..];
            }
            None => {
                if !rest.is_empty() {
                    out.push((rest, None));
                }
                return out;
            }
        }
    }
}

enum Trim {
    Kept,
    Emptied,
}

fn trim_run_end(run: &mut Run) -> Trim {
    match &mut run.content {
        RunContent::Text(text) => {
            let len = text.trim_end_matches(' ').len();
            text.truncate(len);
            if text.is_empty() { Trim::Emptied } else { Trim::Kept }
        }
        _ => Trim::Kept,
    }
}

fn trim_trailing_space(inlines: &mut Vec<Inline>) {
    loop {
        let emptied = match inlines.last_mut() {
            None => return,
            Some(Inline::Run(run)) => matches!(trim_run_end(run), Trim::Emptied),
            Some(Inline::Hyperlink { runs, .. }) => {
                while let Some(run) = runs.last_mut() {
                    match trim_run_end(run) {
                        Trim::Kept => break,
                        Trim::Emptied => {
                            runs.pop();
                        }
                    }
                }
                runs.is_empty()
            }
        };
        if !emptied {
            return;
        }
        inlines.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> (Vec<Block>, Numbering) {
        let mut numbering = Numbering::default();
        let blocks = HtmlConverter::new(&mut numbering, 11.0)
            .convert_html(html)
            .unwrap();
        (blocks, numbering)
    }

    fn paragraphs(blocks: &[Block]) -> Vec<&Paragraph> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph(p) => Some(p),
                Block::Table(_) => None,
            })
            .collect()
    }

    fn runs(p: &Paragraph) -> Vec<&Run> {
        p.inlines.iter().flat_map(Inline::runs).collect()
    }

    #[test]
    fn paragraphs_and_inline_formatting() {
        let (blocks, _) = convert("<p>Hello <b>bold</b> and <i>italic</i></p>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text(), "Hello bold and italic");
        let runs = runs(paras[0]);
        assert!(runs[1].props.bold);
        assert!(!runs[1].props.italic);
        assert!(runs[3].props.italic);
    }

    #[test]
    fn whitespace_collapses_and_trims() {
        let (blocks, _) = convert("<div>\n   <p>  lots   of\n space  </p>\n</div>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text(), "lots of space");
    }

    #[test]
    fn spaces_between_runs_do_not_double() {
        let (blocks, _) = convert("<p>one <span> two</span></p>");
        assert_eq!(paragraphs(&blocks)[0].text(), "one two");
    }

    #[test]
    fn containers_do_not_emit_empty_paragraphs_but_p_does() {
        let (blocks, _) = convert("<div><div></div></div><p></p><p>x</p>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 2);
        assert!(paras[0].inlines.is_empty());
        assert_eq!(paras[1].text(), "x");
    }

    #[test]
    fn headings_map_to_styles() {
        let (blocks, _) = convert("<h1>Title</h1><h3>Sub</h3>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras[0].props.style, Some(ParagraphStyle::Heading(1)));
        assert_eq!(paras[1].props.style, Some(ParagraphStyle::Heading(3)));
    }

    #[test]
    fn inline_styles_apply() {
        let (blocks, _) = convert(
            r#"<div style="text-align: center; font-size: 10px; color: #666;">Page</div>"#,
        );
        let p = paragraphs(&blocks)[0];
        assert_eq!(p.props.align, Some(TextAlign::Center));
        let run = runs(p)[0];
        assert_eq!(run.props.color.as_deref(), Some("666666"));
        assert_eq!(run.props.size_half_points, Some(15));
    }

    #[test]
    fn placeholders_become_fields() {
        let (blocks, _) = convert("<p>Page {page_number} of {total_pages}</p>");
        let p = paragraphs(&blocks)[0];
        let contents: Vec<_> = runs(p).iter().map(|r| r.content.clone()).collect();
        assert_eq!(
            contents,
            vec![
                RunContent::Text("Page ".into()),
                RunContent::Field(FieldCode::Page),
                RunContent::Text(" of ".into()),
                RunContent::Field(FieldCode::NumPages),
            ]
        );
    }

    #[test]
    fn lists_use_numbering_levels() {
        let (blocks, numbering) =
            convert("<ol><li>one<ol><li>nested</li></ol></li><li>two</li></ol><ul><li>dot</li></ul>");
        let paras = paragraphs(&blocks);
        assert_eq!(paras.len(), 4);
        let first = paras[0].props.numbering.unwrap();
        let nested = paras[1].props.numbering.unwrap();
        let bullet = paras[3].props.numbering.unwrap();
        assert_eq!(first.level, 0);
        assert_eq!(nested.level, 1);
        assert_eq!(first.num_id, nested.num_id);
        assert_ne!(first.num_id, bullet.num_id);
        assert_eq!(numbering.instances().len(), 2);
    }

    #[test]
    fn separate_ordered_lists_restart() {
        let (blocks, numbering) = convert("<ol><li>a</li></ol><ol start=\"5\"><li>b</li></ol>");
        let paras = paragraphs(&blocks);
        assert_ne!(
            paras[0].props.numbering.unwrap().num_id,
            paras[1].props.numbering.unwrap().num_id
        );
        assert_eq!(numbering.instances()[1].start_override, Some((0, 5)));
    }

    #[test]
    fn links_group_runs() {
        let (blocks, _) = convert(r#"<p>See <a href="https://example.com">the <b>site</b></a>.</p>"#);
        let p = paragraphs(&blocks)[0];
        match &p.inlines[1] {
            Inline::Hyperlink { target, runs } => {
                assert_eq!(target, "https://example.com");
                assert_eq!(runs.len(), 2);
                assert!(runs.iter().all(|r| r.props.hyperlink_style));
            }
            other => panic!("expected hyperlink, got {other:?}"),
        }
        let (blocks, _) = convert(r##"<p><a href="#top">top</a></p>"##);
        assert!(matches!(paragraphs(&blocks)[0].inlines[0], Inline::Run(_)));
    }

    #[test]
    fn tables_with_spans_and_headers() {
        let (blocks, _) = convert(
            "<table border=\"1\"><thead><tr><th colspan=\"2\">H</th></tr></thead>\
             <tbody><tr><td>a</td><td style=\"background-color: #eee\">b</td></tr></tbody></table>",
        );
        let table = match &blocks[0] {
            Block::Table(t) => t,
            other => panic!("expected table, got {other:?}"),
        };
        assert!(table.borders);
        assert_eq!(table.grid_columns(), 2);
        assert!(table.rows[0].header);
        assert_eq!(table.rows[0].cells[0].col_span, 2);
        assert_eq!(table.rows[1].cells[1].shading.as_deref(), Some("EEEEEE"));
        match &table.rows[0].cells[0].blocks[0] {
            Block::Paragraph(p) => assert!(runs(p)[0].props.bold),
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn empty_cells_still_hold_a_paragraph() {
        let (blocks, _) = convert("<table><tr><td></td></tr></table>");
        match &blocks[0] {
            Block::Table(t) => {
                assert!(!t.borders);
                assert_eq!(t.rows[0].cells[0].blocks.len(), 1);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn preformatted_keeps_lines() {
        let (blocks, _) = convert("<pre>\nline one\n  line two</pre>");
        let p = paragraphs(&blocks)[0];
        let contents: Vec<_> = runs(p).iter().map(|r| r.content.clone()).collect();
        assert_eq!(
            contents,
            vec![
                RunContent::Text("line one".into()),
                RunContent::LineBreak,
                RunContent::Text("  line two".into()),
            ]
        );
        assert_eq!(p.props.style, Some(ParagraphStyle::Preformatted));
    }

    #[test]
    fn page_breaks_attach_to_next_paragraph() {
        let (blocks, _) =
            convert(r#"<p style="page-break-after: always">a</p><p>b</p>"#);
        let paras = paragraphs(&blocks);
        assert!(!paras[0].props.page_break_before);
        assert!(paras[1].props.page_break_before);
    }

    #[test]
    fn hidden_elements_are_skipped() {
        let (blocks, _) = convert(r#"<p>shown<span style="display:none">hidden</span></p>"#);
        assert_eq!(paragraphs(&blocks)[0].text(), "shown");
    }

    #[test]
    fn huge_indents_and_sizes_are_clamped() {
        let (blocks, _) = convert(
            r#"<div style="margin-left:300000000pt"><blockquote style="font-size: 2000pt">x</blockquote></div>"#,
        );
        let p = paragraphs(&blocks)[0];
        assert_eq!(p.props.indent_left, Some(MAX_TWIPS));
        assert_eq!(runs(p)[0].props.size_half_points, Some(3276));

        let (blocks, _) = convert(
            r#"<blockquote><blockquote style="margin-top: 5000pt; padding-left: 99999999pt">y</blockquote></blockquote>"#,
        );
        let p = paragraphs(&blocks)[0];
        assert_eq!(p.props.indent_left, Some(MAX_TWIPS));
        assert_eq!(p.props.spacing_before, Some(MAX_TWIPS));
    }

    #[test]
    fn line_breaks_split_lines() {
        let (blocks, _) = convert("<p>a<br> b</p>");
        let p = paragraphs(&blocks)[0];
        let contents: Vec<_> = runs(p).iter().map(|r| r.content.clone()).collect();
        assert_eq!(
            contents,
            vec![
                RunContent::Text("a".into()),
                RunContent::LineBreak,
                RunContent::Text("b".into()),
            ]
        );
    }
}
