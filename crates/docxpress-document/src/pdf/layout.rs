// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Block layout for PDF output.
//
// Blocks are cut into slabs: horizontal strips of fixed height that the
// paginator stacks onto pages. A paragraph yields one slab per line so it can
// split across pages; a table row is a single slab. Coordinates inside a slab
// are points from its top-left corner, y growing downwards.

use std::collections::HashMap;

use printpdf::BuiltinFont;

use crate::docx::model::{Block, FieldCode, Paragraph, ParagraphStyle, RunContent, RunProps, Table};
use crate::docx::numbering::{ListKind, Numbering};
use crate::docx::writer::HEADING_SIZES;
use crate::html::TextAlign;

/// Line height as a multiple of the largest font size on the line.
const LINE_HEIGHT: f32 = 1.2;
/// Baseline position as a multiple of the largest font size on the line.
const BASELINE: f32 = 0.95;
const PARAGRAPH_AFTER_PT: f32 = 6.0;
const HEADING_BEFORE_PT: f32 = 12.0;
const HEADING_AFTER_PT: f32 = 3.0;
const LIST_INDENT_PT: f32 = 36.0;
const LIST_HANGING_PT: f32 = 18.0;
const TAB_STOP_PT: f32 = 36.0;
const CELL_PADDING_PT: f32 = 4.0;
const RULE_SLAB_PT: f32 = 6.0;
/// Narrowest line a paragraph is ever wrapped to.
const MIN_LINE_WIDTH_PT: f32 = 24.0;
/// Characters reserved for a page-number field.
const FIELD_CHARS: f32 = 2.0;

const BULLETS: [&str; 3] = ["\u{2022}", "o", "-"];
const HYPERLINK_COLOR: &str = "0563C1";

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0 };
    pub const GRAY: Self = Self { r: 0.5, g: 0.5, b: 0.5 };

    /// Parse an `RRGGBB` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Blend towards white, as if painted at `opacity` over a white page.
    pub fn over_white(self, opacity: f32) -> Self {
        let mix = |c: f32| 1.0 - opacity * (1.0 - c);
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
        }
    }
}

/// One of the three standard PDF font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Closest standard family for a CSS font name.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if ["courier", "mono", "consolas", "menlo"].iter().any(|n| name.contains(n)) {
            Self::Courier
        } else if name.contains("sans") {
            Self::Helvetica
        } else if ["times", "serif", "georgia", "garamond", "cambria", "book"]
            .iter()
            .any(|n| name.contains(n))
        {
            Self::Times
        } else {
            Self::Helvetica
        }
    }
}

/// A concrete standard font face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontFace {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

impl FontFace {
    pub fn builtin(&self) -> BuiltinFont {
        use BuiltinFont::*;
        match (self.family, self.bold, self.italic) {
            (FontFamily::Helvetica, false, false) => Helvetica,
            (FontFamily::Helvetica, true, false) => HelveticaBold,
            (FontFamily::Helvetica, false, true) => HelveticaOblique,
            (FontFamily::Helvetica, true, true) => HelveticaBoldOblique,
            (FontFamily::Times, false, false) => TimesRoman,
            (FontFamily::Times, true, false) => TimesBold,
            (FontFamily::Times, false, true) => TimesItalic,
            (FontFamily::Times, true, true) => TimesBoldItalic,
            (FontFamily::Courier, false, false) => Courier,
            (FontFamily::Courier, true, false) => CourierBold,
            (FontFamily::Courier, false, true) => CourierOblique,
            (FontFamily::Courier, true, true) => CourierBoldOblique,
        }
    }

    /// Estimated advance of `chars` glyphs at `size_pt`.
    pub fn measure(&self, chars: f32, size_pt: f32) -> f32 {
        let advance = match (self.family, self.bold) {
            (FontFamily::Courier, _) => 0.6,
            (FontFamily::Helvetica, false) => 0.52,
            (FontFamily::Helvetica, true) => 0.56,
            (FontFamily::Times, false) => 0.46,
            (FontFamily::Times, true) => 0.5,
        };
        chars * advance * size_pt
    }
}

/// Content of a text fragment. Fields are resolved once pages are known.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Field(FieldCode),
}

/// Uniformly styled text drawn at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub piece: Piece,
    pub face: FontFace,
    pub size_pt: f32,
    pub color: Color,
}

/// A drawing primitive, relative to its slab or page.
#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    Text {
        x: f32,
        baseline: f32,
        fragment: Fragment,
    },
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
        color: Color,
    },
}

impl Draw {
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        match self {
            Self::Text { x, baseline, fragment } => Self::Text {
                x: x + dx,
                baseline: baseline + dy,
                fragment,
            },
            Self::Fill { x, y, width, height, color } => Self::Fill {
                x: x + dx,
                y: y + dy,
                width,
                height,
                color,
            },
            Self::Rule { x1, y1, x2, y2, thickness, color } => Self::Rule {
                x1: x1 + dx,
                y1: y1 + dy,
                x2: x2 + dx,
                y2: y2 + dy,
                thickness,
                color,
            },
        }
    }
}

/// A horizontal strip of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    pub height: f32,
    /// Start a new page before this slab.
    pub page_break_before: bool,
    /// Vertical spacing only; dropped at the top of a page.
    pub spacing: bool,
    pub draws: Vec<Draw>,
}

impl Slab {
    fn spacing(height: f32, page_break_before: bool) -> Self {
        Self {
            height,
            page_break_before,
            spacing: true,
            draws: Vec::new(),
        }
    }
}

/// Total height of a slab sequence, ignoring trailing spacing.
pub fn stack_height(slabs: &[Slab]) -> f32 {
    let end = slabs.iter().rposition(|s| !s.spacing).map_or(0, |i| i + 1);
    slabs[..end].iter().map(|s| s.height).sum()
}

/// Character style of a run after paragraph defaults are applied.
#[derive(Debug, Clone, PartialEq)]
struct RunStyle {
    face: FontFace,
    size_pt: f32,
    color: Color,
    underline: bool,
    strike: bool,
    shading: Option<Color>,
    /// Baseline shift, negative is up.
    rise: f32,
}

/// A fragment placed on a line, before alignment.
#[derive(Debug, Clone)]
struct Placed {
    x: f32,
    width: f32,
    piece: Piece,
    style: RunStyle,
}

#[derive(Debug, Clone, Default)]
struct Line {
    items: Vec<Placed>,
    width: f32,
    page_break_before: bool,
}

impl Line {
    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn max_size(&self, base: f32) -> f32 {
        self.items.iter().map(|p| p.style.size_pt).fold(base, f32::max)
    }

    /// Drop trailing spaces from the last fragment.
    fn trim_end(&mut self) {
        if let Some(last) = self.items.last_mut() {
            if let Piece::Text(text) = &mut last.piece {
                let trimmed = text.trim_end_matches(' ').len();
                let removed = (text.len() - trimmed) as f32;
                if removed > 0.0 {
                    text.truncate(trimmed);
                    let cut = last.style.face.measure(removed, last.style.size_pt);
                    last.width = (last.width - cut).max(0.0);
                }
            }
        }
        self.width = self.items.last().map_or(0.0, |p| p.x + p.width);
    }
}

/// Greedy word wrapper for one paragraph.
struct LineBuilder {
    avail: f32,
    keep_spaces: bool,
    lines: Vec<Line>,
    current: Line,
    break_pending: bool,
}

impl LineBuilder {
    fn new(avail: f32, keep_spaces: bool) -> Self {
        Self {
            avail,
            keep_spaces,
            lines: Vec::new(),
            current: Line::default(),
            break_pending: false,
        }
    }

    fn push_text(&mut self, text: &str, style: &RunStyle) {
        for token in tokens(text) {
            let chars = token.chars().count() as f32;
            let width = style.face.measure(chars, style.size_pt);
            if token.starts_with(' ') {
                if self.current.is_empty() && !self.keep_spaces {
                    continue;
                }
                self.place(Piece::Text(token.to_owned()), width, style);
            } else if width <= self.avail {
                if self.current.width + width > self.avail && !self.current.is_empty() {
                    self.break_line();
                }
                self.place(Piece::Text(token.to_owned()), width, style);
            } else {
                self.push_long_word(token, style);
            }
        }
    }

    /// A word wider than the line, broken wherever it overflows.
    fn push_long_word(&mut self, word: &str, style: &RunStyle) {
        let glyph = style.face.measure(1.0, style.size_pt);
        let mut chunk = String::new();
        for c in word.chars() {
            let used = self.current.width + glyph * (chunk.chars().count() as f32 + 1.0);
            if used > self.avail && !(chunk.is_empty() && self.current.is_empty()) {
                if !chunk.is_empty() {
                    let width = glyph * chunk.chars().count() as f32;
                    self.place(Piece::Text(std::mem::take(&mut chunk)), width, style);
                }
                self.break_line();
            }
            chunk.push(c);
        }
        if !chunk.is_empty() {
            let width = glyph * chunk.chars().count() as f32;
            self.place(Piece::Text(chunk), width, style);
        }
    }

    fn push_field(&mut self, code: FieldCode, style: &RunStyle) {
        let width = style.face.measure(FIELD_CHARS, style.size_pt);
        if self.current.width + width > self.avail && !self.current.is_empty() {
            self.break_line();
        }
        self.place(Piece::Field(code), width, style);
    }

    fn push_tab(&mut self) {
        let next = ((self.current.width / TAB_STOP_PT).floor() + 1.0) * TAB_STOP_PT;
        if next > self.avail {
            self.break_line();
        } else {
            self.current.width = next;
        }
    }

    fn place(&mut self, piece: Piece, width: f32, style: &RunStyle) {
        let x = self.current.width;
        if let (Piece::Text(text), Some(last)) = (&piece, self.current.items.last_mut()) {
            if let Piece::Text(prev) = &mut last.piece {
                if last.style == *style && (last.x + last.width - x).abs() < f32::EPSILON {
                    prev.push_str(text);
                    last.width += width;
                    self.current.width += width;
                    return;
                }
            }
        }
        self.current.items.push(Placed {
            x,
            width,
            piece,
            style: style.clone(),
        });
        self.current.width = x + width;
    }

    fn break_line(&mut self) {
        let mut line = std::mem::take(&mut self.current);
        if !self.keep_spaces {
            line.trim_end();
        }
        line.page_break_before = std::mem::take(&mut self.break_pending);
        self.lines.push(line);
    }

    fn page_break(&mut self) {
        if !self.current.is_empty() {
            self.break_line();
        }
        self.break_pending = true;
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.current.is_empty() || self.lines.is_empty() || self.break_pending {
            self.break_line();
        }
        self.lines
    }
}

/// Split text into words and runs of spaces.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let is_space = first == ' ';
        let end = rest
            .char_indices()
            .find(|(_, c)| (*c == ' ') != is_space)
            .map_or(rest.len(), |(i, _)| i);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

/// Paragraph-level defaults a style implies.
struct ParagraphLook {
    size_pt: f32,
    bold: bool,
    family: FontFamily,
    before: f32,
    after: f32,
}

/// Lays out converted blocks for a fixed content width.
pub struct TextLayout<'a> {
    numbering: &'a Numbering,
    family: FontFamily,
    size_pt: f32,
    /// Running counters of ordered lists, keyed by `(num_id, level)`.
    counters: HashMap<(u32, u8), u32>,
}

impl<'a> TextLayout<'a> {
    pub fn new(numbering: &'a Numbering, family: FontFamily, size_pt: f32) -> Self {
        Self {
            numbering,
            family,
            size_pt,
            counters: HashMap::new(),
        }
    }

    pub fn layout(&mut self, blocks: &[Block], width: f32) -> Vec<Slab> {
        let mut out = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(p) => self.paragraph(p, width, &mut out),
                Block::Table(t) => self.table(t, width, &mut out),
            }
        }
        out
    }

    fn look(&self, style: Option<ParagraphStyle>) -> ParagraphLook {
        let normal = ParagraphLook {
            size_pt: self.size_pt,
            bold: false,
            family: self.family,
            before: 0.0,
            after: PARAGRAPH_AFTER_PT,
        };
        match style {
            Some(ParagraphStyle::Heading(level)) => {
                let idx = usize::from(level.clamp(1, 6) - 1);
                ParagraphLook {
                    size_pt: HEADING_SIZES[idx] as f32 / 2.0,
                    bold: true,
                    before: HEADING_BEFORE_PT,
                    after: HEADING_AFTER_PT,
                    ..normal
                }
            }
            Some(ParagraphStyle::Preformatted) => ParagraphLook {
                family: FontFamily::Courier,
                after: 0.0,
                ..normal
            },
            Some(ParagraphStyle::ListParagraph) => ParagraphLook { after: 2.0, ..normal },
            None => normal,
        }
    }

    fn run_style(&self, props: &RunProps, look: &ParagraphLook) -> RunStyle {
        let mut size_pt = props
            .size_half_points
            .map_or(look.size_pt, |half| half as f32 / 2.0);
        let mut rise = 0.0;
        if props.superscript {
            rise = -size_pt * 0.35;
            size_pt *= 0.65;
        } else if props.subscript {
            rise = size_pt * 0.15;
            size_pt *= 0.65;
        }
        let color = props
            .color
            .as_deref()
            .or(props.hyperlink_style.then_some(HYPERLINK_COLOR))
            .and_then(Color::from_hex)
            .unwrap_or(Color::BLACK);
        RunStyle {
            face: FontFace {
                family: props.font.as_deref().map_or(look.family, FontFamily::from_name),
                bold: props.bold || look.bold,
                italic: props.italic,
            },
            size_pt,
            color,
            underline: props.underline || props.hyperlink_style,
            strike: props.strike,
            shading: props.shading.as_deref().and_then(Color::from_hex),
            rise,
        }
    }

    fn paragraph(&mut self, p: &Paragraph, width: f32, out: &mut Vec<Slab>) {
        let props = &p.props;
        let look = self.look(props.style);
        let before = props.spacing_before.map_or(look.before, twips_to_pt);
        let after = props.spacing_after.map_or(look.after, twips_to_pt);
        let mut indent = props.indent_left.map_or(0.0, twips_to_pt);
        let marker = props.numbering.map(|num| {
            indent += LIST_INDENT_PT * (f32::from(num.level) + 1.0);
            self.marker(num.num_id, num.level)
        });
        let indent = indent.min(width - MIN_LINE_WIDTH_PT).max(0.0);
        let avail = (width - indent).max(MIN_LINE_WIDTH_PT);

        let mut page_break = props.page_break_before;
        if before > 0.0 {
            out.push(Slab::spacing(before, std::mem::take(&mut page_break)));
        }

        if !(p.inlines.is_empty() && props.bottom_border) {
            let keep_spaces = props.style == Some(ParagraphStyle::Preformatted);
            let mut builder = LineBuilder::new(avail, keep_spaces);
            for run in p.inlines.iter().flat_map(|i| i.runs()) {
                let style = self.run_style(&run.props, &look);
                match &run.content {
                    RunContent::Text(text) => builder.push_text(text, &style),
                    RunContent::LineBreak => builder.break_line(),
                    RunContent::PageBreak => builder.page_break(),
                    RunContent::Tab => builder.push_tab(),
                    RunContent::Field(code) => builder.push_field(*code, &style),
                }
            }

            let shading = props.shading.as_deref().and_then(Color::from_hex);
            for (n, line) in builder.finish().into_iter().enumerate() {
                let mut slab = self.line_slab(&line, &look, props.align, indent, avail, shading);
                slab.page_break_before = line.page_break_before || std::mem::take(&mut page_break);
                if n == 0 {
                    if let Some(text) = &marker {
                        let style = self.run_style(&RunProps::default(), &look);
                        slab.draws.insert(0, Draw::Text {
                            x: (indent - LIST_HANGING_PT).max(0.0),
                            baseline: line.max_size(look.size_pt) * BASELINE,
                            fragment: Fragment {
                                piece: Piece::Text(text.clone()),
                                face: style.face,
                                size_pt: style.size_pt,
                                color: style.color,
                            },
                        });
                    }
                }
                out.push(slab);
            }
        }

        if props.bottom_border {
            let mid = RULE_SLAB_PT / 2.0;
            out.push(Slab {
                height: RULE_SLAB_PT,
                page_break_before: std::mem::take(&mut page_break),
                spacing: false,
                draws: vec![Draw::Rule {
                    x1: indent,
                    y1: mid,
                    x2: width,
                    y2: mid,
                    thickness: 0.75,
                    color: Color::GRAY,
                }],
            });
        }

        if after > 0.0 {
            out.push(Slab::spacing(after, false));
        }
    }

    fn line_slab(
        &self,
        line: &Line,
        look: &ParagraphLook,
        align: Option<TextAlign>,
        indent: f32,
        avail: f32,
        shading: Option<Color>,
    ) -> Slab {
        let max_size = line.max_size(look.size_pt);
        let height = max_size * LINE_HEIGHT;
        let baseline = max_size * BASELINE;
        let shift = match align {
            Some(TextAlign::Center) => (avail - line.width).max(0.0) / 2.0,
            Some(TextAlign::Right) => (avail - line.width).max(0.0),
            _ => 0.0,
        };

        let mut fills = Vec::new();
        let mut texts = Vec::new();
        let mut rules = Vec::new();
        if let Some(color) = shading {
            fills.push(Draw::Fill { x: indent, y: 0.0, width: avail, height, color });
        }
        for item in &line.items {
            let x = indent + shift + item.x;
            let style = &item.style;
            let base = baseline + style.rise;
            if let Some(color) = style.shading {
                fills.push(Draw::Fill { x, y: 0.0, width: item.width, height, color });
            }
            let thickness = (style.size_pt / 18.0).max(0.5);
            if style.underline {
                let y = base + style.size_pt * 0.12;
                rules.push(Draw::Rule { x1: x, y1: y, x2: x + item.width, y2: y, thickness, color: style.color });
            }
            if style.strike {
                let y = base - style.size_pt * 0.28;
                rules.push(Draw::Rule { x1: x, y1: y, x2: x + item.width, y2: y, thickness, color: style.color });
            }
            texts.push(Draw::Text {
                x,
                baseline: base,
                fragment: Fragment {
                    piece: item.piece.clone(),
                    face: style.face,
                    size_pt: style.size_pt,
                    color: style.color,
                },
            });
        }

        fills.extend(texts);
        fills.extend(rules);
        Slab {
            height,
            page_break_before: false,
            spacing: false,
            draws: fills,
        }
    }

    fn table(&mut self, table: &Table, width: f32, out: &mut Vec<Slab>) {
        let columns = table.grid_columns().max(1) as f32;
        let column_width = width / columns;

        for row in &table.rows {
            let mut x = 0.0;
            let mut cells = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                let cell_width = column_width * cell.col_span.max(1) as f32;
                let inner = (cell_width - 2.0 * CELL_PADDING_PT).max(1.0);
                let slabs = self.layout(&cell.blocks, inner);
                cells.push((x, cell_width, cell, slabs));
                x += cell_width;
            }
            let height = cells
                .iter()
                .map(|(.., slabs)| stack_height(slabs))
                .fold(0.0, f32::max)
                + 2.0 * CELL_PADDING_PT;

            let mut fills = Vec::new();
            let mut content = Vec::new();
            let mut borders = Vec::new();
            for (x, cell_width, cell, slabs) in cells {
                if let Some(color) = cell.shading.as_deref().and_then(Color::from_hex) {
                    fills.push(Draw::Fill { x, y: 0.0, width: cell_width, height, color });
                }
                let mut y = CELL_PADDING_PT;
                for slab in slabs {
                    content.extend(slab.draws.into_iter().map(|d| d.offset(x + CELL_PADDING_PT, y)));
                    y += slab.height;
                }
                if table.borders {
                    let right = x + cell_width;
                    for (x1, y1, x2, y2) in [
                        (x, 0.0, right, 0.0),
                        (right, 0.0, right, height),
                        (x, height, right, height),
                        (x, 0.0, x, height),
                    ] {
                        borders.push(Draw::Rule { x1, y1, x2, y2, thickness: 0.5, color: Color::BLACK });
                    }
                }
            }

            fills.extend(content);
            fills.extend(borders);
            out.push(Slab {
                height,
                page_break_before: false,
                spacing: false,
                draws: fills,
            });
        }
        out.push(Slab::spacing(PARAGRAPH_AFTER_PT, false));
    }

    /// Marker text for the next item of a list at `level`.
    fn marker(&mut self, num_id: u32, level: u8) -> String {
        let instance = self.numbering.instances().iter().find(|i| i.num_id == num_id);
        let Some(instance) = instance.filter(|i| i.kind == ListKind::Ordered) else {
            return BULLETS[usize::from(level % 3)].to_owned();
        };

        self.counters.retain(|&(id, l), _| id != num_id || l <= level);
        let start = instance
            .start_override
            .filter(|&(l, _)| l == level)
            .map_or(1, |(_, start)| start);
        let counter = self
            .counters
            .entry((num_id, level))
            .or_insert_with(|| start.saturating_sub(1));
        *counter = counter.saturating_add(1);
        format!("{}.", ordinal(*counter, level))
    }
}

fn twips_to_pt(twips: u32) -> f32 {
    twips as f32 / 20.0
}

/// Ordinal text in the format of a list level: decimal, then lower-case
/// letters, then lower-case roman numerals.
fn ordinal(n: u32, level: u8) -> String {
    match level % 3 {
        0 => n.to_string(),
        1 => {
            let mut n = n.max(1);
            let mut letters = Vec::new();
            while n > 0 {
                n -= 1;
                letters.push(char::from(b'a' + (n % 26) as u8));
                n /= 26;
            }
            letters.iter().rev().collect()
        }
        _ => roman(n),
    }
}

fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    if n == 0 {
        return "0".into();
    }
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::HtmlConverter;

    fn layout(html: &str, width: f32) -> Vec<Slab> {
        let mut numbering = Numbering::default();
        let blocks = HtmlConverter::new(&mut numbering, 11.0)
            .convert_html(html)
            .unwrap();
        TextLayout::new(&numbering, FontFamily::Helvetica, 11.0).layout(&blocks, width)
    }

    fn texts(slab: &Slab) -> Vec<String> {
        slab.draws
            .iter()
            .filter_map(|d| match d {
                Draw::Text { fragment: Fragment { piece: Piece::Text(t), .. }, .. } => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn lines(slabs: &[Slab]) -> Vec<String> {
        slabs
            .iter()
            .filter(|s| !s.spacing)
            .map(|s| texts(s).concat())
            .collect()
    }

    #[test]
    fn tokens_alternate_words_and_spaces() {
        let all: Vec<_> = tokens("ab  cd e").collect();
        assert_eq!(all, ["ab", "  ", "cd", " ", "e"]);
    }

    #[test]
    fn long_paragraphs_wrap_at_word_boundaries() {
        let slabs = layout("<p>alpha beta gamma delta epsilon</p>", 100.0);
        let lines = lines(&slabs);
        assert!(lines.len() > 1, "{lines:?}");
        assert_eq!(lines.join(" "), "alpha beta gamma delta epsilon");
        assert!(lines.iter().all(|l| !l.ends_with(' ')));
        assert!(slabs.last().unwrap().spacing);
    }

    #[test]
    fn overlong_words_are_split() {
        let word = "x".repeat(200);
        let lines = lines(&layout(&format!("<p>{word}</p>"), 100.0));
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn ordered_lists_count_and_nest() {
        let html = "<ol start=\"3\"><li>a</li><li>b<ol><li>c</li><li>d</li></ol></li><li>e</li></ol>\
                    <ul><li>f</li></ul>";
        let lines = lines(&layout(html, 400.0));
        assert_eq!(lines, ["3.a", "4.b", "a.c", "b.d", "5.e", "\u{2022}f"]);
    }

    #[test]
    fn centred_lines_shift_right() {
        let slabs = layout("<p style=\"text-align:center\">hi</p><p>hi</p>", 400.0);
        let x = |slab: &Slab| match &slab.draws[0] {
            Draw::Text { x, .. } => *x,
            other => panic!("unexpected {other:?}"),
        };
        let body: Vec<_> = slabs.iter().filter(|s| !s.spacing).collect();
        assert!(x(body[0]) > 150.0);
        assert_eq!(x(body[1]), 0.0);
    }

    #[test]
    fn page_breaks_mark_the_next_slab() {
        let slabs = layout("<p>one</p><p style=\"page-break-before: always\">two</p>", 400.0);
        let two = slabs.iter().find(|s| texts(s).concat() == "two").unwrap();
        assert!(two.page_break_before);
    }

    #[test]
    fn headings_are_large_and_bold() {
        let slabs = layout("<h1>Title</h1>", 400.0);
        let text = slabs
            .iter()
            .flat_map(|s| &s.draws)
            .find_map(|d| match d {
                Draw::Text { fragment, .. } => Some(fragment.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(text.size_pt, 16.0);
        assert!(text.face.bold);
        assert!(slabs[0].spacing);
    }

    #[test]
    fn table_rows_become_single_slabs_with_borders() {
        let slabs = layout(
            "<table border=\"1\"><tr><td>a</td><td>b</td></tr><tr><td colspan=\"2\">c</td></tr></table>",
            400.0,
        );
        let rows: Vec<_> = slabs.iter().filter(|s| !s.spacing).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(texts(rows[0]), ["a", "b"]);
        let rules = rows[0].draws.iter().filter(|d| matches!(d, Draw::Rule { .. })).count();
        assert_eq!(rules, 8);
    }

    #[test]
    fn fields_stay_unresolved() {
        let slabs = layout("<p>Page {page_number} of {total_pages}</p>", 400.0);
        let fields = slabs[0]
            .draws
            .iter()
            .filter(|d| matches!(d, Draw::Text { fragment: Fragment { piece: Piece::Field(_), .. }, .. }))
            .count();
        assert_eq!(fields, 2);
    }

    #[test]
    fn horizontal_rules_draw_a_line() {
        let slabs = layout("<hr>", 400.0);
        assert!(slabs.iter().any(|s| s.draws.iter().any(|d| matches!(d, Draw::Rule { .. }))));
    }

    #[test]
    fn font_names_map_to_standard_families() {
        assert_eq!(FontFamily::from_name("Courier New"), FontFamily::Courier);
        assert_eq!(FontFamily::from_name("Times New Roman"), FontFamily::Times);
        assert_eq!(FontFamily::from_name("DejaVu Sans"), FontFamily::Helvetica);
        assert_eq!(FontFamily::from_name("Arial"), FontFamily::Helvetica);
    }

    #[test]
    fn ordinals_follow_level_formats() {
        assert_eq!(ordinal(4, 0), "4");
        assert_eq!(ordinal(28, 1), "ab");
        assert_eq!(ordinal(14, 2), "xiv");
    }

    #[test]
    fn colours_fade_over_white() {
        let red = Color::from_hex("FF0000").unwrap();
        assert_eq!(red.over_white(0.0), Color { r: 1.0, g: 1.0, b: 1.0 });
        assert_eq!(red.over_white(1.0), red);
        assert!(Color::from_hex("zz0000").is_none());
    }
}
