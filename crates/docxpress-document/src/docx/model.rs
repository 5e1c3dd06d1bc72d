// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WordprocessingML block model.
//
// The converter lowers HTML into these types; the writer serialises them.
// Measurements use OOXML units: twips (1/20 pt) for geometry and half-points
// for font sizes.

use crate::html::TextAlign;

/// Largest run size Word accepts, in points (`w:sz` tops out at 3276).
pub const MAX_FONT_PT: f32 = 1638.0;

/// Font size in points to OOXML half-points, clamped to the valid range.
pub fn half_points(pt: f32) -> u32 {
    ((pt * 2.0).round() as u32).clamp(1, 3276)
}

/// Block-level content of a story (body, header, footer, table cell).
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Built-in paragraph styles defined in `styles.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Heading(u8),
    ListParagraph,
    Preformatted,
}

impl ParagraphStyle {
    /// Style id referenced from `w:pStyle`.
    pub fn style_id(&self) -> String {
        match self {
            Self::Heading(level) => format!("Heading{level}"),
            Self::ListParagraph => "ListParagraph".into(),
            Self::Preformatted => "HTMLPreformatted".into(),
        }
    }
}

/// Reference into `numbering.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    /// Zero-based list nesting level (`w:ilvl`).
    pub level: u8,
}

/// Paragraph properties (`w:pPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProps {
    pub style: Option<ParagraphStyle>,
    pub align: Option<TextAlign>,
    /// Left indent in twips.
    pub indent_left: Option<u32>,
    /// Space before, in twips.
    pub spacing_before: Option<u32>,
    /// Space after, in twips.
    pub spacing_after: Option<u32>,
    pub numbering: Option<NumberingRef>,
    pub page_break_before: bool,
    /// Background fill as `RRGGBB`.
    pub shading: Option<String>,
    /// Draw a bottom rule (used for `<hr>`).
    pub bottom_border: bool,
}

/// Character properties (`w:rPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub superscript: bool,
    pub subscript: bool,
    /// Text colour as `RRGGBB`.
    pub color: Option<String>,
    /// Size in half-points.
    pub size_half_points: Option<u32>,
    pub font: Option<String>,
    /// Background fill as `RRGGBB`.
    pub shading: Option<String>,
    /// Apply the `Hyperlink` character style.
    pub hyperlink_style: bool,
}

/// Dynamic fields rendered by the word processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCode {
    /// Current page number.
    Page,
    /// Total number of pages.
    NumPages,
}

impl FieldCode {
    /// Field instruction text.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Page => "PAGE",
            Self::NumPages => "NUMPAGES",
        }
    }
}

/// What a run carries.
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    LineBreak,
    PageBreak,
    Tab,
    Field(FieldCode),
}

/// A run of uniformly formatted content.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub props: RunProps,
    pub content: RunContent,
}

impl Run {
    pub fn text(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            props,
            content: RunContent::Text(text.into()),
        }
    }
}

/// Paragraph-level inline content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Run(Run),
    /// External link; the writer allocates the relationship id.
    Hyperlink { target: String, runs: Vec<Run> },
}

impl Inline {
    /// Runs contained in this inline, in order.
    pub fn runs(&self) -> &[Run] {
        match self {
            Self::Run(run) => std::slice::from_ref(run),
            Self::Hyperlink { runs, .. } => runs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub props: ParagraphProps,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn new(props: ParagraphProps) -> Self {
        Self {
            props,
            inlines: Vec::new(),
        }
    }

    /// Plain text of all text runs (fields and breaks excluded).
    pub fn text(&self) -> String {
        self.inlines
            .iter()
            .flat_map(Inline::runs)
            .filter_map(|run| match &run.content {
                RunContent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub blocks: Vec<Block>,
    /// Number of grid columns spanned.
    pub col_span: u32,
    /// Background fill as `RRGGBB`.
    pub shading: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    /// Repeat this row at the top of each page.
    pub header: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
    pub borders: bool,
}

impl Table {
    /// Number of grid columns (widest row, counting spans).
    pub fn grid_columns(&self) -> u32 {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.col_span.max(1)).sum::<u32>())
            .max()
            .unwrap_or(0)
    }
}
