// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagination: stacks body slabs onto pages and frames each page with the
// header and footer regions. Page-number fields are resolved here, once the
// page count is known.

use docxpress_core::types::{Orientation, PageSetup};

use super::layout::{Draw, Piece, Slab, stack_height};
use crate::docx::model::FieldCode;

/// Gap kept between a header or footer and the body, in points.
const REGION_GAP_PT: f32 = 6.0;
/// Smallest body height a page keeps however large the regions grow.
const MIN_BODY_PT: f32 = 72.0;

/// Page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub header_distance: f32,
    pub footer_distance: f32,
}

impl PageGeometry {
    pub fn new(page: &PageSetup, orientation: Orientation) -> Self {
        let pt = |twips: u32| twips as f32 / 20.0;
        let (width, height) = page.dimensions(orientation);
        Self {
            width: pt(width),
            height: pt(height),
            margin_top: pt(page.margin_top),
            margin_right: pt(page.margin_right),
            margin_bottom: pt(page.margin_bottom),
            margin_left: pt(page.margin_left),
            header_distance: pt(page.header_distance),
            footer_distance: pt(page.footer_distance),
        }
    }

    pub fn content_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(1.0)
    }
}

/// One finished page: draws in page coordinates (points from the top-left
/// corner) with every field resolved to text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub draws: Vec<Draw>,
}

/// Running regions repeated on pages.
#[derive(Debug, Clone, Copy)]
pub struct Regions<'a> {
    pub header: &'a [Slab],
    pub footer: &'a [Slab],
    /// Draw the footer on the final page only.
    pub footer_last_page_only: bool,
}

/// Distribute `body` over as many pages as it needs. An empty body still
/// yields one page.
pub fn paginate(body: Vec<Slab>, geometry: &PageGeometry, regions: Regions<'_>) -> Vec<PageLayout> {
    let header_height = stack_height(regions.header);
    let footer_height = stack_height(regions.footer);

    let mut top = geometry.margin_top;
    if header_height > 0.0 {
        top = top.max(geometry.header_distance + header_height + REGION_GAP_PT);
    }
    let mut bottom_margin = geometry.margin_bottom;
    if footer_height > 0.0 {
        bottom_margin = bottom_margin.max(geometry.footer_distance + footer_height + REGION_GAP_PT);
    }
    let usable = (geometry.height - top - bottom_margin).max(MIN_BODY_PT);

    let mut pages: Vec<Vec<(f32, Slab)>> = vec![Vec::new()];
    let mut cursor = 0.0;
    for slab in body {
        let page_has_content = pages.last().is_some_and(|p| !p.is_empty());
        if page_has_content && (slab.page_break_before || cursor + slab.height > usable) {
            pages.push(Vec::new());
            cursor = 0.0;
        }
        if slab.spacing && cursor == 0.0 {
            continue;
        }
        let height = slab.height;
        if let Some(page) = pages.last_mut() {
            page.push((cursor, slab));
        }
        cursor += height;
    }

    let total = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(index, slabs)| {
            let number = index + 1;
            let mut draws = Vec::new();
            place(&mut draws, regions.header, geometry.margin_left, geometry.header_distance);
            for (y, slab) in slabs {
                let dy = top + y;
                draws.extend(slab.draws.into_iter().map(|d| d.offset(geometry.margin_left, dy)));
            }
            if !regions.footer_last_page_only || number == total {
                let footer_top = geometry.height - geometry.footer_distance - footer_height;
                place(&mut draws, regions.footer, geometry.margin_left, footer_top);
            }
            for draw in &mut draws {
                resolve_fields(draw, number, total);
            }
            PageLayout { draws }
        })
        .collect()
}

fn place(draws: &mut Vec<Draw>, slabs: &[Slab], x: f32, top: f32) {
    let mut y = top;
    for slab in slabs {
        draws.extend(slab.draws.iter().cloned().map(|d| d.offset(x, y)));
        y += slab.height;
    }
}

fn resolve_fields(draw: &mut Draw, page: usize, total: usize) {
    if let Draw::Text { fragment, .. } = draw {
        if let Piece::Field(code) = fragment.piece {
            let value = match code {
                FieldCode::Page => page,
                FieldCode::NumPages => total,
            };
            fragment.piece = Piece::Text(value.to_string());
        }
    }
}
