// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: line layout over the converted block model, pagination, and
// serialisation with `printpdf`.

pub mod compose;
pub mod layout;
pub mod render;

pub use render::PdfGenerator;
