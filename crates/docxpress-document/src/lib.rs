// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpress-document: HTML to WordprocessingML and PDF conversion.
//
// Provides CSS inlining (stylesheet rules folded into `style` attributes), an
// HTML parser producing an owned node tree, a converter lowering that tree to
// paragraphs, runs, lists, and tables, and an OPC packager that writes the
// final `.docx` archive with optional header, footer, and watermark. The same
// block model is laid out and paginated for PDF output.

pub mod docx;
pub mod generator;
pub mod html;
pub mod inline;
pub mod pdf;

// Re-export the primary entry points so callers can use
// `docxpress_document::DocumentGenerator` etc.
pub use generator::{DocumentGenerator, render_format, render_request};
pub use pdf::PdfGenerator;
pub use inline::CssInliner;
