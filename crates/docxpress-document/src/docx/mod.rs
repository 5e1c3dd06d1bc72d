// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX module: block model, HTML lowering, part writers, and packaging.

pub mod convert;
pub mod model;
pub mod numbering;
pub mod package;
pub mod watermark;
pub mod writer;
pub mod xml;

pub use convert::HtmlConverter;
pub use numbering::Numbering;
pub use package::{Package, Relationships};
pub use watermark::Watermark;
pub use writer::StoryWriter;
