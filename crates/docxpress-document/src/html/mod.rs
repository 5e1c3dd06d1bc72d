// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTML module: parsing into an owned node tree and reading inline styles.

pub mod parser;
pub mod style;

pub use parser::{Element, HtmlNode, parse_html};
pub use style::{Declarations, TextAlign};
