// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CSS inlining: folds `<style>` rules into per-element `style` attributes so
// the converter only ever reads inline declarations.

use tracing::debug;

use docxpress_core::error::{DocxpressError, Result};

/// Shared, thread-safe CSS inliner.
///
/// `<style>` blocks are applied and removed; remote stylesheets are never
/// fetched.
pub struct CssInliner {
    inner: css_inline::CSSInliner<'static>,
}

impl CssInliner {
    pub fn new() -> Self {
        let inner = css_inline::CSSInliner::options()
            .keep_style_tags(false)
            .load_remote_stylesheets(false)
            .build();
        Self { inner }
    }

    /// Inline CSS into an HTML fragment or document.
    ///
    /// Empty input yields empty output without touching the inliner. The
    /// result is a complete HTML document.
    pub fn inline(&self, html: &str) -> Result<String> {
        if html.is_empty() {
            return Ok(String::new());
        }
        let inlined = self
            .inner
            .inline(html)
            .map_err(|e| DocxpressError::CssInline(e.to_string()))?;
        debug!(input_len = html.len(), output_len = inlined.len(), "inlined CSS");
        Ok(inlined)
    }
}

impl Default for CssInliner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CssInliner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssInliner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(CssInliner::new().inline("").unwrap(), "");
    }

    #[test]
    fn style_rules_become_attributes() {
        let html = "<style>p.note { color: red; }</style><p class=\"note\">Hi</p>";
        let out = CssInliner::new().inline(html).unwrap();
        assert!(out.contains("color: red"), "{out}");
        assert!(!out.contains("<style>"), "{out}");
        assert!(out.contains(">Hi</p>"), "{out}");
    }

    #[test]
    fn placeholders_survive() {
        let out = CssInliner::new()
            .inline("<div>Page {page_number} of {total_pages}</div>")
            .unwrap();
        assert!(out.contains("Page {page_number} of {total_pages}"));
    }
}
