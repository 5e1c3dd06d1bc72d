// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared, read-only state handed to every handler.

use std::sync::Arc;

use docxpress_core::AppConfig;
use docxpress_document::CssInliner;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// One inliner for all requests; inlining takes `&self`.
    pub inliner: Arc<CssInliner>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            inliner: Arc::new(CssInliner::new()),
        }
    }
}
