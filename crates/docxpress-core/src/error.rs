// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docxpress.

use thiserror::Error;

/// Top-level error type for all docxpress operations.
#[derive(Debug, Error)]
pub enum DocxpressError {
    // -- Request errors --
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidRequest(String),

    // -- Conversion errors --
    #[error("CSS inlining failed: {0}")]
    CssInline(String),

    #[error("HTML parsing failed: {0}")]
    HtmlParse(String),

    #[error("XML serialization failed: {0}")]
    Xml(String),

    #[error("DOCX packaging failed: {0}")]
    Package(String),

    #[error("generation task failed: {0}")]
    Task(String),

    // -- Service --
    #[error("server error: {0}")]
    Server(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocxpressError {
    /// Whether the caller caused this error (bad or missing input) as opposed
    /// to a failure inside the conversion chain.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidRequest(_))
    }
}

impl From<config::ConfigError> for DocxpressError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocxpressError>;
