// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Sources are layered lowest to highest: built-in defaults, an optional TOML
// file, then `DOCXPRESS__SECTION__KEY` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::DocumentDefaults;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DOCXPRESS";

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (default all interfaces).
    pub host: String,
    /// TCP port (default 3000).
    pub port: u16,
    /// Largest accepted request body in bytes (default 10 MiB).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub document: DocumentDefaults,
}

impl AppConfig {
    /// Load configuration, optionally reading a TOML file first.
    ///
    /// A missing file is an error only when a path was given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "reading configuration file");
            builder = builder.add_source(
                config::File::from(path).format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// `host:port` string for binding the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::Orientation;

    #[test]
    fn defaults_listen_on_3000_with_10mb_limit() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.document.font_family, "Times New Roman");
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.max_body_bytes, AppConfig::default().server.max_body_bytes);
        assert_eq!(
            config.document.page.dimensions(Orientation::Portrait),
            (12240, 15840)
        );
    }

    #[test]
    fn file_overrides_individual_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8088\n\n[document]\nfont_family = \"Arial\"\n\n[document.page]\nmargin_left = 720"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.document.font_family, "Arial");
        assert_eq!(config.document.page.margin_left, 720);
        assert_eq!(config.document.page.margin_right, 1800);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }
}
