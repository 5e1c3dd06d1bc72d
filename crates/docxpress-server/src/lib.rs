// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docxpress-server: HTTP front end for document generation.
//
// Routes:
//   GET  /                   health text
//   POST /generate-docx      JSON request in, `.docx` out
//   POST /generate-document  JSON request in, PDF or `.docx` out
//   GET  /test-docx          fixed demonstration document
//
// CORS is open to every origin and request bodies are capped by
// `ServerConfig::max_body_bytes`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use server::DocxServer;
pub use state::AppState;
