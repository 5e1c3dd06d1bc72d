// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router assembly.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the service router: four routes, body limit, open CORS, and
/// request tracing.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        .route("/", get(handlers::health))
        .route("/generate-docx", post(handlers::generate_docx))
        .route("/generate-document", post(handlers::generate_document))
        .route("/test-docx", get(handlers::test_docx))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
