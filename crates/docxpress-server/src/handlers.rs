// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Route handlers.
//
// Conversion is CPU-bound, so inlining and generation run on Tokio's
// blocking pool; the handlers only parse, dispatch, and shape responses.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use docxpress_core::DocxpressError;
use docxpress_core::types::{DOCX_MIME_TYPE, DocumentRequest, FormatRequest};
use docxpress_document::generator::demo_document;
use docxpress_document::{render_format, render_request};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /`.
pub const HEALTH_MESSAGE: &str = "HTML to DOCX Converter API is running";

/// Body of a failed `GET /test-docx`.
pub const DEMO_FAILED_MESSAGE: &str = "Document generation failed";

/// `GET /`: liveness text.
pub async fn health() -> &'static str {
    HEALTH_MESSAGE
}

/// `POST /generate-docx`: convert the request's HTML into a `.docx`.
///
/// The body is parsed here rather than through `Json` so that an empty body
/// reads as `{}` and malformed JSON yields this API's own error shape.
pub async fn generate_docx(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_docx", %request_id, body_len = body.len());

    async move {
        let request: DocumentRequest = parse_request(&body)?;
        request.validate()?;

        let inliner = Arc::clone(&state.inliner);
        let defaults = state.config.document.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            render_request(&request, &inliner, &defaults)
        })
        .await
        .map_err(|e| DocxpressError::Task(e.to_string()))??;

        info!(bytes = bytes.len(), sha256 = %digest(&bytes), "document ready");
        Ok::<_, ApiError>(attachment(bytes, DOCX_MIME_TYPE, "document.docx"))
    }
    .instrument(span)
    .await
}

/// `POST /generate-document`: like `/generate-docx`, but the output format
/// comes from `document_type` (`pdf` or `docx`) and validation is strict.
pub async fn generate_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("generate_document", %request_id, body_len = body.len());

    async move {
        let request: FormatRequest = parse_request(&body)?;
        let kind = request.validate()?;

        let inliner = Arc::clone(&state.inliner);
        let defaults = state.config.document.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            render_format(kind, &request.document, &inliner, &defaults)
        })
        .await
        .map_err(|e| DocxpressError::Task(e.to_string()))??;

        info!(?kind, bytes = bytes.len(), sha256 = %digest(&bytes), "document ready");
        Ok::<_, ApiError>(attachment(bytes, kind.mime_type(), kind.filename()))
    }
    .instrument(span)
    .await
}

/// `GET /test-docx`: the fixed demonstration document.
pub async fn test_docx(State(state): State<AppState>) -> Response {
    let defaults = state.config.document.clone();
    let result = tokio::task::spawn_blocking(move || demo_document(&defaults))
        .await
        .map_err(|e| DocxpressError::Task(e.to_string()))
        .and_then(|inner| inner);

    match result {
        Ok(bytes) => {
            info!(bytes = bytes.len(), sha256 = %digest(&bytes), "demo document ready");
            attachment(bytes, DOCX_MIME_TYPE, "test-document.docx")
        }
        Err(e) => {
            error!(error = %e, "demo document generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, DEMO_FAILED_MESSAGE).into_response()
        }
    }
}

fn parse_request<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, DocxpressError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| DocxpressError::InvalidRequest(format!("invalid request body: {e}")))
}

fn attachment(bytes: Vec<u8>, mime_type: &str, filename: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
