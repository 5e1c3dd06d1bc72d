// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP mapping of docxpress errors.
//
// Client mistakes become 400 with the message in `error`. Everything else is
// a generation failure: the cause is logged and the caller sees one fixed
// message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use docxpress_core::DocxpressError;

/// Body of every 500 from the generation routes.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate document";

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] DocxpressError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::BAD_REQUEST {
            warn!(error = %self.0, "rejected request");
            self.0.to_string()
        } else {
            error!(error = %self.0, "document generation failed");
            GENERATION_FAILED_MESSAGE.to_owned()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_requests() {
        let err = ApiError::from(DocxpressError::MissingField("content_html"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conversion_errors_are_internal() {
        let err = ApiError::from(DocxpressError::Package("zip".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = ApiError::from(DocxpressError::Task("panicked".into()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
