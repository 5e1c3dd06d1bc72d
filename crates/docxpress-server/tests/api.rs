// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests for the HTTP API, driven through the router in-process.

use std::io::{Cursor, Read};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use docxpress_core::AppConfig;
use docxpress_core::types::{DOCX_MIME_TYPE, PDF_MIME_TYPE};
use docxpress_server::handlers::HEALTH_MESSAGE;
use docxpress_server::{AppState, build_router};

fn app() -> Router {
    build_router(AppState::new(AppConfig::default()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn post_json(body: impl Into<Body>) -> Request<Body> {
    post_to("/generate-docx", body)
}

fn post_to(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn error_of(request: Request<Body>) -> (StatusCode, String) {
    let (status, _, bytes) = send(app(), request).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json["error"].as_str().unwrap().to_owned())
}

fn part(docx: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    Some(xml)
}

#[tokio::test]
async fn health_returns_running_text() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), HEALTH_MESSAGE);
}

#[tokio::test]
async fn missing_content_is_rejected() {
    let bodies = [
        "{}",
        r#"{"content_html": ""}"#,
        r#"{"content_html": null}"#,
        r#"{"header_html": "<p>only a header</p>"}"#,
        "",
    ];

    for body in bodies {
        let (status, _, bytes) = send(app(), post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, json!({ "error": "content_html is required" }), "body {body:?}");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (status, _, bytes) = send(app(), post_json("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn generates_a_docx_attachment() {
    let body = json!({
        "content_html": "<style>p { color: red }</style><h1>Report</h1><p>Hello</p>",
        "header_html": "<p>Acme</p>",
    });
    let (status, headers, docx) = send(app(), post_json(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], DOCX_MIME_TYPE);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=document.docx"
    );
    assert_eq!(&docx[..2], b"PK");

    let document = part(&docx, "word/document.xml").unwrap();
    assert!(document.contains("Report"));
    assert!(document.contains("Hello"));
    assert!(document.contains("FF0000"), "inlined colour should reach the run");
    assert!(part(&docx, "word/header1.xml").unwrap().contains("Acme"));
    assert!(part(&docx, "word/footer1.xml").is_none());
}

#[tokio::test]
async fn footer_part_follows_footer_html() {
    let body = json!({
        "content_html": "<p>Body</p>",
        "footer_html": "<p>Page {page_number} of {total_pages}</p>",
    });
    let (status, _, docx) = send(app(), post_json(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let footer = part(&docx, "word/footer1.xml").unwrap();
    assert!(footer.contains("PAGE"));
    assert!(footer.contains("NUMPAGES"));
    assert!(part(&docx, "word/document.xml").unwrap().contains("w:footerReference"));
}

#[tokio::test]
async fn same_request_yields_same_document_body() {
    let body = json!({
        "content_html": "<ul><li>one</li><li>two</li></ul><table border=\"1\"><tr><td>a</td></tr></table>",
        "footer_html": "<p>f</p>",
    })
    .to_string();

    let (_, _, first) = send(app(), post_json(body.clone())).await;
    let (_, _, second) = send(app(), post_json(body)).await;
    assert_eq!(
        part(&first, "word/document.xml"),
        part(&second, "word/document.xml")
    );
    assert_eq!(
        part(&first, "word/numbering.xml"),
        part(&second, "word/numbering.xml")
    );
}

#[tokio::test]
async fn watermark_is_placed_in_the_header() {
    let body = json!({
        "content_html": "<p>Body</p>",
        "watermark_html": "<p>DRAFT</p>",
        "watermark_rotation": -30,
    });
    let (status, _, docx) = send(app(), post_json(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let header = part(&docx, "word/header1.xml").unwrap();
    assert!(header.contains("DRAFT"));
    assert!(header.contains("rotation:330"));
}

#[tokio::test]
async fn out_of_range_watermark_geometry_is_clamped() {
    let body = json!({
        "content_html": "<p>Body</p>",
        "watermark_html": "<p>DRAFT</p>",
        "watermark_opacity": 2.5,
        "watermark_width": 5,
    });
    let (status, _, docx) = send(app(), post_json(body.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let header = part(&docx, "word/header1.xml").unwrap();
    assert!(header.contains("width:5pt;"));
    assert!(header.contains(r#"<v:fill opacity="1"/>"#));
}

#[tokio::test]
async fn generate_document_renders_pdf() {
    let body = json!({
        "document_type": "PDF",
        "content_html": "<style>h1 { color: navy }</style><h1>Report</h1><p>Hello</p>",
        "header_html": "<p>Acme</p>",
        "footer_html": "<p>Page {page_number} of {total_pages}</p>",
        "watermark_html": "<p>DRAFT</p>",
    });
    let (status, headers, pdf) = send(app(), post_to("/generate-document", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], PDF_MIME_TYPE);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=document.pdf"
    );
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 1);
}

#[tokio::test]
async fn generate_document_renders_docx() {
    let body = json!({ "document_type": "docx", "content_html": "<p>Hello</p>" });
    let (status, headers, docx) =
        send(app(), post_to("/generate-document", body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], DOCX_MIME_TYPE);
    assert!(part(&docx, "word/document.xml").unwrap().contains("Hello"));
}

#[tokio::test]
async fn generate_document_rejects_bad_requests() {
    let cases = [
        (json!({ "document_type": "odt", "content_html": "<p>x</p>" }), "Invalid document type"),
        (json!({ "content_html": "<p>x</p>" }), "document_type is required"),
        (json!({ "document_type": "pdf", "content_html": "   " }), "content_html cannot be empty"),
        (json!({ "document_type": "pdf" }), "content_html is required"),
        (
            json!({
                "document_type": "pdf",
                "content_html": "<p>x</p>",
                "watermark_html": "<p>DRAFT</p>",
                "watermark_opacity": 2.5,
            }),
            "watermark_opacity",
        ),
    ];

    for (body, expected) in cases {
        let (status, error) = error_of(post_to("/generate-document", body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(error.contains(expected), "{body}: {error}");
    }
}

#[tokio::test]
async fn test_docx_serves_the_demo_document() {
    let request = Request::get("/test-docx").body(Body::empty()).unwrap();
    let (status, headers, docx) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], DOCX_MIME_TYPE);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=test-document.docx"
    );
    assert!(part(&docx, "word/document.xml").unwrap().contains("hardcoded HTML"));
    assert!(part(&docx, "word/header1.xml").unwrap().contains("ACME Corporation"));
    assert!(part(&docx, "word/footer1.xml").unwrap().contains("Generated on"));
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 1024;
    let app = build_router(AppState::new(config));

    let padding = "x".repeat(4096);
    let body = json!({ "content_html": format!("<p>{padding}</p>") }).to_string();
    let (status, _, _) = send(app, post_json(body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::get("/")
        .header(header::ORIGIN, "https://example.org")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/generate-docx")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(app(), preflight).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
