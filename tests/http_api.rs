//! End-to-end tests for the HTTP API, driving the router in-process.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use rijmdoc::config::Config;
use rijmdoc::server::{router, AppState};

const DOCUMENT: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    r#"<w:p><w:r><w:t>Lieve {{ voornaam }},</w:t></w:r></w:p>"#,
    r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t>{{ rijm|nl2para }}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>Sint en Piet</w:t></w:r></w:p>"#,
    r#"<w:sectPr/></w:body></w:document>"#,
);

const STYLES: &str = r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

fn write_template(content: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn docx_template() -> NamedTempFile {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [("word/document.xml", DOCUMENT), ("word/styles.xml", STYLES)] {
        writer.start_file(name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    write_template(&writer.finish().unwrap().into_inner())
}

fn app(template: &Path) -> Router {
    let config = Config::default().with_template_path(template);
    router(Arc::new(AppState::new(config)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn document_xml(docx: &[u8]) -> String {
    let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive.by_name("word/document.xml").unwrap().read_to_string(&mut xml).unwrap();
    xml
}

#[tokio::test]
async fn health_reports_ok() {
    let template = docx_template();
    let (status, _, body) = get(&app(template.path()), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Sinterklaas Word Generator is running");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["poems"], 0);
}

#[tokio::test]
async fn generate_word_returns_document() {
    let template = docx_template();
    let app = app(template.path());
    let request = json!({
        "voornaam": "Jan",
        "session_id": "abc123",
        "rijm": "Sinterklaas kapoentje,\ngooi wat in mijn schoentje\n\nDank u Sinterklaasje",
    });

    let (status, headers, body) = post(&app, "/generate-word", &request.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sinterklaas_gedicht_abc123.docx\""
    );

    let xml = document_xml(&body);
    assert!(xml.contains(r#"<w:t xml:space="preserve">Lieve Jan,</w:t>"#));
    assert!(xml.contains(r#"<w:t xml:space="preserve">Sinterklaas kapoentje,</w:t>"#));
    assert!(xml.contains(r#"<w:t xml:space="preserve">gooi wat in mijn schoentje</w:t>"#));
    assert!(xml.contains(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr></w:p>"#));
    assert!(xml.contains("<w:t>Sint en Piet</w:t>"));
    assert!(!xml.contains("{{"));
    assert_eq!(xml.matches("<w:p>").count(), 6);
}

#[tokio::test]
async fn generate_word_keeps_other_parts() {
    let template = docx_template();
    let app = app(template.path());
    let request = json!({ "voornaam": "Jan", "rijm": "Sint" });

    let (status, _, body) = post(&app, "/generate-word", &request.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    let mut archive = ZipArchive::new(Cursor::new(body.as_ref())).unwrap();
    let mut styles = String::new();
    archive.by_name("word/styles.xml").unwrap().read_to_string(&mut styles).unwrap();
    assert_eq!(styles, STYLES);
}

#[tokio::test]
async fn generate_word_requires_name_and_rhyme() {
    let template = docx_template();
    let app = app(template.path());

    for body in [
        json!({ "rijm": "Sint" }).to_string(),
        json!({ "voornaam": "Jan" }).to_string(),
        json!({ "voornaam": "", "rijm": "Sint" }).to_string(),
        json!({ "voornaam": "Jan", "rijm": null }).to_string(),
        "not json".to_string(),
        String::new(),
    ] {
        let (status, _, response) = post(&app, "/generate-word", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json_body(&response)["error"], "voornaam and rijm are required");
    }
}

#[tokio::test]
async fn generate_word_without_template() {
    let app = app(Path::new("/nonexistent/rijmdoc/template_gedicht_sinterklaas.docx"));
    let request = json!({ "voornaam": "Jan", "rijm": "Sint" });

    let (status, _, body) = post(&app, "/generate-word", &request.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["error"], "Template file not found");
}

#[tokio::test]
async fn generate_word_with_broken_template() {
    let template = write_template(b"this is not a zip archive");
    let app = app(template.path());
    let request = json!({ "voornaam": "Jan", "rijm": "Sint" });

    let (status, _, body) = post(&app, "/generate-word", &request.to_string()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body);
    assert_eq!(body["error"], "Failed to generate Word document");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn status_updates_reach_late_subscriber() {
    let template = docx_template();
    let app = app(template.path());

    let (status, _, body) = post(&app, "/status/generating", r#"{"session_id": "abc"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["message"], "Status updated to generating");

    let (status, _, body) = post(&app, "/status/completed", r#"{"session_id": "abc", "poem": "Sint komt eraan"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "success": true, "message": "Poem completed and sent" }));

    let (status, headers, body) = get(&app, "/stream/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/event-stream"));

    let events: Vec<Value> = std::str::from_utf8(&body)
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    assert_eq!(
        events,
        vec![
            json!({ "status": "connected" }),
            json!({ "status": "completed", "session_id": "abc", "poem": "Sint komt eraan" }),
        ]
    );

    let (_, _, body) = get(&app, "/health").await;
    assert_eq!(json_body(&body)["poems"], 1);
}

#[tokio::test]
async fn status_updates_require_fields() {
    let template = docx_template();
    let app = app(template.path());

    let (status, _, body) = post(&app, "/status/generating", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "session_id is required");

    let (status, _, body) = post(&app, "/status/completed", r#"{"session_id": "abc"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], "session_id and poem are required");
}
