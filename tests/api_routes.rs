#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use pdfshelf::{api, FileService, MemoryBlobStore, ServerConfig};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "BOUND";

fn app() -> Router {
    app_with(ServerConfig::default())
}

fn app_with(config: ServerConfig) -> Router {
    let service = FileService::builder()
        .blob_store(MemoryBlobStore::with_chunk_size(512))
        .build();
    api::router(Arc::new(service), &config).expect("router should build")
}

fn multipart_body(parts: &[(&str, Option<&str>, &str, &[u8])]) -> Vec<u8> {
    let mut out = Vec::new();
    for (field, file_name, content_type, body) in parts {
        out.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            ),
            None => format!("Content-Disposition: form-data; name=\"{field}\"\r\n"),
        };
        out.extend_from_slice(disposition.as_bytes());
        out.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    out
}

fn upload_request(parts: &[(&str, Option<&str>, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("request should build")
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    let json = serde_json::from_slice(&body).expect("body should be JSON");
    (status, json)
}

async fn upload_pdf(app: &Router, name: &str, bytes: &[u8]) -> String {
    let (status, json) = send_json(
        app,
        upload_request(&[("file", Some(name), "application/pdf", bytes)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {json}");
    json["file"]["blobId"]
        .as_str()
        .expect("blobId should be a string")
        .to_owned()
}

#[tokio::test]
async fn upload_returns_saved_record_and_message() {
    let app = app();
    let (status, json) = send_json(
        &app,
        upload_request(&[("file", Some("report.pdf"), "application/pdf", b"%PDF-1.7")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "File uploaded successfully");
    assert_eq!(json["file"]["filename"], "report.pdf");
    assert_eq!(json["file"]["contentType"], "application/pdf");
    assert_eq!(json["file"]["length"], 8);
    assert!(json["file"]["id"].is_string());
    assert!(json["file"]["uploadDate"].is_string());
}

#[tokio::test]
async fn upload_ignores_other_fields() {
    let app = app();
    let (status, json) = send_json(
        &app,
        upload_request(&[
            ("note", None, "text/plain", b"hello"),
            ("attachment", Some("other.pdf"), "application/pdf", b"x"),
            ("file", Some("report.pdf"), "application/pdf", b"%PDF"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["file"]["filename"], "report.pdf");
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let app = app();
    let (status, json) = send_json(
        &app,
        upload_request(&[("note", None, "text/plain", b"hello")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_with_non_multipart_body_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .expect("request should build");
    let (status, json) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_with_truncated_multipart_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.pdf\"\r\n"
        )))
        .expect("request should build");
    let (status, json) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn duplicate_upload_is_bad_request() {
    let app = app();
    upload_pdf(&app, "report.pdf", b"one").await;

    let (status, json) = send_json(
        &app,
        upload_request(&[("file", Some("report.pdf"), "application/pdf", b"two")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "A file with the same name already exists. Please choose a different name."
    );

    let (_, listing) = send_json(&app, request(Method::GET, "/")).await;
    assert_eq!(listing.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn list_is_newest_first_without_internal_fields() {
    let app = app();
    for name in ["F1.pdf", "F2.pdf", "F3.pdf"] {
        upload_pdf(&app, name, b"%PDF").await;
    }

    let (status, json) = send_json(&app, request(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().expect("listing should be an array");
    let names: Vec<_> = entries
        .iter()
        .map(|entry| entry["filename"].as_str().expect("filename"))
        .collect();
    assert_eq!(names, ["F3.pdf", "F2.pdf", "F1.pdf"]);

    let first = entries[0].as_object().expect("entry should be an object");
    let mut keys: Vec<_> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["filename", "id", "length", "uploadDate"]);
}

#[tokio::test]
async fn download_and_view_set_disposition() {
    let app = app();
    let blob_id = upload_pdf(&app, "report.pdf", b"%PDF-1.7 body").await;

    let (status, headers, body) = send(&app, request(Method::GET, &format!("/pdf/{blob_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    assert_eq!(headers[header::CONTENT_LENGTH], "13");
    assert_eq!(body, b"%PDF-1.7 body");

    let (status, headers, body) =
        send(&app, request(Method::GET, &format!("/pdf/{blob_id}/view"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"report.pdf\""
    );
    assert_eq!(body, b"%PDF-1.7 body");
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let app = app();
    for uri in [
        "/pdf/00000000-0000-4000-8000-000000000000",
        "/pdf/00000000-0000-4000-8000-000000000000/view",
        "/pdf/not-an-id",
        "/pdf/not-an-id/view",
    ] {
        let (status, json) = send_json(&app, request(Method::GET, uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(json["error"], "File not found");
    }

    let (status, _) = send_json(&app, request(Method::DELETE, "/pdf/not-an-id/delete")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_delete_again() {
    let app = app();
    let blob_id = upload_pdf(&app, "report.pdf", b"%PDF").await;
    let uri = format!("/pdf/{blob_id}/delete");

    let (status, json) = send_json(&app, request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "File and document successfully deleted");

    let (status, _) = send_json(&app, request(Method::DELETE, &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn report_lifecycle_end_to_end() {
    let app = app();
    let data: Vec<u8> = (0..1024u32).map(|i| (i % 256) as u8).collect();
    let blob_id = upload_pdf(&app, "report.pdf", &data).await;

    let (_, listing) = send_json(&app, request(Method::GET, "/")).await;
    let entries = listing.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["length"], 1024);
    assert_eq!(entries[0]["id"], blob_id.as_str());

    let view_uri = format!("/pdf/{blob_id}/view");
    let (status, headers, body) = send(&app, request(Method::GET, &view_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"report.pdf\""
    );
    assert_eq!(body, data);

    let (status, _) =
        send_json(&app, request(Method::DELETE, &format!("/pdf/{blob_id}/delete"))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send_json(&app, request(Method::GET, "/")).await;
    assert!(listing.as_array().expect("array").is_empty());

    let (status, _, _) = send(&app, request(Method::GET, &view_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app_with(ServerConfig {
        max_upload_bytes: 256,
        ..ServerConfig::default()
    });
    let big = vec![b'x'; 4096];
    let (status, json) = send_json(
        &app,
        upload_request(&[("file", Some("big.pdf"), "application/pdf", &big)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["error"], "File too large");

    let (_, listing) = send_json(&app, request(Method::GET, "/")).await;
    assert!(listing.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn cors_headers_are_present() {
    let app = app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header(header::ORIGIN, "https://viewer.example.com")
        .body(Body::empty())
        .expect("request should build");
    let (status, headers, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_respects_configured_origins() {
    let app = app_with(ServerConfig {
        cors_allowed_origins: vec!["https://docs.example.com".to_owned()],
        ..ServerConfig::default()
    });
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header(header::ORIGIN, "https://docs.example.com")
        .body(Body::empty())
        .expect("request should build");
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://docs.example.com"
    );
}
