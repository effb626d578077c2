//! Integration tests for the neuroscan-server API
//!
//! Drives the full router in-process with a mock classifier: health,
//! history listing and deletion, both analysis paths, and the JSON
//! error shapes of the validation failures.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use image::{GrayImage, Luma};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use neuroscan_common::config::ServiceConfig;
use neuroscan_common::db::{init_database, HistoryStore};
use neuroscan_common::disease::DiseaseCatalog;
use neuroscan_server::analysis::AnalysisPipeline;
use neuroscan_server::services::{Classification, ClassifierError, TumorClassifier};
use neuroscan_server::{build_router, AppState};

const BOUNDARY: &str = "neuroscan-test-boundary";

struct FixedClassifier(Classification);

#[async_trait]
impl TumorClassifier for FixedClassifier {
    async fn classify(&self, _image: &Path) -> Result<Classification, ClassifierError> {
        Ok(self.0.clone())
    }
}

/// Test helper: build an app around a temp root and a fixed classifier
async fn setup_app(classification: Classification) -> (TempDir, axum::Router) {
    let dir = TempDir::new().expect("temp dir");
    let config = ServiceConfig::with_root(dir.path());
    let pool = init_database(&config.database_path())
        .await
        .expect("init database");
    let store = HistoryStore::new(pool);

    let pipeline = Arc::new(AnalysisPipeline::new(
        config.clone(),
        Arc::new(FixedClassifier(classification)),
        DiseaseCatalog::builtin(),
        store.clone(),
    ));

    let state = AppState::new(pipeline, store, config);
    (dir, build_router(state))
}

fn glioma() -> Classification {
    Classification::Classified {
        label: "Glioma".to_string(),
        confidence: 0.8734,
    }
}

/// Noise image that passes every plausibility rule, encoded as PNG
fn scan_like_png() -> Vec<u8> {
    let mut state: u64 = 7;
    let image = GrayImage::from_fn(64, 64, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let unit = ((state >> 33) as f64) / ((1u64 << 31) as f64);
        Luma([(24.0 + 208.0 * unit) as u8])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Valid PNG that fails the contrast rule
fn flat_png() -> Vec<u8> {
    let image = GrayImage::from_pixel(64, 64, Luma([128]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// One multipart part: name, optional filename, payload
struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

fn text_part<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part {
        name,
        filename: None,
        data: value.as_bytes(),
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn patient_parts<'a>(image: &'a [u8], filename: &'a str) -> Vec<Part<'a>> {
    vec![
        Part {
            name: "image",
            filename: Some(filename),
            data: image,
        },
        text_part("name", "Jane Doe"),
        text_part("dateOfBirth", "1980-04-12"),
        text_part("gender", "F"),
        text_part("contactNumber", "555-0100"),
    ]
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn health_endpoint_reports_module_and_version() {
    let (_dir, app) = setup_app(glioma()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "neuroscan-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn index_page_is_served() {
    let (_dir, app) = setup_app(glioma()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("multipart/form-data"));
}

#[tokio::test]
async fn history_starts_empty() {
    let (_dir, app) = setup_app(glioma()).await;

    let request = Request::builder()
        .method("GET")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn delete_of_missing_record_acknowledges_success() {
    let (_dir, app) = setup_app(glioma()).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/history/9999")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Record deleted successfully");
}

#[tokio::test]
async fn predict_api_without_image_is_missing_image() {
    let (_dir, app) = setup_app(glioma()).await;

    let parts = [text_part("name", "Jane Doe")];
    let response = app
        .oneshot(multipart_request("/predict_api", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn predict_api_rejects_extensionless_filename() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let response = app
        .oneshot(multipart_request("/predict_api", &patient_parts(&image, "scan")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "Invalid file type. Please upload a valid image file (PNG, JPG, JPEG, DCM)"
    );
}

#[tokio::test]
async fn predict_api_reports_missing_fields_by_name() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let parts = [
        Part {
            name: "image",
            filename: Some("scan.png"),
            data: &image,
        },
        text_part("name", "Jane Doe"),
        text_part("dateOfBirth", "1980-04-12"),
        text_part("gender", "F"),
        // contactNumber deliberately absent
    ];
    let response = app
        .oneshot(multipart_request("/predict_api", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Missing required fields");
    assert_eq!(body["missing_fields"], serde_json::json!(["contactNumber"]));
}

#[tokio::test]
async fn predict_api_rejects_implausible_image() {
    let (dir, app) = setup_app(glioma()).await;

    let image = flat_png();
    let response = app
        .oneshot(multipart_request(
            "/predict_api",
            &patient_parts(&image, "scan.png"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "The uploaded image does not appear to be a valid MRI scan. Please upload a proper MRI image."
    );

    // Staged file cleaned up on rejection
    let uploads = dir.path().join("uploads");
    let leftover = std::fs::read_dir(&uploads)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn predict_api_returns_shaped_result_and_records_history() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/predict_api",
            &patient_parts(&image, "scan.png"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["tumor_type"], "Glioma");
    assert_eq!(body["confidence"], 87.34);
    assert_eq!(
        body["disease_info"]["description"],
        "A type of brain tumor that starts in the glial cells."
    );

    // Exactly one history record, newest first
    let request = Request::builder()
        .method("GET")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let history = extract_json(response.into_body()).await;
    let records = history.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["patient_name"], "Jane Doe");
    assert_eq!(records[0]["contact_number"], "555-0100");
    assert_eq!(records[0]["tumor_type"], "Glioma");
    assert_eq!(records[0]["confidence"], 87.34);
}

#[tokio::test]
async fn history_delete_round_trip() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/predict_api",
            &patient_parts(&image, "scan.png"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let history = extract_json(response.into_body()).await;
    let id = history[0]["id"].as_i64().unwrap();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/history/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let history = extract_json(response.into_body()).await;
    assert_eq!(history, serde_json::json!([]));
}

#[tokio::test]
async fn no_detection_surfaces_as_no_tumor() {
    let (_dir, app) = setup_app(Classification::NoDetection).await;

    let image = scan_like_png();
    let response = app
        .oneshot(multipart_request(
            "/predict_api",
            &patient_parts(&image, "scan.png"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["tumor_type"], "No Tumor");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["disease_info"]["description"], "No abnormal tumor detected.");
}

#[tokio::test]
async fn display_path_renders_html_result() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let parts = [Part {
        name: "image",
        filename: Some("scan.png"),
        data: &image,
    }];
    let response = app
        .oneshot(multipart_request("/predict", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Glioma"));
    assert!(html.contains("87.34%"));
}

#[tokio::test]
async fn display_path_renders_error_for_invalid_file_type() {
    let (_dir, app) = setup_app(glioma()).await;

    let image = scan_like_png();
    let parts = [Part {
        name: "image",
        filename: Some("scan.txt"),
        data: &image,
    }];
    let response = app
        .oneshot(multipart_request("/predict", &parts))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Invalid file type"));
}
