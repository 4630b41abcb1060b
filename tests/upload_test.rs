use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use cloud_upload_service::config::UploadConfig;
use cloud_upload_service::models::HostedAsset;
use cloud_upload_service::services::temp_store::TempStore;
use cloud_upload_service::services::upload_service::UploadService;
use cloud_upload_service::services::uploader::{MediaUploader, ProviderError};
use cloud_upload_service::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Provider stand-in: fails uploads whose name contains "fail", or every
/// upload when `down` is set.
struct FakeUploader {
    calls: AtomicUsize,
    down: bool,
}

#[async_trait]
impl MediaUploader for FakeUploader {
    async fn upload(&self, path: &Path) -> Result<HostedAsset, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        if self.down || name.contains("fail") {
            return Err(ProviderError::Rejected {
                status: 500,
                message: "Provider unavailable".to_string(),
            });
        }

        Ok(HostedAsset {
            url: format!("http://res.cloudinary.com/test/{name}"),
            secure_url: format!("https://res.cloudinary.com/test/{name}"),
            public_id: format!("uploads/{name}"),
        })
    }
}

struct TestApp {
    app: Router,
    uploader: Arc<FakeUploader>,
    scratch: TempDir,
}

fn setup(down: bool) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let config = UploadConfig {
        temp_dir: scratch.path().to_path_buf(),
        ..UploadConfig::default()
    };
    let uploader = Arc::new(FakeUploader {
        calls: AtomicUsize::new(0),
        down,
    });

    let state = AppState {
        upload_service: Arc::new(UploadService::new(
            TempStore::new(config.temp_dir.clone()),
            uploader.clone(),
        )),
        config,
    };

    TestApp {
        app: create_app(state),
        uploader,
        scratch,
    }
}

fn multipart_body(field: &str, files: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n\
                Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|_| panic!("non-JSON body: {}", String::from_utf8_lossy(&body)));
    (status, json)
}

fn scratch_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_upload_two_images() {
    let t = setup(false);
    let body = multipart_body(
        "images",
        &[("cat.png", b"cat".to_vec()), ("dog.png", b"dog".to_vec())],
    );

    let (status, json) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let data = &json["data"];
    assert_eq!(data["successful"].as_array().unwrap().len(), 2);
    assert_eq!(data["failed"].as_array().unwrap().len(), 0);
    for entry in data["successful"].as_array().unwrap() {
        assert!(!entry["cloudinaryUrl"].as_str().unwrap().is_empty());
        assert!(!entry["publicId"].as_str().unwrap().is_empty());
        assert!(entry["secureUrl"].as_str().unwrap().starts_with("https://"));
    }
    let mut names: Vec<_> = data["successful"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["originalname"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["cat.png", "dog.png"]);
}

#[tokio::test]
async fn test_no_files_is_client_error() {
    let t = setup(false);
    let (status, json) = send(&t.app, upload_request(multipart_body("images", &[]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "No files uploaded");
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_other_fields_are_ignored() {
    let t = setup(false);
    let body = multipart_body("avatar", &[("me.png", b"me".to_vec())]);
    let (status, json) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_provider_failure_is_isolated() {
    let t = setup(false);
    let body = multipart_body(
        "images",
        &[
            ("a.png", b"a".to_vec()),
            ("fail.png", b"b".to_vec()),
            ("c.png", b"c".to_vec()),
        ],
    );

    let (status, json) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let data = &json["data"];
    assert_eq!(data["totalProcessed"], 3);
    assert_eq!(data["successfulUploads"], 2);
    assert_eq!(data["failedUploads"], 1);
    assert_eq!(data["failed"][0]["originalname"], "fail.png");
    assert!(
        data["failed"][0]["error"]
            .as_str()
            .unwrap()
            .contains("Provider unavailable")
    );
}

#[tokio::test]
async fn test_all_failures_still_report_batch_success() {
    let t = setup(true);
    let body = multipart_body("images", &[("a.png", b"a".to_vec())]);

    let (status, json) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["failedUploads"], 1);
    assert_eq!(json["data"]["successfulUploads"], 0);
}

#[tokio::test]
async fn test_temp_files_removed_after_response() {
    let t = setup(false);
    let body = multipart_body(
        "images",
        &[
            ("ok.png", b"ok".to_vec()),
            ("fail.png", b"nope".to_vec()),
        ],
    );

    let (status, _) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 2);
    assert!(scratch_is_empty(&t.scratch));
}

#[tokio::test]
async fn test_too_many_files_rejected_before_upload() {
    let t = setup(false);
    let files: Vec<(String, Vec<u8>)> = (0..6)
        .map(|i| (format!("file{i}.png"), vec![b'x'; 16]))
        .collect();
    let files: Vec<(&str, Vec<u8>)> = files
        .iter()
        .map(|(n, c)| (n.as_str(), c.clone()))
        .collect();

    let (status, json) = send(&t.app, upload_request(multipart_body("images", &files))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(&t.scratch));
}

#[tokio::test]
async fn test_oversized_file_rejected_before_buffering() {
    let t = setup(false);
    let big = vec![0u8; 5 * 1024 * 1024 + 1];
    let body = multipart_body("images", &[("big.png", big)]);

    let (status, json) = send(&t.app, upload_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(&t.scratch));
}

#[tokio::test]
async fn test_malformed_multipart_is_client_error() {
    let t = setup(false);
    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("Content-Type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, json) = send(&t.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Invalid upload request");
    assert_eq!(t.uploader.calls.load(Ordering::SeqCst), 0);
}
