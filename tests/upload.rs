//! Upload endpoint exercised through the real router: multi-megabyte files
//! must go through (no request body cap applies), and unsafe filenames are
//! rejected per part without failing the batch.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use nas_server::{router, AppState, Storage};

const BOUNDARY: &str = "nas-upload-test-boundary";

async fn setup() -> (tempfile::TempDir, Storage, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().canonicalize().unwrap());
    tokio::fs::create_dir_all(storage.trash_dir()).await.unwrap();
    let app = router(AppState {
        storage: storage.clone(),
        public_base_url: String::new(),
    });
    (dir, storage, app)
}

fn multipart_body(path: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{path}\r\n"
        )
        .as_bytes(),
    );
    for (name, contents) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; \
                 filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
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
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn uploads_larger_than_the_default_body_cap_succeed() {
    let (_dir, storage, app) = setup().await;

    // 3 MiB, comfortably above axum's default 2 MB request cap.
    let payload = vec![0xABu8; 3 * 1024 * 1024];
    let body = multipart_body("docs", &[("big.bin", &payload)]);

    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let written = storage.resolve("docs/big.bin").unwrap();
    let meta = tokio::fs::metadata(&written).await.unwrap();
    assert_eq!(meta.len(), payload.len() as u64);
}

#[tokio::test]
async fn traversal_filenames_are_rejected_without_failing_the_batch() {
    let (dir, storage, app) = setup().await;

    let body = multipart_body(
        "",
        &[
            ("ok.txt", b"fine".as_slice()),
            ("../../escape.txt", b"nope".as_slice()),
        ],
    );
    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["count"], 1);
    assert_eq!(parsed["success"], false);

    assert!(tokio::fs::try_exists(storage.resolve("ok.txt").unwrap())
        .await
        .unwrap());
    // Nothing landed above the storage root.
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
}
