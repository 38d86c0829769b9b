//! Upload and fan-out integration tests.
//!
//! Tests verify:
//! - The upload receipt and the stored-file round trip
//! - Routing by media type across the repository stack
//! - The unsupported-media-type contract (333, all formats listed)
//! - Metadata partitioning visible through the record store
//! - Record deletion and the host allowlist

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use asset_depot::HostAllowlist;

use super::test_utils::{
    json_body, md5_hex, read_stored, signed_upload_request, timestamp_now, upload_request_with,
    TestApp,
};

const FILE: &[u8] = b"jpeg bytes";

// =============================================================================
// Successful Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_returns_receipt() {
    let app = TestApp::new();
    let request = signed_upload_request("photo.jpg", "image/jpeg", FILE);

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let receipt = json_body(response).await;
    assert_eq!(receipt["mime_type"], "image/jpeg");
    assert_eq!(receipt["checksum"], md5_hex(FILE));
    assert!(receipt["asset_identifier"].is_string());
    assert!(receipt["resource_identifier"].is_string());
}

#[tokio::test]
async fn test_uploaded_file_round_trips() {
    let app = TestApp::new();
    let request = signed_upload_request("photo.jpg", "image/jpeg", FILE);

    let response = app.router.oneshot(request).await.unwrap();
    let receipt = json_body(response).await;

    // The stored path exists under the image repository and its bytes
    // match the returned checksum.
    let relative = receipt["resource_identifier"].as_str().unwrap();
    let stored = read_stored(app.image_storage.path(), relative);
    assert_eq!(md5_hex(&stored), receipt["checksum"].as_str().unwrap());
}

#[tokio::test]
async fn test_upload_uses_nested_placement() {
    let app = TestApp::new();
    let request = signed_upload_request("photo.jpg", "image/jpeg", FILE);

    let response = app.router.oneshot(request).await.unwrap();
    let receipt = json_body(response).await;

    // Two shard levels configured for the image repository.
    let relative = receipt["resource_identifier"].as_str().unwrap();
    assert_eq!(relative.matches('/').count(), 2);
}

#[tokio::test]
async fn test_upload_randomizes_stored_names() {
    let app = TestApp::new();

    let first = json_body(
        app.router
            .clone()
            .oneshot(signed_upload_request("photo.jpg", "image/jpeg", FILE))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.router
            .oneshot(signed_upload_request("photo.jpg", "image/jpeg", FILE))
            .await
            .unwrap(),
    )
    .await;

    assert_ne!(first["resource_identifier"], second["resource_identifier"]);
    assert!(!first["resource_identifier"]
        .as_str()
        .unwrap()
        .contains("photo"));
}

#[tokio::test]
async fn test_upload_routes_documents_to_document_store() {
    let app = TestApp::new();
    let request = signed_upload_request("paper.pdf", "application/pdf", b"pdf bytes");

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = json_body(response).await;

    let relative = receipt["resource_identifier"].as_str().unwrap();
    let stored = read_stored(app.document_storage.path(), relative);
    assert_eq!(stored, b"pdf bytes");
}

#[tokio::test]
async fn test_upload_creates_a_findable_record() {
    let app = TestApp::new();
    let response = app
        .router
        .oneshot(signed_upload_request("photo.jpg", "image/jpeg", FILE))
        .await
        .unwrap();
    let receipt = json_body(response).await;
    let asset_id = receipt["asset_identifier"].as_str().unwrap();

    let record = app.state.assets.find(asset_id).await.unwrap();
    assert_eq!(record.repository, "Image Store");
    assert_eq!(record.filename, "photo.jpg");
    assert_eq!(record.checksum, md5_hex(FILE));
    assert!(record.public);

    // Exactly one set per disclosure class, and the filesystem tags stay
    // out of the stored set.
    assert_eq!(record.metadata_sets.len(), 3);
    let stored = &record.metadata_sets[0];
    assert!(stored.get("FileName").is_none());
    assert!(stored.get("MIMEType").is_some());
}

// =============================================================================
// Unsupported Media Types
// =============================================================================

#[tokio::test]
async fn test_unsupported_media_type_is_333() {
    let app = TestApp::new();
    let request = signed_upload_request("scan.jp2", "image/jp2", b"jp2 bytes");

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 333);
    assert_eq!(
        json_body(response).await["message"],
        "Image format image/jp2 is not supported. Supported formats are: \
         [\"image/jpeg\", \"image/tiff\", \"application/pdf\"]."
    );
}

#[tokio::test]
async fn test_unsupported_media_type_stores_nothing() {
    let app = TestApp::new();
    let request = signed_upload_request("scan.jp2", "image/jp2", b"jp2 bytes");

    app.router.oneshot(request).await.unwrap();

    let stored: Vec<_> = std::fs::read_dir(app.image_storage.path())
        .unwrap()
        .collect();
    assert!(stored.is_empty());
}

// =============================================================================
// Host Allowlist
// =============================================================================

#[tokio::test]
async fn test_disallowed_host_is_forbidden() {
    let app = TestApp::with_allowlist(HostAllowlist::only(vec!["10.0.0.9".parse().unwrap()]));
    let request = signed_upload_request("photo.jpg", "image/jpeg", FILE);

    // No connection info at all: with an allowlist configured that is a
    // rejection, before the timestamp or the gate run.
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["message"], "Forbidden!");
}

#[tokio::test]
async fn test_allowed_host_may_upload() {
    let app = TestApp::with_allowlist(HostAllowlist::only(vec!["10.0.0.9".parse().unwrap()]));
    let mut request = signed_upload_request("photo.jpg", "image/jpeg", FILE);
    request.extensions_mut().insert(axum::extract::ConnectInfo(
        "10.0.0.9:41234".parse::<std::net::SocketAddr>().unwrap(),
    ));

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_removes_the_record() {
    let app = TestApp::new();
    let receipt = json_body(
        app.router
            .clone()
            .oneshot(signed_upload_request("photo.jpg", "image/jpeg", FILE))
            .await
            .unwrap(),
    )
    .await;
    let asset_id = receipt["asset_identifier"].as_str().unwrap();

    let timestamp = timestamp_now();
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/asset/{asset_id}/delete"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "timestamp={}",
            urlencode(&timestamp)
        )))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.assets.find(asset_id).await.is_none());
}

#[tokio::test]
async fn test_delete_without_timestamp_is_ignored() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("DELETE")
        .uri("/asset/abc123/delete")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

#[tokio::test]
async fn test_delete_unknown_asset_is_not_found() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let request = Request::builder()
        .method("DELETE")
        .uri("/asset/missing/delete")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("timestamp={}", urlencode(&timestamp))))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

/// Encode a timestamp for a form body (spaces become `+`).
fn urlencode(value: &str) -> String {
    value.replace(' ', "+")
}
