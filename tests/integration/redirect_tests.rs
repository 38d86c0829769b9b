//! Redirect integration tests.
//!
//! Tests verify retrieval of stored assets through 302 redirects:
//! - Fullsize and thumbnail shorthands with their defaulting rules
//! - Fully parameterized image-API requests
//! - Parameter validation (quality, region, rotation)
//! - Unknown assets and repositories without image-API support

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use asset_depot::{AssetRecord, MetadataSet, SetName, StorageResult};

use super::test_utils::TestApp;

/// Seed a record stored in the image repository.
async fn seed_image_asset(app: &TestApp) -> String {
    seed_asset(app, "Image Store", "ab/cd/abc123.jpg").await
}

async fn seed_asset(app: &TestApp, repository: &str, path: &str) -> String {
    let mut stored = MetadataSet::new(SetName::Stored);
    stored.insert("MIMEType", "image/jpeg");
    let result = StorageResult {
        path: path.to_string(),
        metadata: vec![
            stored,
            MetadataSet::new(SetName::Dropped),
            MetadataSet::new(SetName::Withheld),
        ],
        checksum: "digest".to_string(),
    };
    let record = AssetRecord::from_storage(
        "photo.jpg",
        true,
        vec![(repository.to_string(), result)],
    )
    .unwrap();
    let asset_id = record.asset_id.clone();
    app.state.assets.create(record).await;
    asset_id
}

async fn get(app: &TestApp, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

// =============================================================================
// Shorthand Derivatives
// =============================================================================

#[tokio::test]
async fn test_fullsize_redirect() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(&app, &format!("/asset/{asset_id}/fullsize")).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "http://example.com/iiif/ab/cd/abc123.jpg/full/max/0/default.jpg"
    );
}

#[tokio::test]
async fn test_thumbnail_redirect_default_width() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(&app, &format!("/asset/{asset_id}/thumbnail")).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).ends_with("/full/128,/0/default.jpg"));
}

#[tokio::test]
async fn test_thumbnail_redirect_with_scale() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(&app, &format!("/asset/{asset_id}/thumbnail?scale=256")).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).ends_with("/full/256,/0/default.jpg"));
}

// =============================================================================
// Parameterized Requests
// =============================================================================

#[tokio::test]
async fn test_iiif_redirect_passes_parameters_through() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/square/512,/90/gray.png"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        "http://example.com/iiif/ab/cd/abc123.jpg/square/512,/90/gray.png"
    );
}

#[tokio::test]
async fn test_iiif_redirect_with_pixel_region() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/10,20,300,400/max/0/default.jpg"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).contains("/10,20,300,400/max/0/default.jpg"));
}

#[tokio::test]
async fn test_iiif_redirect_with_mirrored_rotation() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/full/max/!90/default.jpg"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).contains("/!90/"));
}

// =============================================================================
// Parameter Validation
// =============================================================================

#[tokio::test]
async fn test_invalid_quality_is_rejected() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/full/max/0/awesome.jpg"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_region_is_rejected() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/sideways/max/0/default.jpg"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_rotation_is_rejected() {
    let app = TestApp::new();
    let asset_id = seed_image_asset(&app).await;

    let response = get(
        &app,
        &format!("/asset/{asset_id}/full/max/tilted/default.jpg"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let app = TestApp::new();

    let response = get(&app, "/asset/missing/fullsize").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = super::test_utils::json_body(response).await;
    assert_eq!(body["message"], "Not found.");
}

#[tokio::test]
async fn test_repository_without_image_api_rejects_derivatives() {
    let app = TestApp::new();
    // The document store declares no image API.
    let asset_id = seed_asset(&app, "Document Store", "efg456.pdf").await;

    let response = get(&app, &format!("/asset/{asset_id}/fullsize")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
