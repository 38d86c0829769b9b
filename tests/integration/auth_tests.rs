//! Authentication integration tests.
//!
//! Tests verify the gate's state machine over the wire:
//! - Missing header rejects 403 before any other authentication work
//! - Malformed headers and unknown keys reject 401
//! - Tampered fields or file bytes reject 401 (bad signature)
//! - Replay-window failures reject 111 before signature verification
//! - Missing required fields reject 111 naming nothing to the client

use axum::http::StatusCode;
use tower::ServiceExt;

use super::test_utils::{
    auth_header, json_body, sign, signed_upload_request, timestamp_now, timestamp_offset,
    upload_request_with, TestApp,
};

const FILE: &[u8] = b"jpeg bytes";

// =============================================================================
// Header Failures
// =============================================================================

#[tokio::test]
async fn test_missing_header_is_forbidden() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        None,
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["message"], "Forbidden!");
}

#[tokio::test]
async fn test_malformed_header_is_unauthorized() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some("no separator in sight"),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Unauthorized.");
}

#[tokio::test]
async fn test_extra_header_parts_are_unauthorized() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&format!("{}:extra", auth_header(&signature))),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_key_is_unauthorized() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&format!("intruder:{signature}")),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Unauthorized.");
}

// =============================================================================
// Signature Failures
// =============================================================================

#[tokio::test]
async fn test_tampered_field_is_a_bad_signature() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    // Signed for one user, submitted as another.
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "NotAUser"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_file_is_a_bad_signature() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", b"different bytes")),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Missing Fields
// =============================================================================

#[tokio::test]
async fn test_missing_filename_is_ignored() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[("username", "uploader"), ("timestamp", &timestamp)],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
    assert_eq!(json_body(response).await["message"], "Bad request. Ignored.");
}

#[tokio::test]
async fn test_missing_username_is_ignored() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[("filename", "photo.jpg"), ("timestamp", &timestamp)],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

#[tokio::test]
async fn test_missing_file_is_ignored() {
    let app = TestApp::new();
    let timestamp = timestamp_now();
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        None,
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

// =============================================================================
// Replay Window
// =============================================================================

#[tokio::test]
async fn test_missing_timestamp_is_ignored() {
    let app = TestApp::new();
    let signature = sign("photo.jpg", "uploader", "", FILE);
    let request = upload_request_with(
        &[("filename", "photo.jpg"), ("username", "uploader")],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
    assert_eq!(json_body(response).await["message"], "Bad request. Ignored.");
}

#[tokio::test]
async fn test_expired_timestamp_is_ignored() {
    let app = TestApp::new();
    let timestamp = timestamp_offset(-7200);
    // The signature itself is valid for the stale timestamp; the window
    // must reject it before signature verification even matters.
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

#[tokio::test]
async fn test_future_timestamp_is_ignored() {
    let app = TestApp::new();
    let timestamp = timestamp_offset(7200);
    let signature = sign("photo.jpg", "uploader", &timestamp, FILE);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        Some(&auth_header(&signature)),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

#[tokio::test]
async fn test_replay_window_rejects_before_auth() {
    // An expired timestamp with a missing header still reports the window
    // failure, not the authentication failure.
    let app = TestApp::new();
    let timestamp = timestamp_offset(-7200);
    let request = upload_request_with(
        &[
            ("filename", "photo.jpg"),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some(("photo.jpg", "image/jpeg", FILE)),
        None,
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 111);
}

// =============================================================================
// Acceptance
// =============================================================================

#[tokio::test]
async fn test_valid_request_is_accepted() {
    let app = TestApp::new();
    let request = signed_upload_request("photo.jpg", "image/jpeg", FILE);

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
