//! Test utilities for integration tests.
//!
//! Builds a depot application over temporary directories and constructs
//! signed multipart upload requests the way a well-behaved client would.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::Router;
use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use md5::Md5;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use asset_depot::{
    AppState, HashFunction, HostAllowlist, MemoryAssetStore, ReplayWindow, RepositoryStack,
    RouterConfig, StackConfig, UploadAuth, create_router,
};

/// API key the test application accepts.
pub const API_KEY: &str = "testkey";

/// Shared secret the test application verifies signatures with.
pub const SECRET: &str = "testsecret";

/// Multipart boundary used by request builders.
pub const BOUNDARY: &str = "depot-test-boundary";

/// Replay window of the test application, in seconds.
pub const WINDOW_SECS: u64 = 30;

// =============================================================================
// Test Application
// =============================================================================

/// A depot application over temporary storage, plus the directories backing
/// it (dropped with the struct).
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub workdir: TempDir,
    pub image_storage: TempDir,
    pub document_storage: TempDir,
}

impl TestApp {
    /// Build an app with an image repository (jpeg/tiff, image API) and a
    /// document repository (pdf).
    pub fn new() -> Self {
        Self::with_allowlist(HostAllowlist::any())
    }

    /// Same as [`new`](Self::new) with an upload host allowlist.
    pub fn with_allowlist(allowlist: HostAllowlist) -> Self {
        let workdir = TempDir::new().unwrap();
        let image_storage = TempDir::new().unwrap();
        let document_storage = TempDir::new().unwrap();

        let yaml = format!(
            "\
workdir: {workdir}
repositories:
  - name: Image Store
    media_types: [image/jpeg, image/tiff]
    storage_directory: {images}
    nesting_levels: 2
    service_url: {{ scheme: http, host: example.com, prefix: iiif }}
    iiif_image_api: true
    default_output_format: jpg
  - name: Document Store
    media_types: [application/pdf]
    storage_directory: {documents}
",
            workdir = workdir.path().display(),
            images = image_storage.path().display(),
            documents = document_storage.path().display(),
        );
        let config: StackConfig = serde_yaml::from_str(&yaml).unwrap();
        let stack = RepositoryStack::from_config(config).unwrap();

        let state = AppState::new(
            Arc::new(stack),
            Arc::new(MemoryAssetStore::new()),
            UploadAuth::new(API_KEY, SECRET, "|", ":", HashFunction::Sha256),
            ReplayWindow::new(WINDOW_SECS),
        );
        let router = create_router(
            state.clone(),
            RouterConfig::new()
                .with_allowed_hosts(allowlist)
                .with_tracing(false),
        );

        Self {
            router,
            state,
            workdir,
            image_storage,
            document_storage,
        }
    }
}

// =============================================================================
// Signing
// =============================================================================

/// Current timestamp in the wire format.
pub fn timestamp_now() -> String {
    timestamp_offset(0)
}

/// Timestamp `offset_secs` seconds from now (negative for the past).
pub fn timestamp_offset(offset_secs: i64) -> String {
    (Utc::now() + TimeDelta::seconds(offset_secs))
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Signature over (filename, username, timestamp, file) as a client
/// computes it.
pub fn sign(filename: &str, username: &str, timestamp: &str, file: &[u8]) -> String {
    let message = [filename, username, timestamp, &md5_hex(file)].join("|");
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The authorization header for a signed request.
pub fn auth_header(signature: &str) -> String {
    format!("{API_KEY}:{signature}")
}

// =============================================================================
// Multipart Builders
// =============================================================================

/// A multipart/form-data body from text fields and an optional file part.
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A fully signed upload request for `file_bytes` declared as `media_type`.
pub fn signed_upload_request(
    filename: &str,
    media_type: &str,
    file_bytes: &[u8],
) -> Request<Body> {
    let timestamp = timestamp_now();
    let signature = sign(filename, "uploader", &timestamp, file_bytes);
    upload_request_with(
        &[
            ("filename", filename),
            ("username", "uploader"),
            ("timestamp", &timestamp),
        ],
        Some((filename, media_type, file_bytes)),
        Some(&auth_header(&signature)),
    )
}

/// An upload request with explicit fields, file, and authorization header.
pub fn upload_request_with(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
    authorization: Option<&str>,
) -> Request<Body> {
    let body = multipart_body(fields, file);
    let mut builder = Request::builder()
        .method("POST")
        .uri("/asset/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    builder.body(Body::from(body)).unwrap()
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Collect a response body into JSON.
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a stored file back from a storage directory.
pub fn read_stored(storage: &Path, relative: &str) -> Vec<u8> {
    std::fs::read(storage.join(relative)).unwrap()
}
