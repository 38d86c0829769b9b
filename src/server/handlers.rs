//! HTTP request handlers for the asset depot.
//!
//! # Endpoints
//!
//! - `POST /asset/upload` - authenticated file ingest
//! - `GET /asset/{id}/fullsize` - redirect to the full image
//! - `GET /asset/{id}/thumbnail` - redirect to a thumbnail
//! - `GET /asset/{id}/{region}/{size}/{rotation}/{quality}.{format}` -
//!   redirect to an arbitrary image-API derivative
//! - `DELETE /asset/{id}/delete` - remove an asset record
//! - `GET /` - health check
//!
//! All error conditions are mapped to status and body here, at the
//! boundary; the deliberately non-standard codes (111 for "bad request,
//! ignored", 333 for unsupported media types) appear only in this mapping.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};
use url::form_urlencoded;

use crate::asset::{AssetRecord, AssetStore, UploadReceipt};
use crate::error::{IiifError, StoreError, UploadError};
use crate::iiif::{AssetRedirect, Derivative, IiifParams, ImageRegion, ImageSize, Rotation};
use crate::repository::{RepositoryStack, UploadedFile};

use super::auth::{ReplayWindow, UploadAuth};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to all handlers via Axum's State
/// extractor. Everything in here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// The configured repository stack.
    pub stack: Arc<RepositoryStack>,

    /// The asset record store.
    pub assets: Arc<dyn AssetStore>,

    /// The upload authenticator.
    pub auth: Arc<UploadAuth>,

    /// The replay window for upload timestamps.
    pub replay_window: ReplayWindow,
}

impl AppState {
    /// Create application state.
    pub fn new(
        stack: Arc<RepositoryStack>,
        assets: Arc<dyn AssetStore>,
        auth: UploadAuth,
        replay_window: ReplayWindow,
    ) -> Self {
        Self {
            stack,
            assets,
            auth: Arc::new(auth),
            replay_window,
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// The fields of a multipart upload request, collected before validation.
#[derive(Debug, Default)]
pub struct UploadRequest {
    /// Client-supplied filename field.
    pub filename: Option<String>,

    /// Identifier of the submitting user.
    pub username: Option<String>,

    /// Client-supplied request timestamp.
    pub timestamp: Option<String>,

    /// Whether the asset should be publicly retrievable.
    pub is_public: Option<bool>,

    /// The uploaded file part.
    pub file: Option<UploadedFile>,
}

impl UploadRequest {
    /// Look up a signature field by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "filename" => self.filename.as_deref(),
            "username" => self.username.as_deref(),
            "timestamp" => self.timestamp.as_deref(),
            _ => None,
        }
    }

    /// Collect the known fields from a multipart body. Unknown parts are
    /// ignored.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut request = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::Multipart(err.to_string()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let media_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| ApiError::Multipart(err.to_string()))?;
                    request.file = Some(UploadedFile::new(filename, media_type, bytes));
                }
                "filename" | "username" | "timestamp" | "is_public" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|err| ApiError::Multipart(err.to_string()))?;
                    match name.as_str() {
                        "filename" => request.filename = Some(value),
                        "username" => request.username = Some(value),
                        "timestamp" => request.timestamp = Some(value),
                        _ => request.is_public = Some(matches!(value.as_str(), "true" | "1")),
                    }
                }
                _ => {}
            }
        }
        Ok(request)
    }
}

/// Query parameters for thumbnail redirects.
#[derive(Debug, Deserialize)]
pub struct ThumbnailQueryParams {
    /// Desired thumbnail width in pixels.
    #[serde(default)]
    pub scale: Option<u32>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Service version.
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Umbrella error for all handler failures.
///
/// Conversion into a response is the single place where error kinds become
/// status codes and JSON bodies, and where the per-rejection warning is
/// logged.
#[derive(Debug)]
pub enum ApiError {
    /// Upload vetting failure (host, timestamp, authentication, fields).
    Upload(UploadError),

    /// Repository fan-out failure.
    Store(StoreError),

    /// IIIF parameter validation failure.
    Iiif(IiifError),

    /// A malformed path or query parameter outside the IIIF taxonomy.
    BadParameter(String),

    /// The requested asset does not exist.
    NotFound,

    /// The multipart body could not be read.
    Multipart(String),

    /// Unexpected internal failure.
    Internal(String),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        Self::Upload(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<IiifError> for ApiError {
    fn from(err: IiifError) -> Self {
        Self::Iiif(err)
    }
}

/// Status for "bad request, ignored" responses.
fn bad_request_ignored() -> StatusCode {
    StatusCode::from_u16(111).expect("111 is within the valid status range")
}

/// Status for unsupported media type responses.
fn unsupported_media_type() -> StatusCode {
    StatusCode::from_u16(333).expect("333 is within the valid status range")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Upload(err) => {
                warn!(component = err.component(), "{}", err);
                let status = match err {
                    UploadError::HeaderMissing | UploadError::HostNotAllowed { .. } => {
                        StatusCode::FORBIDDEN
                    }
                    UploadError::HeaderMalformed
                    | UploadError::UnknownKey { .. }
                    | UploadError::BadSignature => StatusCode::UNAUTHORIZED,
                    UploadError::MissingField { .. }
                    | UploadError::TimestampMissing
                    | UploadError::TimestampFuture { .. }
                    | UploadError::TimestampExpired { .. } => bad_request_ignored(),
                };
                let message = match status {
                    StatusCode::FORBIDDEN => "Forbidden!".to_string(),
                    StatusCode::UNAUTHORIZED => "Unauthorized.".to_string(),
                    _ => "Bad request. Ignored.".to_string(),
                };
                (status, message)
            }
            ApiError::Store(err @ StoreError::UnsupportedMediaType { .. }) => {
                warn!(component = "repository-stack", "{}", err);
                (unsupported_media_type(), err.to_string())
            }
            ApiError::Store(err @ StoreError::Repository { .. }) => {
                error!(component = "repository-stack", "{}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
            ApiError::Iiif(err) => {
                warn!(component = "iiif", "{}", err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::BadParameter(message) => {
                warn!(component = "iiif", "{}", message);
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::NotFound => {
                debug!("Asset not found");
                (StatusCode::NOT_FOUND, "Not found.".to_string())
            }
            ApiError::Multipart(detail) => {
                warn!(
                    component = "upload",
                    "Request aborted. Unreadable upload body: {}.", detail
                );
                (bad_request_ignored(), "Bad request. Ignored.".to_string())
            }
            ApiError::Internal(detail) => {
                error!("{}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error.".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Authenticated upload: replay window, then the gate, then repository
/// fan-out. Responds with the abridged asset description.
pub async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let request = UploadRequest::from_multipart(&mut multipart).await?;

    // Freshness resolves fully before any signature work.
    state.replay_window.validate(request.timestamp.as_deref())?;

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.auth.authenticate_upload(auth_header, &request)?;

    let file = request.file.as_ref().ok_or_else(|| {
        // The gate has already required the file; this guards reordering.
        ApiError::Upload(UploadError::MissingField {
            field: "file".to_string(),
        })
    })?;

    let results = state.stack.store(file).await?;
    let filename = request
        .filename
        .clone()
        .unwrap_or_else(|| file.filename.clone());
    let record =
        AssetRecord::from_storage(filename, request.is_public.unwrap_or(true), results)
            .ok_or_else(|| ApiError::Internal("storage produced no results".to_string()))?;
    let receipt = UploadReceipt::from(&record);
    state.assets.create(record).await;
    Ok(Json(receipt))
}

/// Redirect to the full-size rendition of an asset.
pub async fn fullsize_handler(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = find_record(&state, &asset_id).await?;
    let uri = redirect_builder(&state, &record)?.derivative(Derivative::Fullsize)?;
    Ok(found(&uri))
}

/// Redirect to a thumbnail rendition of an asset.
pub async fn thumbnail_handler(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    Query(params): Query<ThumbnailQueryParams>,
) -> Result<Response, ApiError> {
    let record = find_record(&state, &asset_id).await?;
    let uri = redirect_builder(&state, &record)?.derivative(Derivative::Thumbnail {
        width: params.scale,
    })?;
    Ok(found(&uri))
}

/// Redirect to an arbitrary image-API derivative of an asset.
pub async fn iiif_handler(
    State(state): State<AppState>,
    Path((asset_id, region, size, rotation, resource)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<Response, ApiError> {
    let record = find_record(&state, &asset_id).await?;

    let region = ImageRegion::parse(&region)?;
    let size = match size.as_str() {
        "max" => ImageSize::Max,
        other => ImageSize::Literal(other.to_string()),
    };
    let rotation = parse_rotation(&rotation)
        .ok_or_else(|| ApiError::BadParameter(format!("Invalid rotation: {rotation}")))?;
    let (quality, format) = resource
        .rsplit_once('.')
        .ok_or_else(|| ApiError::BadParameter(format!("Invalid resource segment: {resource}")))?;
    let quality = quality.parse()?;

    let params = IiifParams {
        region: Some(region),
        size: Some(size),
        rotation: Some(rotation),
        quality: Some(quality),
        format: Some(format.to_string()),
    };
    let uri = redirect_builder(&state, &record)?.iiif(params)?;
    Ok(found(&uri))
}

/// Remove an asset record. The stored file bytes stay in place.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let timestamp = form_urlencoded::parse(&body)
        .find(|(name, _)| name == "timestamp")
        .map(|(_, value)| value.into_owned());
    state.replay_window.validate(timestamp.as_deref())?;

    if !state.assets.delete(&asset_id).await {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "deleted": asset_id })))
}

// =============================================================================
// Helpers
// =============================================================================

/// A 302 redirect to `uri`.
fn found(uri: &str) -> Response {
    ([(header::LOCATION, uri)], StatusCode::FOUND).into_response()
}

async fn find_record(state: &AppState, asset_id: &str) -> Result<AssetRecord, ApiError> {
    state
        .assets
        .find(asset_id)
        .await
        .ok_or(ApiError::NotFound)
}

/// Build the redirect builder for an asset from its primary repository's
/// serving attributes.
fn redirect_builder(state: &AppState, record: &AssetRecord) -> Result<AssetRedirect, ApiError> {
    let repository = state.stack.find(&record.repository).ok_or_else(|| {
        ApiError::Internal(format!(
            "repository {} is not configured",
            record.repository
        ))
    })?;
    let descriptor = repository.descriptor();
    Ok(AssetRedirect::new(
        descriptor.name,
        record.identifier.clone(),
        descriptor.service_url,
        descriptor.iiif_image_api,
        descriptor.default_output_format,
    ))
}

/// Parse a rotation path segment: degrees with an optional `!` mirror
/// prefix.
fn parse_rotation(value: &str) -> Option<Rotation> {
    let (mirrored, degrees) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let degrees: f32 = degrees.parse().ok()?;
    let rotation = Rotation::new(degrees);
    Some(if mirrored { rotation.mirrored() } else { rotation })
}

// =============================================================================
// Tests
// =============================================================================
