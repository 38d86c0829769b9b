//! Router configuration for the asset depot.
//!
//! # Route Structure
//!
//! ```text
//! /                                                       - Health check
//! /asset/upload                                    POST   - Upload (host guarded)
//! /asset/{id}/fullsize                             GET    - Full-size redirect
//! /asset/{id}/thumbnail                            GET    - Thumbnail redirect
//! /asset/{id}/{region}/{size}/{rotation}/{q}.{f}   GET    - Image-API redirect
//! /asset/{id}/delete                               DELETE - Remove record
//! ```

use std::time::Duration;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{host_guard, HostAllowlist};
use super::handlers::{
    delete_handler, fullsize_handler, health_handler, iiif_handler, thumbnail_handler,
    upload_handler, AppState,
};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Remote addresses allowed to upload.
    pub allowed_hosts: HostAllowlist,

    /// Whether to enable request tracing.
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration that admits uploads from any host and
    /// enables tracing.
    pub fn new() -> Self {
        Self {
            allowed_hosts: HostAllowlist::any(),
            enable_tracing: true,
        }
    }

    /// Restrict uploads to the given remote addresses.
    pub fn with_allowed_hosts(mut self, allowed_hosts: HostAllowlist) -> Self {
        self.allowed_hosts = allowed_hosts;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// The upload route carries the host allowlist guard; replay-window and
/// authentication checks run inside the upload handler, where the multipart
/// body is available.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let upload_routes = Router::new()
        .route("/asset/upload", post(upload_handler))
        .layer(middleware::from_fn_with_state(
            config.allowed_hosts.clone(),
            host_guard,
        ));

    let asset_routes = Router::new()
        .route("/asset/{id}/fullsize", get(fullsize_handler))
        .route("/asset/{id}/thumbnail", get(thumbnail_handler))
        .route("/asset/{id}/delete", delete(delete_handler))
        .route(
            "/asset/{id}/{region}/{size}/{rotation}/{resource}",
            get(iiif_handler),
        );

    let router = Router::new()
        .route("/", get(health_handler))
        .merge(upload_routes)
        .merge(asset_routes)
        .with_state(state)
        .layer(build_cors_layer());

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(Any)
        .max_age(Duration::from_secs(86400))
}

// =============================================================================
// Tests
// =============================================================================
