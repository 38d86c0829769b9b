//! HTTP server layer for the asset depot.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          HTTP Layer                            │
//! │   POST /asset/upload          GET /asset/{id}/...              │
//! │                                                                │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌──────────────────┐   │
//! │  │  handlers   │  │       auth       │  │      routes      │   │
//! │  │ (requests)  │  │ (gate + window)  │  │ (router config)  │   │
//! │  └─────────────┘  └──────────────────┘  └──────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Upload requests pass the host allowlist, the replay window, and the
//! authentication gate, in that order, before any file handling happens.
//! Retrieval requests resolve an asset record and answer with a 302
//! redirect to the owning repository's image service.

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{HostAllowlist, ReplayWindow, UploadAuth};
pub use handlers::{
    delete_handler, fullsize_handler, health_handler, iiif_handler, thumbnail_handler,
    upload_handler, ApiError, AppState, HealthResponse, UploadRequest,
};
pub use routes::{create_router, RouterConfig};
