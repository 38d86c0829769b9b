//! # Asset Depot
//!
//! An authenticated upload gateway and IIIF redirect server for digital
//! asset repositories.
//!
//! Files arrive over signed multipart POST requests. Each request passes a
//! replay-window check and an HMAC authentication gate, then fans out to
//! every configured storage repository that accepts the file's media type.
//! A repository processes its copy through a configurable pipeline,
//! partitions the collected metadata into stored/dropped/withheld sets,
//! places the file under a collision-resistant name, and checksums the
//! result. Stored assets are later served via 302 redirects to IIIF image
//! services.
//!
//! ## Architecture
//!
//! - [`auth`] - HMAC signature and authorization header primitives
//! - [`interval`] - replay-window timestamp validation
//! - [`repository`] - repository stack, processing pipeline, placement
//! - [`iiif`] - image-API URI construction and redirects
//! - [`asset`] - asset records and the record-store boundary
//! - [`server`] - Axum HTTP layer: gate, handlers, routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - failure taxonomy shared across the crate

pub mod asset;
pub mod auth;
pub mod config;
pub mod error;
pub mod iiif;
pub mod interval;
pub mod repository;
pub mod server;

// Re-export commonly used types
pub use asset::{AssetRecord, AssetStore, MemoryAssetStore, SecondaryCopy, UploadReceipt};
pub use auth::{AuthorizationHeader, HashFunction, Signature};
pub use config::Config;
pub use error::{IiifError, PipelineError, RepositoryError, StackError, StoreError, UploadError};
pub use iiif::{
    AssetRedirect, Derivative, IiifParams, IiifUri, ImageRegion, ImageSize, Quality, Rotation,
    ServiceUrl,
};
pub use interval::{Duration, TimestampState, ValidatingTimestamp};
pub use repository::{
    AssetRepository, MetadataSet, OperationConfig, Pipeline, PipelineOperation, Placement,
    RepositoryConfig, RepositoryDescriptor, RepositoryStack, SetName, StackConfig,
    StagedFile, StandardRepository, StorageResult, TagValue, UploadedFile,
};
pub use server::{
    create_router, AppState, HostAllowlist, ReplayWindow, RouterConfig, UploadAuth,
};
