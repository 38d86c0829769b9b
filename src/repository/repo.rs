//! A single storage destination.
//!
//! A repository owns a storage directory, a media-type restriction, a
//! processing pipeline, and the description of the service that will later
//! serve its files. Storing a file stages it under a randomized name, runs
//! the pipeline, partitions the collected metadata, moves the result into
//! storage, and checksums the file as stored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::fs;
use uuid::Uuid;

use crate::auth::signature::file_digest;
use crate::error::RepositoryError;
use crate::iiif::ServiceUrl;

use super::metadata::{MetadataSet, SetName, TagValue};
use super::pipeline::{OperationConfig, Pipeline, StagedFile};
use super::placement::Placement;
use super::UploadedFile;

fn default_output_format() -> String {
    "jpg".to_string()
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration of one repository, as read from the stack file.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Unique name of the repository.
    pub name: String,

    /// Accepted media types. An empty list accepts any type.
    #[serde(default)]
    pub media_types: Vec<String>,

    /// Processing operations in execution order.
    #[serde(default)]
    pub file_processing: Vec<OperationConfig>,

    /// Directory processed files are stored in.
    pub storage_directory: PathBuf,

    /// Shard levels for nested placement; absent means flat placement.
    #[serde(default)]
    pub nesting_levels: Option<usize>,

    /// Base URL of the service that serves this repository's files.
    #[serde(default)]
    pub service_url: Option<ServiceUrl>,

    /// Whether that service implements the image API.
    #[serde(default)]
    pub iiif_image_api: bool,

    /// Output format of files as stored, used as the default format of
    /// image request URIs.
    #[serde(default = "default_output_format")]
    pub default_output_format: String,
}

// =============================================================================
// Results and Descriptors
// =============================================================================

/// What one repository produced for one stored file.
#[derive(Debug, Clone)]
pub struct StorageResult {
    /// Path of the stored file, relative to the storage directory.
    pub path: String,

    /// The stored, dropped, and withheld metadata sets, in that order.
    pub metadata: Vec<MetadataSet>,

    /// Hex MD5 checksum of the file as stored.
    pub checksum: String,
}

impl StorageResult {
    /// The `stored` metadata set.
    pub fn stored_metadata(&self) -> Option<&MetadataSet> {
        self.metadata
            .iter()
            .find(|set| set.setname == SetName::Stored)
    }
}

/// The serving-related attributes of a repository, needed to build redirect
/// URIs for its assets.
#[derive(Debug, Clone)]
pub struct RepositoryDescriptor {
    /// Repository name.
    pub name: String,

    /// Base URL of the serving service.
    pub service_url: Option<ServiceUrl>,

    /// Image API capability flag.
    pub iiif_image_api: bool,

    /// Default output format for image request URIs.
    pub default_output_format: String,
}

// =============================================================================
// Repository Trait
// =============================================================================

/// A storage destination for uploaded files.
///
/// The stack talks to repositories through this trait; custom destinations
/// implement it and are added with `RepositoryStack::push`.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Unique name of the repository.
    fn name(&self) -> &str;

    /// Accepted media types. Empty means unrestricted.
    fn media_types(&self) -> &[String];

    /// Serving attributes for redirect construction.
    fn descriptor(&self) -> RepositoryDescriptor;

    /// Whether this repository accepts `media_type`.
    fn supports(&self, media_type: &str) -> bool {
        self.media_types().is_empty()
            || self.media_types().iter().any(|known| known == media_type)
    }

    /// Process and store `upload`, returning the stored path, the metadata
    /// sets, and the checksum of the stored bytes.
    ///
    /// Media-type support is not verified here; callers route through
    /// [`supports`](Self::supports) first. An unsupported type fed directly
    /// to `store` may fail inside the pipeline instead of being cleanly
    /// rejected.
    async fn store(&self, upload: &UploadedFile) -> Result<StorageResult, RepositoryError>;
}

// =============================================================================
// Standard Repository
// =============================================================================

/// The built-in repository implementation: local staging, pipeline
/// processing, and placement into a local storage directory.
pub struct StandardRepository {
    name: String,
    media_types: Vec<String>,
    pipeline: Pipeline,
    placement: Placement,
    workdir: PathBuf,
    storage_directory: PathBuf,
    service_url: Option<ServiceUrl>,
    iiif_image_api: bool,
    default_output_format: String,
}

impl StandardRepository {
    /// Build a repository from configuration. `workdir` is the stack-wide
    /// staging directory.
    pub fn from_config(config: RepositoryConfig, workdir: &Path) -> Self {
        let placement = match config.nesting_levels {
            Some(levels) if levels > 0 => Placement::Nested { levels },
            _ => Placement::Flat,
        };
        Self {
            name: config.name,
            media_types: config.media_types,
            pipeline: Pipeline::from_config(&config.file_processing),
            placement,
            workdir: workdir.to_path_buf(),
            storage_directory: config.storage_directory,
            service_url: config.service_url,
            iiif_image_api: config.iiif_image_api,
            default_output_format: config.default_output_format,
        }
    }

    /// The storage directory files are placed into.
    pub fn storage_directory(&self) -> &Path {
        &self.storage_directory
    }

    /// Write the upload into the working directory under a randomized,
    /// collision-resistant name that keeps the original extension, and seed
    /// the staged tag state.
    async fn stage(&self, upload: &UploadedFile) -> Result<StagedFile, RepositoryError> {
        let mut basename = Uuid::new_v4().to_string();
        if let Some(extension) = upload.extension() {
            basename.push('.');
            basename.push_str(extension);
        }
        let path = self.workdir.join(&basename);
        fs::create_dir_all(&self.workdir).await?;
        fs::write(&path, &upload.bytes).await?;

        let mut staged = StagedFile::new(path);
        staged.set_tag("SourceFile", upload.filename.as_str());
        staged.set_tag("FileName", basename.as_str());
        staged.set_tag(
            "Directory",
            self.workdir.to_string_lossy().to_string(),
        );
        staged.set_tag(
            "FileModifyDate",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        staged.set_tag(
            "FileSize",
            TagValue::Integer(upload.bytes.len() as i64),
        );
        staged.set_tag("MIMEType", upload.media_type.as_str());
        Ok(staged)
    }
}

#[async_trait]
impl AssetRepository for StandardRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn media_types(&self) -> &[String] {
        &self.media_types
    }

    fn descriptor(&self) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: self.name.clone(),
            service_url: self.service_url.clone(),
            iiif_image_api: self.iiif_image_api,
            default_output_format: self.default_output_format.clone(),
        }
    }

    async fn store(&self, upload: &UploadedFile) -> Result<StorageResult, RepositoryError> {
        let mut staged = self.stage(upload).await?;

        let outcome = self.pipeline.run(&mut staged)?;

        let stored = MetadataSet::stored(staged.tags.clone());
        let dropped = MetadataSet::collected(SetName::Dropped, outcome.dropped);
        let withheld = MetadataSet::collected(SetName::Withheld, outcome.withheld);

        let path = self
            .placement
            .place(&staged.path, &self.storage_directory)
            .await?;

        // Checksum the bytes as stored, after processing and the move.
        let stored_bytes = fs::read(self.storage_directory.join(&path)).await?;
        let checksum = file_digest(&stored_bytes);

        Ok(StorageResult {
            path,
            metadata: vec![stored, dropped, withheld],
            checksum,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
