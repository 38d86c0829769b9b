//! File storage repositories.
//!
//! A [`RepositoryStack`] distributes an uploaded file across an ordered set
//! of destinations. Each [`StandardRepository`] filters by media type, runs
//! a processing [`Pipeline`] over a staged working copy, partitions the
//! resulting metadata into the three disclosure classes, moves the file into
//! its storage directory through a [`Placement`] policy, and reports the
//! stored path with a content checksum.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       RepositoryStack                        │
//! │   store(upload): fan out to every repository that supports   │
//! │   the media type, in configuration order                     │
//! │        │                                                     │
//! │        ▼ per repository                                      │
//! │   stage → pipeline → metadata partition → place → checksum   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod metadata;
pub mod pipeline;
pub mod placement;
pub mod repo;
pub mod stack;

use bytes::Bytes;

pub use metadata::{MetadataSet, SetName, TagValue, FILESTAT_TAGS};
pub use pipeline::{
    OperationConfig, OperationDelta, Pipeline, PipelineOperation, StagedFile,
};
pub use placement::Placement;
pub use repo::{
    AssetRepository, RepositoryConfig, RepositoryDescriptor, StandardRepository, StorageResult,
};
pub use stack::{RepositoryStack, StackConfig};

/// An uploaded file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as submitted.
    pub filename: String,

    /// Declared media (MIME) type.
    pub media_type: String,

    /// The file contents.
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file.
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// The filename's extension, if any.
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}
