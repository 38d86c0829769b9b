//! Asset records and the record-store boundary.
//!
//! The repository stack returns per-repository storage results; this module
//! assembles them into an [`AssetRecord`] (the description a persistence
//! layer consumes) and defines the [`AssetStore`] boundary with an
//! in-memory implementation used by the server and tests. The first entry
//! of the result map is the primary storage location; the rest become
//! [`SecondaryCopy`] entries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::repository::{MetadataSet, SetName, StorageResult, TagValue};

/// Maximum length of the capture-device description.
const CAPTURE_DEVICE_MAX_LEN: usize = 128;

// =============================================================================
// Records
// =============================================================================

/// A copy of an asset stored in a repository other than its primary one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryCopy {
    /// Name of the repository holding the copy.
    pub repository: String,

    /// Path the copy is stored under.
    pub uri: String,
}

/// A stored asset, as handed to the record store.
#[derive(Debug, Clone, Serialize)]
pub struct AssetRecord {
    /// Record ID: the randomized stored filename without its extension.
    pub asset_id: String,

    /// Stored path in the primary repository; doubles as the image-API
    /// identifier.
    pub identifier: String,

    /// Whether the asset may be retrieved without authentication.
    pub public: bool,

    /// Original filename at upload time.
    pub filename: String,

    /// Media type of the file as stored in the primary repository.
    pub media_type: String,

    /// Checksum of the file as stored in the primary repository.
    pub checksum: String,

    /// Name of the primary repository.
    pub repository: String,

    /// The stored, dropped, and withheld metadata sets.
    pub metadata_sets: Vec<MetadataSet>,

    /// Copies in secondary repositories.
    pub copies: Vec<SecondaryCopy>,
}

impl AssetRecord {
    /// Assemble a record from the stack's result map.
    ///
    /// The first entry is the primary storage location; all later entries
    /// become copies. Returns `None` on an empty result map.
    pub fn from_storage(
        filename: impl Into<String>,
        public: bool,
        results: Vec<(String, StorageResult)>,
    ) -> Option<Self> {
        let mut iter = results.into_iter();
        let (primary_name, primary) = iter.next()?;
        let copies = iter
            .map(|(repository, result)| SecondaryCopy {
                repository,
                uri: result.path,
            })
            .collect();

        let media_type = primary
            .stored_metadata()
            .and_then(|stored| stored.get("MIMEType"))
            .and_then(TagValue::as_text)
            .map(str::to_string)
            .unwrap_or_else(|| media_type_for_path(&primary.path));

        Some(Self {
            asset_id: asset_id_for_path(&primary.path),
            identifier: primary.path,
            public,
            filename: filename.into(),
            media_type,
            checksum: primary.checksum,
            repository: primary_name,
            metadata_sets: primary.metadata,
            copies,
        })
    }

    /// Search the metadata sets for the first of `tags` that has a value,
    /// skipping withheld metadata.
    pub fn fetch_metadata(&self, tags: &[&str]) -> Option<&TagValue> {
        tags.iter().find_map(|&tag| {
            self.metadata_sets
                .iter()
                .filter(|set| set.setname != SetName::Withheld)
                .find_map(|set| set.get(tag))
        })
    }

    /// Device description concatenated from the Make, Model, and LensModel
    /// tags, truncated to 128 characters.
    pub fn capture_device(&self) -> Option<String> {
        let parts: Vec<&str> = ["Make", "Model", "LensModel"]
            .into_iter()
            .filter_map(|tag| self.fetch_metadata(&[tag]))
            .filter_map(TagValue::as_text)
            .collect();
        if parts.is_empty() {
            return None;
        }
        let mut value = parts.join(", ");
        if value.len() > CAPTURE_DEVICE_MAX_LEN {
            value.truncate(CAPTURE_DEVICE_MAX_LEN);
        }
        Some(value)
    }

    /// The Copyright tag, unless withheld.
    pub fn copyright(&self) -> Option<&str> {
        self.fetch_metadata(&["Copyright"]).and_then(TagValue::as_text)
    }

    /// The file's creation date from CreateDate, falling back to
    /// DateTimeDigitized.
    pub fn create_date(&self) -> Option<&str> {
        self.fetch_metadata(&["CreateDate", "DateTimeDigitized"])
            .and_then(TagValue::as_text)
    }

    /// The capture date from DateTimeOriginal, falling back to CreateDate
    /// and DateTimeDigitized.
    pub fn date_imaged(&self) -> Option<&str> {
        self.fetch_metadata(&["DateTimeOriginal", "CreateDate", "DateTimeDigitized"])
            .and_then(TagValue::as_text)
    }
}

/// The stored basename without its extension, used as the record ID.
fn asset_id_for_path(path: &str) -> String {
    let basename = path.rsplit('/').next().unwrap_or(path);
    basename
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or_else(|| basename.to_string())
}

/// Media type looked up by file extension.
fn media_type_for_path(path: &str) -> String {
    let extension = path.rsplit('.').next().unwrap_or_default();
    let media_type = match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "png" => "image/png",
        "gif" => "image/gif",
        "jp2" => "image/jp2",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    };
    media_type.to_string()
}

// =============================================================================
// Upload Receipt
// =============================================================================

/// Abridged asset description returned in the upload response body.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    /// Record ID of the new asset.
    pub asset_identifier: String,

    /// Stored path in the primary repository.
    pub resource_identifier: String,

    /// Media type as stored.
    pub mime_type: String,

    /// Capture device description, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_device: Option<String>,

    /// File creation date, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_created_date: Option<String>,

    /// Capture date, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_imaged: Option<String>,

    /// Copyright holder, when known and not withheld.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_holder: Option<String>,

    /// Checksum of the stored file.
    pub checksum: String,
}

impl From<&AssetRecord> for UploadReceipt {
    fn from(record: &AssetRecord) -> Self {
        Self {
            asset_identifier: record.asset_id.clone(),
            resource_identifier: record.identifier.clone(),
            mime_type: record.media_type.clone(),
            capture_device: record.capture_device(),
            file_created_date: record.create_date().map(str::to_string),
            date_imaged: record.date_imaged().map(str::to_string),
            copyright_holder: record.copyright().map(str::to_string),
            checksum: record.checksum.clone(),
        }
    }
}

// =============================================================================
// Record Store Boundary
// =============================================================================

/// The persistence boundary for asset records.
///
/// The core never queries beyond these operations; a database-backed
/// implementation can replace [`MemoryAssetStore`] without touching the
/// upload or retrieval paths.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist a record.
    async fn create(&self, record: AssetRecord);

    /// Fetch a record by its asset ID.
    async fn find(&self, asset_id: &str) -> Option<AssetRecord>;

    /// Remove a record. Returns whether one existed.
    async fn delete(&self, asset_id: &str) -> bool;
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryAssetStore {
    records: RwLock<HashMap<String, AssetRecord>>,
}

impl MemoryAssetStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn create(&self, record: AssetRecord) {
        self.records
            .write()
            .await
            .insert(record.asset_id.clone(), record);
    }

    async fn find(&self, asset_id: &str) -> Option<AssetRecord> {
        self.records.read().await.get(asset_id).cloned()
    }

    async fn delete(&self, asset_id: &str) -> bool {
        self.records.write().await.remove(asset_id).is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
