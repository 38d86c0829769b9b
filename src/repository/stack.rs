//! The repository stack.
//!
//! An ordered collection of repositories sharing one staging directory.
//! Storing a file offers it to every repository that supports its media
//! type, in configuration order; a file can legitimately land in several
//! repositories (one primary plus copies). The stack is built once from
//! configuration at startup and is read-only afterwards, except for
//! explicit administrative additions through [`push`](RepositoryStack::push).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{StackError, StoreError};

use super::repo::{AssetRepository, RepositoryConfig, StandardRepository, StorageResult};
use super::UploadedFile;

// =============================================================================
// Configuration
// =============================================================================

/// The stack configuration file.
///
/// ```yaml
/// workdir: /var/depot/work
/// repositories:
///   - name: Image Store
///     media_types: [image/jpeg, image/tiff]
///     storage_directory: /var/depot/images
///     nesting_levels: 2
///     service_url: { scheme: http, host: example.com, prefix: iiif }
///     iiif_image_api: true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    /// Directory for transient staging copies.
    pub workdir: PathBuf,

    /// Repository configurations, in storage order.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

// =============================================================================
// RepositoryStack
// =============================================================================

/// The ordered set of configured repositories.
pub struct RepositoryStack {
    workdir: PathBuf,
    repositories: Vec<Arc<dyn AssetRepository>>,
}

impl RepositoryStack {
    /// Build a stack from parsed configuration.
    pub fn from_config(config: StackConfig) -> Result<Self, StackError> {
        let mut stack = Self {
            workdir: config.workdir.clone(),
            repositories: Vec::with_capacity(config.repositories.len()),
        };
        for repo_config in config.repositories {
            let repository = StandardRepository::from_config(repo_config, &config.workdir);
            stack.push(Arc::new(repository))?;
        }
        Ok(stack)
    }

    /// Load and build a stack from a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, StackError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StackError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: StackConfig =
            serde_yaml::from_str(&raw).map_err(|source| StackError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_config(config)
    }

    /// Add a repository to the end of the stack.
    ///
    /// Names are case-sensitive and must be unique.
    pub fn push(&mut self, repository: Arc<dyn AssetRepository>) -> Result<(), StackError> {
        if self.find(repository.name()).is_some() {
            return Err(StackError::DuplicateName {
                name: repository.name().to_string(),
            });
        }
        self.repositories.push(repository);
        Ok(())
    }

    /// The staging directory shared by all repositories.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The repositories, in storage order.
    pub fn repositories(&self) -> &[Arc<dyn AssetRepository>] {
        &self.repositories
    }

    /// Look up a repository by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn AssetRepository>> {
        self.repositories
            .iter()
            .find(|repository| repository.name() == name)
    }

    /// Every media type supported by any repository, in configuration order
    /// without duplicates.
    pub fn supported_media_types(&self) -> Vec<String> {
        let mut supported = Vec::new();
        for repository in &self.repositories {
            for media_type in repository.media_types() {
                if !supported.contains(media_type) {
                    supported.push(media_type.clone());
                }
            }
        }
        supported
    }

    /// Store `upload` in every repository that supports its media type.
    ///
    /// Results are keyed by repository name in iteration order; the first
    /// entry is the primary storage location, the rest are copies. When no
    /// repository supports the type, fails with the unsupported-media-type
    /// condition listing everything the stack supports.
    ///
    /// A repository failure aborts the remaining fan-out; results already
    /// produced are dropped and stored copies are not rolled back.
    pub async fn store(
        &self,
        upload: &UploadedFile,
    ) -> Result<Vec<(String, StorageResult)>, StoreError> {
        let mut results = Vec::new();
        for repository in &self.repositories {
            if !repository.supports(&upload.media_type) {
                continue;
            }
            let result =
                repository
                    .store(upload)
                    .await
                    .map_err(|source| StoreError::Repository {
                        name: repository.name().to_string(),
                        source,
                    })?;
            results.push((repository.name().to_string(), result));
        }
        if results.is_empty() {
            return Err(StoreError::UnsupportedMediaType {
                media_type: upload.media_type.clone(),
                supported: self.supported_media_types(),
            });
        }
        Ok(results)
    }
}

// =============================================================================
// Tests
// =============================================================================
