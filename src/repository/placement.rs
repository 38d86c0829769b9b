//! Storage placement.
//!
//! A placement policy moves a finalized file from staging into a
//! repository's storage directory and returns the relative path it landed
//! on. Filenames are already randomized at staging time, so two concurrent
//! uploads never contend for the same target; placement refuses to
//! overwrite an existing file rather than racing it. The final move is a
//! rename, which is atomic when staging and storage share a filesystem.
//!
//! Two policies exist: flat placement puts every file directly into the
//! storage directory; nested placement shards files into subdirectories
//! derived from the leading characters of the randomized name, keeping
//! directory fanout bounded for large repositories.

use std::path::Path;

use tokio::fs;

use crate::error::RepositoryError;

/// Characters per shard segment in nested placement.
const SHARD_WIDTH: usize = 2;

/// How stored files are arranged inside the storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// All files directly in the storage directory.
    Flat,

    /// Files sharded into `levels` nested directories named after leading
    /// character pairs of the filename.
    Nested {
        /// Number of shard levels.
        levels: usize,
    },
}

impl Placement {
    /// The relative path `filename` will be stored under.
    pub fn relative_path(&self, filename: &str) -> String {
        match self {
            Self::Flat => filename.to_string(),
            Self::Nested { levels } => {
                let mut segments = Vec::with_capacity(levels + 1);
                let stem = filename.split('.').next().unwrap_or(filename);
                for level in 0..*levels {
                    let start = level * SHARD_WIDTH;
                    let end = (start + SHARD_WIDTH).min(stem.len());
                    if start >= stem.len() {
                        break;
                    }
                    segments.push(&stem[start..end]);
                }
                segments.push(filename);
                segments.join("/")
            }
        }
    }

    /// Move `staged` into `destination`, creating shard directories as
    /// needed, and return the relative path of the stored file.
    ///
    /// Fails with a collision error instead of overwriting an existing
    /// target.
    pub async fn place(
        &self,
        staged: &Path,
        destination: &Path,
    ) -> Result<String, RepositoryError> {
        let filename = staged
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RepositoryError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("staged file has no usable name: {}", staged.display()),
                ))
            })?;

        let relative = self.relative_path(filename);
        let target = destination.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&target).await? {
            return Err(RepositoryError::PlacementCollision { path: relative });
        }
        fs::rename(staged, &target).await?;
        Ok(relative)
    }
}

// =============================================================================
// Tests
// =============================================================================
