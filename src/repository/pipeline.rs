//! File processing pipelines.
//!
//! A pipeline is an ordered list of named operations applied to a staged
//! working copy of an upload. Operations may rewrite the file's bytes and
//! contribute metadata in three ways: tags they add (part of the file as
//! stored), tags they drop (lost during processing), and tags they redact
//! (withheld from disclosure). The pipeline runner folds those deltas into
//! the staged file's tag state and accumulates the dropped and withheld
//! collections; a tag leaves the stored state the moment an operation drops
//! or redacts it, so no tag is ever lost or counted twice across the sets.
//!
//! Operations are configured by name with per-operation options. Three ship
//! with the crate; additional implementations of [`PipelineOperation`] can
//! be appended programmatically with [`Pipeline::push`].

use std::fs;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use serde::Deserialize;

use crate::error::PipelineError;

use super::metadata::{TagMap, TagValue};

// =============================================================================
// Staged File
// =============================================================================

/// The working copy of an upload inside a repository's staging directory,
/// together with its current known tag state.
#[derive(Debug)]
pub struct StagedFile {
    /// Path of the working copy. Operations that change the output format
    /// update this to the renamed file.
    pub path: PathBuf,

    /// Tag state of the file as it currently stands.
    pub tags: TagMap,
}

impl StagedFile {
    /// Wrap a staged path with an empty tag state.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tags: TagMap::new(),
        }
    }

    /// Set a tag on the current state.
    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<TagValue>) {
        self.tags.insert(name.into(), value.into());
    }
}

// =============================================================================
// Operation Contract
// =============================================================================

/// Metadata contributed by one operation.
#[derive(Debug, Default)]
pub struct OperationDelta {
    /// Tags the operation added or replaced on the stored file.
    pub added: TagMap,

    /// Names of tags the operation removed from the file.
    pub dropped: Vec<String>,

    /// Names of tags the operation redacted from the file.
    pub withheld: Vec<String>,
}

/// A processing step over a staged file.
///
/// Implementations may rewrite the file at `file.path` (and repoint the path
/// when the container format changes) and report their metadata
/// contributions through the returned delta. They must not mutate
/// `file.tags` directly; the pipeline runner owns that state.
pub trait PipelineOperation: Send + Sync {
    /// Configured name of the operation.
    fn name(&self) -> &str;

    /// Apply the operation to the staged file.
    fn apply(&self, file: &mut StagedFile) -> Result<OperationDelta, PipelineError>;
}

// =============================================================================
// Configuration
// =============================================================================

fn default_jpeg_quality() -> u8 {
    80
}

/// Configuration of a single named operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationConfig {
    /// Re-encode the staged file as JPEG.
    ReencodeJpeg {
        /// Encoder quality, 1-100.
        #[serde(default = "default_jpeg_quality")]
        quality: u8,
    },

    /// Remove the listed tags from the file.
    ScrubTags {
        /// Tags to drop.
        tags: Vec<String>,
    },

    /// Redact the listed tags from the file.
    RedactTags {
        /// Tags to withhold.
        tags: Vec<String>,
    },
}

impl OperationConfig {
    /// Instantiate the configured operation.
    pub fn build(&self) -> Box<dyn PipelineOperation> {
        match self {
            Self::ReencodeJpeg { quality } => Box::new(ReencodeJpeg { quality: *quality }),
            Self::ScrubTags { tags } => Box::new(TagFilter {
                name: "scrub_tags",
                tags: tags.clone(),
                withhold: false,
            }),
            Self::RedactTags { tags } => Box::new(TagFilter {
                name: "redact_tags",
                tags: tags.clone(),
                withhold: true,
            }),
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Everything a pipeline run produced besides the file itself.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// Tags removed from the file, with their last values.
    pub dropped: TagMap,

    /// Tags redacted from the file, with their last values.
    pub withheld: TagMap,
}

/// An ordered sequence of processing operations.
#[derive(Default)]
pub struct Pipeline {
    operations: Vec<Box<dyn PipelineOperation>>,
}

impl Pipeline {
    /// An empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from configuration, in declared order.
    pub fn from_config(configs: &[OperationConfig]) -> Self {
        Self {
            operations: configs.iter().map(OperationConfig::build).collect(),
        }
    }

    /// Append an operation.
    pub fn push(&mut self, operation: Box<dyn PipelineOperation>) {
        self.operations.push(operation);
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the pipeline has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run every operation over `file` in order.
    ///
    /// Added tags merge into the staged tag state; dropped and redacted tags
    /// are removed from it and accumulated in the outcome. A failing
    /// operation aborts the run.
    pub fn run(&self, file: &mut StagedFile) -> Result<PipelineOutcome, PipelineError> {
        let mut outcome = PipelineOutcome::default();
        for operation in &self.operations {
            let delta = operation.apply(file)?;
            file.tags.extend(delta.added);
            for name in delta.dropped {
                if let Some(value) = file.tags.remove(&name) {
                    outcome.dropped.insert(name, value);
                }
            }
            for name in delta.withheld {
                if let Some(value) = file.tags.remove(&name) {
                    outcome.withheld.insert(name, value);
                }
            }
        }
        Ok(outcome)
    }
}

// =============================================================================
// Shipped Operations
// =============================================================================

/// Re-encodes the staged file as JPEG at a configured quality.
///
/// Renames the working copy to a `.jpg` extension when the upload arrived
/// under a different one.
struct ReencodeJpeg {
    quality: u8,
}

impl PipelineOperation for ReencodeJpeg {
    fn name(&self) -> &str {
        "reencode_jpeg"
    }

    fn apply(&self, file: &mut StagedFile) -> Result<OperationDelta, PipelineError> {
        let io_err = |source| PipelineError::Io {
            operation: self.name().to_string(),
            source,
        };
        let image_err = |source| PipelineError::Image {
            operation: self.name().to_string(),
            source,
        };

        let bytes = fs::read(&file.path).map_err(io_err)?;
        let decoded = image::load_from_memory(&bytes).map_err(image_err)?;

        let target = file.path.with_extension("jpg");
        let mut output = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut output, self.quality);
        decoded.write_with_encoder(encoder).map_err(image_err)?;
        fs::write(&target, &output).map_err(io_err)?;
        if target != file.path {
            fs::remove_file(&file.path).map_err(io_err)?;
            file.path = target;
        }

        let mut delta = OperationDelta::default();
        delta.added.insert(
            "MIMEType".to_string(),
            TagValue::from("image/jpeg"),
        );
        delta.added.insert(
            "ImageWidth".to_string(),
            TagValue::Integer(i64::from(decoded.width())),
        );
        delta.added.insert(
            "ImageHeight".to_string(),
            TagValue::Integer(i64::from(decoded.height())),
        );
        Ok(delta)
    }
}

/// Drops or redacts a configured list of tags.
struct TagFilter {
    name: &'static str,
    tags: Vec<String>,
    withhold: bool,
}

impl PipelineOperation for TagFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, file: &mut StagedFile) -> Result<OperationDelta, PipelineError> {
        // Only tags actually present count; the runner resolves values.
        let present: Vec<String> = self
            .tags
            .iter()
            .filter(|tag| file.tags.contains_key(*tag))
            .cloned()
            .collect();
        let mut delta = OperationDelta::default();
        if self.withhold {
            delta.withheld = present;
        } else {
            delta.dropped = present;
        }
        Ok(delta)
    }
}

// =============================================================================
// Tests
// =============================================================================
