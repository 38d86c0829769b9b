//! File metadata sets.
//!
//! Metadata collected while processing a stored file is partitioned into
//! three disclosure classes:
//!
//! - `stored` - metadata of the file as it sits in the repository
//! - `dropped` - metadata of the original upload lost during processing
//! - `withheld` - metadata redacted because it may be sensitive
//!
//! Every stored file yields exactly one `stored` set plus the accumulated
//! `dropped` and `withheld` sets. Tags describing the file's position on the
//! server filesystem are never part of `stored`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tags that describe the file's place on the filesystem rather than its
/// content. These never appear in a `stored` set.
pub const FILESTAT_TAGS: [&str; 7] = [
    "SourceFile",
    "FileName",
    "Directory",
    "FilePermissions",
    "FileModifyDate",
    "FileAccessDate",
    "FileInodeChangeDate",
];

/// The closed set of disclosure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetName {
    /// Metadata of the file as stored.
    Stored,

    /// Metadata lost during processing.
    Dropped,

    /// Metadata redacted from the file.
    Withheld,
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stored => "stored",
            Self::Dropped => "dropped",
            Self::Withheld => "withheld",
        };
        write!(f, "{name}")
    }
}

/// A single metadata tag value.
///
/// Rational values exist only transiently: collection normalizes them to
/// their `"numerator/denominator"` text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Free text.
    Text(String),

    /// An integer value.
    Integer(i64),

    /// A floating point value.
    Float(f64),

    /// A rational number, as EXIF-style tag sources produce.
    Rational {
        /// Numerator.
        numerator: i64,
        /// Denominator.
        denominator: i64,
    },
}

impl TagValue {
    /// Convert a rational into its text form; other values pass through.
    pub fn normalized(self) -> Self {
        match self {
            Self::Rational {
                numerator,
                denominator,
            } => Self::Text(format!("{numerator}/{denominator}")),
            other => other,
        }
    }

    /// The value as a string slice, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

/// Ordered mapping of tag names to values.
pub type TagMap = BTreeMap<String, TagValue>;

/// One disclosure class worth of tags for a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSet {
    /// Which disclosure class this set belongs to.
    pub setname: SetName,

    /// The tags in this set.
    #[serde(flatten)]
    pub tags: TagMap,
}

impl MetadataSet {
    /// Create an empty set.
    pub fn new(setname: SetName) -> Self {
        Self {
            setname,
            tags: TagMap::new(),
        }
    }

    /// Build the `stored` set from the final tag state of a processed file:
    /// filesystem-stat tags are stripped and rational values normalized.
    pub fn stored(tags: TagMap) -> Self {
        let tags = tags
            .into_iter()
            .filter(|(name, _)| !FILESTAT_TAGS.contains(&name.as_str()))
            .map(|(name, value)| (name, value.normalized()))
            .collect();
        Self {
            setname: SetName::Stored,
            tags,
        }
    }

    /// Build a `dropped` or `withheld` set from accumulated tags, with
    /// rational values normalized.
    pub fn collected(setname: SetName, tags: TagMap) -> Self {
        let tags = tags
            .into_iter()
            .map(|(name, value)| (name, value.normalized()))
            .collect();
        Self { setname, tags }
    }

    /// Insert a tag.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TagValue>) {
        self.tags.insert(name.into(), value.into());
    }

    /// Look up a tag value.
    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    /// Whether this set has no tags.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of tags in this set.
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
