//! IIIF image request URI assembly.
//!
//! An [`IiifUri`] is built from the components of an image service URL
//! (scheme, host, path prefix), an asset identifier, and the four image
//! request parameters plus the output format. The absolute path is always
//!
//! ```text
//! /{prefix}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}
//! ```
//!
//! Quality values form a closed enumeration; constructing any other value
//! fails validation.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::IiifError;

use super::region::ImageRegion;

// =============================================================================
// Parameters
// =============================================================================

/// The quality parameter, a closed enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Quality {
    /// Full color.
    Color,

    /// Grayscale.
    Gray,

    /// Black and white.
    Bitonal,

    /// The server's default rendition.
    #[default]
    Default,
}

impl Quality {
    /// Parse a quality token, rejecting anything outside the enumeration.
    pub fn parse(value: &str) -> Result<Self, IiifError> {
        match value {
            "color" => Ok(Self::Color),
            "gray" => Ok(Self::Gray),
            "bitonal" => Ok(Self::Bitonal),
            "default" => Ok(Self::Default),
            other => Err(IiifError::InvalidQuality {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Quality {
    type Err = IiifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Color => "color",
            Self::Gray => "gray",
            Self::Bitonal => "bitonal",
            Self::Default => "default",
        };
        write!(f, "{token}")
    }
}

/// The size parameter.
///
/// Only the tokens this service emits are modeled; arbitrary client-supplied
/// size segments pass through as literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSize {
    /// The full extracted region, unscaled.
    Max,

    /// Scale to an exact width, height following the aspect ratio. Rendered
    /// as `"<n>,"`.
    Width(u32),

    /// A verbatim size token.
    Literal(String),
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::Max
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Width(width) => write!(f, "{width},"),
            Self::Literal(token) => write!(f, "{token}"),
        }
    }
}

/// The rotation parameter, degrees with an optional mirror prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    degrees: f32,
    mirrored: bool,
}

impl Rotation {
    /// Rotation by `degrees`, unmirrored.
    pub fn new(degrees: f32) -> Self {
        Self {
            degrees,
            mirrored: false,
        }
    }

    /// Mirror the image before rotating.
    pub fn mirrored(mut self) -> Self {
        self.mirrored = true;
        self
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mirrored {
            write!(f, "!")?;
        }
        if self.degrees.fract() == 0.0 {
            write!(f, "{}", self.degrees as i64)
        } else {
            write!(f, "{}", self.degrees)
        }
    }
}

// =============================================================================
// Service URL
// =============================================================================

/// The base URL components of an image service: scheme, host, and the
/// ordered path prefix segments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceUrl {
    /// `http` or `https`.
    pub scheme: String,

    /// Server name, e.g. `example.com`.
    pub host: String,

    /// Path on the server, e.g. `iiif` or `iiif/2`.
    #[serde(default, deserialize_with = "deserialize_prefix")]
    pub prefix: Vec<String>,
}

impl ServiceUrl {
    /// Split a base URL string into its components.
    ///
    /// Returns `None` when `base` is not an absolute http(s) URL.
    pub fn parse(base: &str) -> Option<Self> {
        let url = url::Url::parse(base).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.to_string();
        let prefix = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            scheme: url.scheme().to_string(),
            host,
            prefix,
        })
    }
}

fn deserialize_prefix<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // The prefix may be written as a path string or a list of segments.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Prefix {
        Path(String),
        Segments(Vec<String>),
    }

    match Prefix::deserialize(deserializer)? {
        Prefix::Path(path) => Ok(path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()),
        Prefix::Segments(segments) => Ok(segments),
    }
}

// =============================================================================
// IiifUri
// =============================================================================

/// A fully parameterized image request URI.
#[derive(Debug, Clone)]
pub struct IiifUri {
    service: ServiceUrl,
    identifier: String,
    region: ImageRegion,
    size: ImageSize,
    rotation: Rotation,
    quality: Quality,
    format: String,
}

impl IiifUri {
    /// Start a URI for `identifier` on `service` with default parameters
    /// (`full`/`max`/`0`/`default`) and the given output format.
    pub fn new(
        service: ServiceUrl,
        identifier: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self {
            service,
            identifier: identifier.into(),
            region: ImageRegion::default(),
            size: ImageSize::default(),
            rotation: Rotation::default(),
            quality: Quality::default(),
            format: format.into(),
        }
    }

    /// Override the region.
    pub fn with_region(mut self, region: ImageRegion) -> Self {
        self.region = region;
        self
    }

    /// Override the size.
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Override the rotation.
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Override the quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Override the output format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// The requested resource name, `quality.format`.
    pub fn resource(&self) -> String {
        format!("{}.{}", self.quality, self.format)
    }

    /// The absolute path of the URI.
    pub fn path(&self) -> String {
        let mut segments: Vec<String> = self.service.prefix.clone();
        segments.push(self.identifier.clone());
        segments.push(self.region.to_string());
        segments.push(self.size.to_string());
        segments.push(self.rotation.to_string());
        segments.push(self.resource());
        format!("/{}", segments.join("/"))
    }
}

impl fmt::Display for IiifUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.service.scheme,
            self.service.host,
            self.path()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
