//! Redirect URI construction for stored assets.
//!
//! An [`AssetRedirect`] combines a stored asset's identifier with the
//! service description of the repository holding it. It builds either a
//! plain concatenated URI (base URL + identifier) or a parameterized image
//! request URI, and offers the two named derivatives the retrieval routes
//! serve: fullsize and thumbnail.
//!
//! Derivatives form a closed set selected by [`Derivative`]; they are only
//! available when the owning repository implements the image API, and
//! requesting one otherwise is a usage error, not a silent fallback.

use crate::error::IiifError;

use super::region::ImageRegion;
use super::uri::{IiifUri, ImageSize, Quality, Rotation, ServiceUrl};

/// Default thumbnail width in pixels.
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 128;

/// The closed set of named derivative URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivative {
    /// The full image at full resolution.
    Fullsize,

    /// A width-constrained thumbnail; `None` uses the default width.
    Thumbnail {
        /// Desired width in pixels.
        width: Option<u32>,
    },
}

/// Optional overrides for a parameterized image request.
#[derive(Debug, Clone, Default)]
pub struct IiifParams {
    /// Region override.
    pub region: Option<ImageRegion>,

    /// Size override.
    pub size: Option<ImageSize>,

    /// Rotation override.
    pub rotation: Option<Rotation>,

    /// Quality override.
    pub quality: Option<Quality>,

    /// Format override.
    pub format: Option<String>,
}

/// Builds redirect URIs for one stored asset.
#[derive(Debug, Clone)]
pub struct AssetRedirect {
    repository: String,
    identifier: String,
    service: Option<ServiceUrl>,
    image_api: bool,
    default_format: String,
}

impl AssetRedirect {
    /// Create a redirect builder.
    ///
    /// `repository` is the name of the repository holding the asset (used in
    /// error messages), `identifier` the stored relative path, `service` the
    /// repository's service URL, `image_api` its image-API capability flag,
    /// and `default_format` its configured output format.
    pub fn new(
        repository: impl Into<String>,
        identifier: impl Into<String>,
        service: Option<ServiceUrl>,
        image_api: bool,
        default_format: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            identifier: identifier.into(),
            service,
            image_api,
            default_format: default_format.into(),
        }
    }

    /// Whether the owning repository implements the image API.
    pub fn is_image_api(&self) -> bool {
        self.image_api && self.service.is_some()
    }

    /// Concatenate a plain base URL with the asset identifier.
    ///
    /// No image-API semantics; a single trailing slash on `base` is
    /// tolerated.
    pub fn concatenated(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.identifier)
    }

    /// Build a parameterized image request URI with the given overrides.
    ///
    /// Unspecified parameters default to `full`, `max`, `0`, `default`, and
    /// the repository's output format.
    pub fn iiif(&self, params: IiifParams) -> Result<String, IiifError> {
        let service = self.image_service()?;
        let format = params
            .format
            .unwrap_or_else(|| self.default_format.clone());
        let mut uri = IiifUri::new(service.clone(), self.identifier.clone(), format);
        if let Some(region) = params.region {
            uri = uri.with_region(region);
        }
        if let Some(size) = params.size {
            uri = uri.with_size(size);
        }
        if let Some(rotation) = params.rotation {
            uri = uri.with_rotation(rotation);
        }
        if let Some(quality) = params.quality {
            uri = uri.with_quality(quality);
        }
        Ok(uri.to_string())
    }

    /// Build a named derivative URI.
    pub fn derivative(&self, derivative: Derivative) -> Result<String, IiifError> {
        let params = match derivative {
            Derivative::Fullsize => IiifParams::default(),
            Derivative::Thumbnail { width } => IiifParams {
                size: Some(ImageSize::Width(width.unwrap_or(DEFAULT_THUMBNAIL_WIDTH))),
                ..IiifParams::default()
            },
        };
        self.iiif(params)
    }

    fn image_service(&self) -> Result<&ServiceUrl, IiifError> {
        if !self.image_api {
            return Err(IiifError::NotAnImageService {
                repository: self.repository.clone(),
            });
        }
        self.service
            .as_ref()
            .ok_or_else(|| IiifError::NotAnImageService {
                repository: self.repository.clone(),
            })
    }
}

// =============================================================================
// Tests
// =============================================================================
