//! IIIF Image API URI construction.
//!
//! Stored assets are served by external image services; this module builds
//! the redirect URIs pointing at them. [`IiifUri`] assembles a well-formed
//! `scheme://host/prefix/identifier/region/size/rotation/quality.format`
//! URI with defaulting and override rules; [`AssetRedirect`] layers the
//! repository-aware shorthands (fullsize, thumbnail) on top.

pub mod redirect;
pub mod region;
pub mod uri;

pub use redirect::{AssetRedirect, Derivative, IiifParams};
pub use region::ImageRegion;
pub use uri::{IiifUri, ImageSize, Quality, Rotation, ServiceUrl};
