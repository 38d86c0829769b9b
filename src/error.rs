//! Failure taxonomy for the upload and retrieval paths.
//!
//! Every variant carries enough context to render both the HTTP response
//! (status + JSON body, mapped at the server boundary) and a single
//! warning-level log line naming the offending field, key, or timestamp
//! delta. None of these are retried; each one terminates the current
//! request.

use thiserror::Error;

/// Rejections produced while vetting an upload or delete request.
///
/// The `Display` form of each variant is the exact log line emitted when the
/// request is rejected. Status codes and response bodies are assigned in the
/// server layer, keeping the non-standard codes (111, 333) out of the
/// decision logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No authorization header was sent at all.
    #[error("Attempt to upload file without an authorization header.")]
    HeaderMissing,

    /// An authorization header was sent but does not split into exactly two
    /// non-empty parts.
    #[error("Request aborted. Malformed authorization header.")]
    HeaderMalformed,

    /// The header parsed, but the API key is not the configured one.
    #[error("Request aborted. Unknown API key: {key}.")]
    UnknownKey {
        /// The key presented by the client.
        key: String,
    },

    /// The submitted signature does not match the expected digest.
    #[error("Request aborted. Bad signature.")]
    BadSignature,

    /// A required upload field was absent from the request body.
    #[error("Request aborted. Missing element: {field}.")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// The request carried no timestamp, or one that could not be parsed.
    #[error("Request aborted. Missing timestamp.")]
    TimestampMissing,

    /// The timestamp lies ahead of the server clock.
    #[error("Request aborted. Invalid timestamp: {timestamp}; {seconds} seconds ahead of time.")]
    TimestampFuture {
        /// The submitted timestamp, reformatted.
        timestamp: String,
        /// Whole seconds the timestamp is ahead of the reference time.
        seconds: i64,
    },

    /// The timestamp fell out of the validity window.
    #[error("Request aborted. Expired timestamp: {timestamp}; {seconds} seconds past expiration.")]
    TimestampExpired {
        /// The submitted timestamp, reformatted.
        timestamp: String,
        /// Whole seconds past the end of the validity window.
        seconds: i64,
    },

    /// The remote address is not in the upload allowlist.
    #[error("Request aborted. Host {addr} may not upload.")]
    HostNotAllowed {
        /// The rejected remote address.
        addr: String,
    },
}

impl UploadError {
    /// The subsystem that produced the rejection, for structured logs.
    pub fn component(&self) -> &'static str {
        match self {
            Self::HeaderMissing
            | Self::HeaderMalformed
            | Self::UnknownKey { .. }
            | Self::BadSignature
            | Self::MissingField { .. } => "authentication",
            Self::TimestampMissing
            | Self::TimestampFuture { .. }
            | Self::TimestampExpired { .. } => "replay-window",
            Self::HostNotAllowed { .. } => "access",
        }
    }
}

/// Failures while distributing an upload across the repository stack.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No configured repository accepts the file's declared media type.
    ///
    /// `supported` enumerates every media type accepted by any repository in
    /// the stack, in configuration order.
    #[error("Image format {media_type} is not supported. Supported formats are: {}.", format_supported(.supported))]
    UnsupportedMediaType {
        /// The declared media type of the rejected file.
        media_type: String,
        /// All media types supported across the stack.
        supported: Vec<String>,
    },

    /// A repository failed mid fan-out. Repositories earlier in the stack
    /// have already stored their copies and are not rolled back.
    #[error("Repository {name} failed to store the file: {source}")]
    Repository {
        /// Name of the failing repository.
        name: String,
        /// The underlying storage failure.
        source: RepositoryError,
    },
}

fn format_supported(supported: &[String]) -> String {
    let quoted: Vec<String> = supported.iter().map(|m| format!("\"{m}\"")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Failures inside a single repository's `store`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Staging, moving, or reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A processing operation failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The placement target already exists.
    #[error("Placement collision: {path} already exists")]
    PlacementCollision {
        /// The relative path that was already occupied.
        path: String,
    },
}

/// Failures raised by processing operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The operation could not read or write the staged file.
    #[error("I/O error in operation {operation}: {source}")]
    Io {
        /// Name of the failing operation.
        operation: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The staged bytes could not be decoded or re-encoded as an image.
    #[error("Image error in operation {operation}: {source}")]
    Image {
        /// Name of the failing operation.
        operation: String,
        /// The underlying codec error.
        source: image::ImageError,
    },
}

/// Failures while constructing IIIF URI parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IiifError {
    /// The quality value is outside the closed enumeration.
    #[error("Invalid quality: {value} (must be color, gray, bitonal, or default)")]
    InvalidQuality {
        /// The rejected value.
        value: String,
    },

    /// The region value is neither a keyword nor a well-formed rectangle.
    #[error("Invalid region: {value}")]
    InvalidRegion {
        /// The rejected value.
        value: String,
    },

    /// A shorthand derivative was requested for a repository that does not
    /// implement the image API.
    #[error("Repository {repository} does not implement the image API")]
    NotAnImageService {
        /// Name of the repository.
        repository: String,
    },
}

/// Failures while building the repository stack from configuration.
#[derive(Debug, Error)]
pub enum StackError {
    /// The configuration file could not be read.
    #[error("Cannot read repository configuration {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape.
    #[error("Cannot parse repository configuration {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: String,
        /// The underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Two repositories share a name. Names are case-sensitive and must be
    /// unique within the stack.
    #[error("Duplicate repository name: {name}")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
}
