//! The authentication gate and replay-window check.
//!
//! Every upload passes three guards before any file handling:
//!
//! 1. The host allowlist (when configured) rejects uploads from unknown
//!    remote addresses.
//! 2. The replay window rejects requests whose timestamp is missing, in the
//!    future, or expired. This resolves fully before any signature work, so
//!    a stale request never reaches the more expensive HMAC verification.
//! 3. The gate itself checks the authorization header and verifies the
//!    request signature, short-circuiting on the first failure:
//!    header present → header well-formed → key known → required fields
//!    present → signature matches.
//!
//! Acceptance has no side effect. Every rejection surfaces as exactly one
//! [`UploadError`], which the response mapping logs exactly once.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::signature::file_digest;
use crate::auth::{AuthorizationHeader, HashFunction, Signature};
use crate::config::Config;
use crate::error::UploadError;
use crate::interval::ValidatingTimestamp;

use super::handlers::{ApiError, UploadRequest};

/// Fields that make up the signed message, in message order.
const SIGNATURE_FIELDS: [&str; 3] = ["filename", "username", "timestamp"];

// =============================================================================
// Upload Authentication
// =============================================================================

/// Verifies upload credentials against the configured key and secret.
#[derive(Debug, Clone)]
pub struct UploadAuth {
    api_key: String,
    secret: String,
    separator: String,
    header_separator: String,
    hash_function: HashFunction,
}

impl UploadAuth {
    /// Create an authenticator.
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        separator: impl Into<String>,
        header_separator: impl Into<String>,
        hash_function: HashFunction,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            separator: separator.into(),
            header_separator: header_separator.into(),
            hash_function,
        }
    }

    /// Create an authenticator from the server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.api_key,
            &config.secret,
            &config.separator,
            &config.header_separator,
            config.parsed_hash_function(),
        )
    }

    /// Run the gate over a collected upload request.
    ///
    /// `header` is the raw authorization header, if one was sent. Returns on
    /// the first failing step; acceptance returns unit.
    pub fn authenticate_upload(
        &self,
        header: Option<&str>,
        request: &UploadRequest,
    ) -> Result<(), UploadError> {
        let header = header.ok_or(UploadError::HeaderMissing)?;

        let header = AuthorizationHeader::parse(header, self.header_separator.as_str());
        if !header.is_valid() {
            return Err(UploadError::HeaderMalformed);
        }
        let Some(submitted) = header.verify(&self.api_key) else {
            return Err(UploadError::UnknownKey {
                // A valid header always has a key.
                key: header.key().unwrap_or_default().to_string(),
            });
        };

        let file = request.file.as_ref().ok_or(UploadError::MissingField {
            field: "file".to_string(),
        })?;
        let expected = Signature::from_fields(
            |key| request.field(key),
            &SIGNATURE_FIELDS,
            &self.secret,
            self.separator.as_str(),
            self.hash_function,
        )?
        .with_file_digest(file_digest(&file.bytes));

        if !expected.matches(Some(submitted)) {
            return Err(UploadError::BadSignature);
        }
        Ok(())
    }
}

// =============================================================================
// Replay Window
// =============================================================================

/// The freshness window upload timestamps are validated against.
#[derive(Debug, Clone, Copy)]
pub struct ReplayWindow {
    validity_secs: u64,
}

impl ReplayWindow {
    /// A window of `validity_secs` seconds.
    pub fn new(validity_secs: u64) -> Self {
        Self { validity_secs }
    }

    /// The window length in seconds.
    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// Check `timestamp` against the current clock, rejecting missing,
    /// future, and expired values with their distinct errors.
    pub fn validate(&self, timestamp: Option<&str>) -> Result<(), UploadError> {
        ValidatingTimestamp::now(timestamp, self.validity_secs).check()
    }
}

// =============================================================================
// Host Allowlist
// =============================================================================

/// Remote addresses allowed to reach the upload route.
///
/// An empty allowlist admits any host.
#[derive(Debug, Clone, Default)]
pub struct HostAllowlist {
    allowed: Option<Arc<Vec<IpAddr>>>,
}

impl HostAllowlist {
    /// Allow any host.
    pub fn any() -> Self {
        Self::default()
    }

    /// Allow only the listed addresses.
    pub fn only(allowed: Vec<IpAddr>) -> Self {
        Self {
            allowed: Some(Arc::new(allowed)),
        }
    }

    /// Whether `addr` may upload.
    pub fn permits(&self, addr: IpAddr) -> bool {
        match &self.allowed {
            None => true,
            Some(allowed) => allowed.contains(&addr),
        }
    }
}

/// Middleware guarding the upload route with the host allowlist.
///
/// The peer address comes from the connection info the listener attaches to
/// each request; with an allowlist configured, a request without one is
/// rejected.
pub async fn host_guard(
    State(allowlist): State<HostAllowlist>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if allowlist.allowed.is_none() {
        return Ok(next.run(request).await);
    }
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    match peer {
        Some(addr) if allowlist.permits(addr) => Ok(next.run(request).await),
        Some(addr) => Err(UploadError::HostNotAllowed {
            addr: addr.to_string(),
        }
        .into()),
        None => Err(UploadError::HostNotAllowed {
            addr: "unknown".to_string(),
        }
        .into()),
    }
}

// =============================================================================
// Tests
// =============================================================================
