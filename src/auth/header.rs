//! Authorization header parsing and verification.
//!
//! The authorization header carries an API key and a hex HMAC signature
//! joined by a separator:
//!
//! ```text
//! Authorization: <key>:<signature>
//! ```
//!
//! Parsing never fails; a header that does not split into exactly two
//! non-empty parts simply yields an invalid [`AuthorizationHeader`] on which
//! [`is_valid`](AuthorizationHeader::is_valid) is `false` and
//! [`verify`](AuthorizationHeader::verify) returns `None`.

use subtle::ConstantTimeEq;

/// Default separator between the API key and the signature.
pub const DEFAULT_SEPARATOR: &str = ":";

/// A parsed authorization header value.
#[derive(Debug, Clone)]
pub struct AuthorizationHeader {
    header: String,
    separator: String,
    parts: Option<(String, String)>,
}

impl AuthorizationHeader {
    /// Parse a raw header value.
    ///
    /// Splitting is by `separator` with empty segments dropped; the header
    /// is valid only if exactly two non-empty parts remain.
    pub fn parse(header: impl Into<String>, separator: impl Into<String>) -> Self {
        let header = header.into();
        let separator = separator.into();
        let segments: Vec<&str> = header
            .split(separator.as_str())
            .filter(|segment| !segment.is_empty())
            .collect();
        let parts = match segments.as_slice() {
            [key, signature] => Some(((*key).to_string(), (*signature).to_string())),
            _ => None,
        };
        Self {
            header,
            separator,
            parts,
        }
    }

    /// The raw header value as received.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The separator this header was parsed with.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The parsed API key, if the header is valid.
    pub fn key(&self) -> Option<&str> {
        self.parts.as_ref().map(|(key, _)| key.as_str())
    }

    /// The parsed signature, if the header is valid.
    pub fn signature(&self) -> Option<&str> {
        self.parts.as_ref().map(|(_, signature)| signature.as_str())
    }

    /// Whether the header has both a key and a signature.
    pub fn is_valid(&self) -> bool {
        self.parts.is_some()
    }

    /// Return the parsed signature only if the header is valid and its key
    /// matches `api_key`. The key comparison is constant-time.
    pub fn verify(&self, api_key: &str) -> Option<&str> {
        let (key, signature) = self.parts.as_ref()?;
        let matches: bool = api_key.as_bytes().ct_eq(key.as_bytes()).into();
        matches.then_some(signature.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
