//! HMAC signature construction and verification.
//!
//! A [`Signature`] holds an ordered list of message elements, an optional
//! file digest, a shared secret, and a hash function. The message is the
//! elements joined by the separator with the file digest appended last, if
//! present:
//!
//! ```text
//! signature = HMAC(secret, "element1|element2|...|file_md5")
//! ```
//!
//! Element order is insertion order; reconstruction is deterministic.
//! Comparison against a client-supplied digest uses constant-time equality
//! and returns `false` (never panics) on mismatch or an absent comparator.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::error::UploadError;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA512 type alias
type HmacSha512 = Hmac<Sha512>;

/// Default separator between message elements.
pub const DEFAULT_SEPARATOR: &str = "|";

// =============================================================================
// Hash Function
// =============================================================================

/// The closed set of hash functions a signature may be configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashFunction {
    /// HMAC-SHA256.
    Sha256,

    /// HMAC-SHA512. The default.
    #[default]
    Sha512,
}

impl FromStr for HashFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA256" | "SHA-256" => Ok(Self::Sha256),
            "SHA512" | "SHA-512" => Ok(Self::Sha512),
            other => Err(format!(
                "unknown hash function: {other} (expected SHA256 or SHA512)"
            )),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

// =============================================================================
// Signature
// =============================================================================

/// A keyed message digest over ordered request elements.
///
/// Constructed per request and discarded after comparison.
#[derive(Clone)]
pub struct Signature {
    elements: Vec<String>,
    file_digest: Option<String>,
    hash_function: HashFunction,
    secret: Vec<u8>,
    separator: String,
}

impl Signature {
    /// Create an empty signature with the given secret, the default
    /// separator, and the default hash function.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            elements: Vec::new(),
            file_digest: None,
            hash_function: HashFunction::default(),
            secret: secret.as_ref().to_vec(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Set the separator used to join message elements.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the hash function.
    pub fn with_hash_function(mut self, hash_function: HashFunction) -> Self {
        self.hash_function = hash_function;
        self
    }

    /// Append the MD5 digest of `bytes` as the final message element.
    pub fn with_file(mut self, bytes: &[u8]) -> Self {
        self.file_digest = Some(file_digest(bytes));
        self
    }

    /// Append a precomputed hex file digest as the final message element.
    pub fn with_file_digest(mut self, digest: impl Into<String>) -> Self {
        self.file_digest = Some(digest.into());
        self
    }

    /// Append an element to the message body.
    pub fn push(&mut self, element: impl Into<String>) {
        self.elements.push(element.into());
    }

    /// Build a signature from named request fields.
    ///
    /// Every name in `keys` must resolve to a value; the first absent one is
    /// reported as [`UploadError::MissingField`] naming the key, so the gate
    /// can distinguish it from other authentication failures.
    pub fn from_fields<'a, F>(
        fields: F,
        keys: &[&str],
        secret: impl AsRef<[u8]>,
        separator: impl Into<String>,
        hash_function: HashFunction,
    ) -> Result<Self, UploadError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut signature = Self::new(secret)
            .with_separator(separator)
            .with_hash_function(hash_function);
        for key in keys {
            let value = fields(key).ok_or_else(|| UploadError::MissingField {
                field: (*key).to_string(),
            })?;
            signature.push(value);
        }
        Ok(signature)
    }

    /// The elements accumulated so far, in insertion order.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// The hex file digest, if one was attached.
    pub fn file_digest(&self) -> Option<&str> {
        self.file_digest.as_deref()
    }

    /// The message: all elements joined by the separator, with the file
    /// digest appended last when present.
    pub fn message(&self) -> String {
        let mut parts: Vec<&str> = self.elements.iter().map(String::as_str).collect();
        if let Some(digest) = &self.file_digest {
            parts.push(digest);
        }
        parts.join(&self.separator)
    }

    /// The hex-encoded keyed digest of the message.
    pub fn hexdigest(&self) -> String {
        let message = self.message();
        match self.hash_function {
            HashFunction::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(&self.secret)
                    .expect("HMAC can take key of any size");
                mac.update(message.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
            HashFunction::Sha512 => {
                let mut mac = HmacSha512::new_from_slice(&self.secret)
                    .expect("HMAC can take key of any size");
                mac.update(message.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Compare the digest of `self` against a client-supplied digest in
    /// constant time. Returns `false` on mismatch or when `other` is absent.
    pub fn matches(&self, other: Option<&str>) -> bool {
        let Some(other) = other else {
            return false;
        };
        let expected = self.hexdigest();
        expected.as_bytes().ct_eq(other.as_bytes()).into()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret stays out of debug output.
        f.debug_struct("Signature")
            .field("elements", &self.elements)
            .field("file_digest", &self.file_digest)
            .field("hash_function", &self.hash_function)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

/// Hex MD5 digest of a byte slice, as used for upload file checksums.
pub fn file_digest(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

// =============================================================================
// Tests
// =============================================================================
