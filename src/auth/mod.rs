//! HMAC request authentication primitives.
//!
//! Two building blocks that the server-side authentication gate composes:
//!
//! - [`Signature`] reconstructs the keyed digest a client must have computed
//!   over its upload fields and file checksum.
//! - [`AuthorizationHeader`] parses the `key:signature` pair a client sends
//!   in the authorization header.
//!
//! Both types are pure: they never touch the request or produce HTTP
//! responses. All digest comparisons are constant-time.

pub mod header;
pub mod signature;

pub use header::AuthorizationHeader;
pub use signature::{HashFunction, Signature};
