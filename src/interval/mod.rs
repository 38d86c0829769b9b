//! Request freshness window.
//!
//! Uploads carry a client timestamp that must fall inside a configured
//! validity window relative to the server clock. [`ValidatingTimestamp`]
//! classifies a submitted timestamp as missing, future, expired, or valid;
//! [`Duration`] parses the `"1h 20m 45s"` notation the window is configured
//! with.

pub mod duration;
pub mod timestamp;

pub use duration::Duration;
pub use timestamp::{TimestampState, ValidatingTimestamp};
