//! Replay-window timestamp classification.
//!
//! A submitted timestamp is compared against a reference time (request
//! arrival) and a validity window. Exactly one of four states applies:
//!
//! - `Missing` - no timestamp was submitted, or it did not parse
//! - `Future` - the timestamp lies ahead of the reference time
//! - `Expired` - the timestamp is older than the validity window allows
//! - `Valid` - none of the above
//!
//! `Valid` is the only accepting state; the other three reject the request
//! with a distinct message. Timestamps use the fixed format
//! `%Y-%m-%d %H:%M:%S%.f`; when no zone is given, UTC is assumed. The only
//! accepted explicit zone is a trailing ` UTC`.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::UploadError;

/// Format accepted for submitted timestamps (fractional seconds optional).
pub const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Format used when a timestamp is echoed back in messages.
pub const PRINT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f %Z";

// =============================================================================
// Classification
// =============================================================================

/// The exclusive classification of a submitted timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampState {
    /// No timestamp, or one that did not parse.
    Missing,

    /// Ahead of the reference time by the given number of whole seconds.
    Future {
        /// Seconds ahead of the reference time.
        seconds: i64,
    },

    /// Behind the reference time by more than the validity window.
    Expired {
        /// Seconds past the end of the validity window.
        seconds: i64,
    },

    /// Inside the validity window.
    Valid,
}

// =============================================================================
// ValidatingTimestamp
// =============================================================================

/// A submitted timestamp paired with the reference time and validity window
/// it is judged against.
#[derive(Debug, Clone)]
pub struct ValidatingTimestamp {
    time: Option<DateTime<Utc>>,
    reference_time: DateTime<Utc>,
    validity_secs: u64,
}

impl ValidatingTimestamp {
    /// Classify `raw` against `reference_time` and a window of
    /// `validity_secs` seconds.
    ///
    /// `raw` may omit a zone (UTC assumed) or end in ` UTC`. Anything else,
    /// including unparseable input, classifies as missing.
    pub fn from_string(
        raw: Option<&str>,
        validity_secs: u64,
        reference_time: DateTime<Utc>,
    ) -> Self {
        let time = raw.filter(|s| !s.is_empty()).and_then(parse_timestamp);
        Self {
            time,
            reference_time,
            validity_secs,
        }
    }

    /// Classify against the current system clock.
    pub fn now(raw: Option<&str>, validity_secs: u64) -> Self {
        Self::from_string(raw, validity_secs, Utc::now())
    }

    /// The parsed time, if any.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    /// The reference time the submitted timestamp is compared against.
    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    /// The validity window in seconds.
    pub fn validity_secs(&self) -> u64 {
        self.validity_secs
    }

    /// The exclusive state of this timestamp.
    pub fn state(&self) -> TimestampState {
        let Some(time) = self.time else {
            return TimestampState::Missing;
        };
        let age = self.reference_time.signed_duration_since(time);
        if age.num_seconds() < 0 {
            return TimestampState::Future {
                seconds: -age.num_seconds(),
            };
        }
        let validity = i64::try_from(self.validity_secs).unwrap_or(i64::MAX);
        if age.num_seconds() > validity {
            return TimestampState::Expired {
                seconds: age.num_seconds() - validity,
            };
        }
        TimestampState::Valid
    }

    /// Whether the timestamp is inside the window.
    pub fn is_valid(&self) -> bool {
        self.state() == TimestampState::Valid
    }

    /// Convert a non-valid state into the matching rejection.
    ///
    /// Returns `Ok(())` for a valid timestamp.
    pub fn check(&self) -> Result<(), UploadError> {
        match self.state() {
            TimestampState::Valid => Ok(()),
            TimestampState::Missing => Err(UploadError::TimestampMissing),
            TimestampState::Future { seconds } => Err(UploadError::TimestampFuture {
                timestamp: self.formatted(),
                seconds,
            }),
            TimestampState::Expired { seconds } => Err(UploadError::TimestampExpired {
                timestamp: self.formatted(),
                seconds,
            }),
        }
    }

    /// The submitted time rendered in the print format, or an empty string
    /// when missing.
    pub fn formatted(&self) -> String {
        self.time
            .map(|time| time.format(PRINT_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// Parse a timestamp string, assuming UTC when no zone is given.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let bare = raw.strip_suffix(" UTC").unwrap_or(raw);
    NaiveDateTime::parse_from_str(bare, PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Tests
// =============================================================================
