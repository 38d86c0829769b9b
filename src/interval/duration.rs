//! Duration notation parsing.
//!
//! Durations are written with integer values and the unit tokens `h`
//! (hours), `m` (minutes), and `s` (seconds). Parsing is case-insensitive
//! and whitespace tolerant; units must appear in `h m s` order and each at
//! most once.
//!
//! ```
//! use asset_depot::interval::Duration;
//!
//! assert_eq!(Duration::in_seconds("3h").unwrap(), 10_800);
//! assert_eq!(Duration::in_seconds("30m").unwrap(), 1_800);
//! assert_eq!(Duration::in_seconds("1h 15m").unwrap(), 4_500);
//! assert_eq!(Duration::in_seconds("1h 20m 45s").unwrap(), 4_845);
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a duration string does not match the notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration notation: {input}")]
pub struct ParseDurationError {
    /// The rejected input.
    pub input: String,
}

/// A duration in `h m s` notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Duration {
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl Duration {
    /// Parse `input` and return the total number of seconds.
    pub fn in_seconds(input: &str) -> Result<u64, ParseDurationError> {
        input.parse::<Self>().map(|duration| duration.to_seconds())
    }

    /// Hours component.
    pub fn hours(&self) -> u64 {
        self.hours
    }

    /// Minutes component.
    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    /// Seconds component.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Total number of seconds.
    pub fn to_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl FromStr for Duration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseDurationError {
            input: s.to_string(),
        };

        let mut duration = Duration::default();
        // Units must appear in this order, each at most once.
        let mut remaining: &[(char, fn(&mut Duration, u64))] = &[
            ('h', |d, v| d.hours = v),
            ('m', |d, v| d.minutes = v),
            ('s', |d, v| d.seconds = v),
        ];

        let mut chars = s.trim().chars().peekable();
        let mut matched_any = false;
        while chars.peek().is_some() {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let Some(first) = chars.peek().copied() else {
                break;
            };
            if !first.is_ascii_digit() {
                return Err(error());
            }

            let mut value: u64 = 0;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(digit)))
                    .ok_or_else(error)?;
                chars.next();
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let unit = chars.next().ok_or_else(error)?.to_ascii_lowercase();

            let position = remaining
                .iter()
                .position(|(token, _)| *token == unit)
                .ok_or_else(error)?;
            remaining[position].1(&mut duration, value);
            remaining = &remaining[position + 1..];
            matched_any = true;
        }

        if matched_any {
            Ok(duration)
        } else {
            Err(error())
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
    }
}

// =============================================================================
// Tests
// =============================================================================
