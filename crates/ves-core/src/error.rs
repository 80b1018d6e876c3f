//! # Error Types — Core Primitive Failures
//!
//! What the foundational types report when given bad input, as `thiserror`
//! enums. Higher layers fold these into their own domain errors with
//! `#[from]`; nothing here panics.

use thiserror::Error;

/// Canonicalization failure.
#[derive(Error, Debug)]
pub enum CanonicalError {
    /// A non-integer number reached the canonicalization pipeline.
    /// Durations and counts are integers; free-form numbers are strings.
    #[error("float value {value} at {path} is not permitted in canonical form; use an integer or string")]
    FloatRejected {
        /// Dotted path to the offending value (e.g. `video.duration_seconds`).
        path: String,
        /// The rejected float value.
        value: f64,
    },

    /// serde or the JCS encoder failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a content hash string.
#[derive(Error, Debug)]
pub enum HashParseError {
    /// The input did not have exactly 64 characters after trimming.
    #[error("content hash must be 64 hex chars, got {length}")]
    BadLength {
        /// Character count of the trimmed input.
        length: usize,
    },

    /// The input contained a non-hexadecimal character.
    #[error("content hash contains non-hex character {character:?} at index {index}")]
    NonHexCharacter {
        /// The offending character.
        character: char,
        /// Zero-based position within the trimmed input.
        index: usize,
    },
}

/// Error parsing or constructing a timestamp.
#[derive(Error, Debug)]
pub enum TimestampError {
    /// The input used a timezone offset other than `Z`.
    #[error("timestamp must use Z suffix (UTC only), got: {input:?}")]
    NonUtc {
        /// The rejected input string.
        input: String,
    },

    /// The input was not valid RFC 3339.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Invalid {
        /// The rejected input string.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A Unix epoch value was out of the representable range.
    #[error("epoch seconds out of range: {secs}")]
    EpochOutOfRange {
        /// The rejected epoch value.
        secs: i64,
    },
}
