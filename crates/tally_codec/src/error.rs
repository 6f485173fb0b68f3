//! Error types for record encoding and decoding.

use thiserror::Error;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that can occur while decoding a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The record ended before a field was fully read.
    #[error("unexpected end of record")]
    UnexpectedEof,

    /// Bytes remained after all fields were consumed.
    #[error("unconsumed data: {remaining} trailing bytes")]
    TrailingBytes {
        /// Number of unconsumed bytes.
        remaining: usize,
    },

    /// The outer record tag is not one of the known record types.
    #[error("unrecognized record tag 0x{tag:02x}")]
    UnknownRecordTag {
        /// The tag byte found.
        tag: u8,
    },

    /// A mandatory inner tag did not match.
    #[error("expected tag 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedTag {
        /// The tag that was required here.
        expected: u8,
        /// The tag actually present.
        found: u8,
    },

    /// A foreign-key ID did not resolve to a live entity.
    #[error("unresolved {kind} reference: id {id}")]
    UnknownReference {
        /// Entity kind the ID was expected to name.
        kind: &'static str,
        /// The unresolved ID.
        id: u32,
    },

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A field held a value outside its domain.
    #[error("invalid {what}: {value}")]
    InvalidValue {
        /// What the field represents.
        what: &'static str,
        /// The offending raw value.
        value: i64,
    },
}

impl DecodeError {
    /// Creates an invalid value error.
    pub fn invalid_value(what: &'static str, value: impl Into<i64>) -> Self {
        Self::InvalidValue {
            what,
            value: value.into(),
        }
    }

    /// Creates an unresolved reference error.
    pub fn unknown_reference(kind: &'static str, id: u32) -> Self {
        Self::UnknownReference { kind, id }
    }
}
