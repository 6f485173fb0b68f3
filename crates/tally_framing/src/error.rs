//! Error types for framing operations.

use std::io;
use thiserror::Error;

/// Result type for framing operations.
pub type FramingResult<T> = Result<T, FramingError>;

/// Errors that can occur while reading or writing frames.
#[derive(Debug, Error)]
pub enum FramingError {
    /// An I/O error occurred on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended in the middle of a frame.
    ///
    /// A clean end of stream at a frame boundary is not an error; this
    /// variant means a length prefix or frame body was cut short.
    #[error("stream truncated mid-frame: needed {needed} more bytes at offset {offset}")]
    Truncated {
        /// Number of bytes still required to complete the frame.
        needed: usize,
        /// Stream offset where the incomplete frame started.
        offset: u64,
    },

    /// The length prefix is zero or exceeds the sanity cap.
    #[error("invalid frame length {len} at offset {offset}")]
    InvalidLength {
        /// The declared frame body length.
        len: usize,
        /// Stream offset of the length prefix.
        offset: u64,
    },
}
