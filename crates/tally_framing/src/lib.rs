//! # Tally Framing
//!
//! Length-prefixed record framing for tally ledger files.
//!
//! This crate provides the lowest-level I/O abstraction for the ledger
//! file format. A frame on disk is a 4-byte big-endian length followed by
//! exactly that many bytes. Frames are **opaque byte records** - this
//! crate does not interpret their contents.
//!
//! ## Design Principles
//!
//! - The reader buffers physical I/O in fixed-size chunks and reassembles
//!   frames that straddle chunk boundaries transparently
//! - A clean end of stream at a frame boundary is "no more frames"
//! - Any other truncation is a hard framing error, distinct from EOF
//! - The codec crate owns all record interpretation
//!
//! ## Example
//!
//! ```rust
//! use tally_framing::{FrameReader, FrameWriter};
//!
//! let mut buf = Vec::new();
//! {
//!     let mut writer = FrameWriter::new(&mut buf);
//!     writer.write_frame(b"hello").unwrap();
//!     writer.write_frame(b"world").unwrap();
//! }
//!
//! let mut reader = FrameReader::new(buf.as_slice());
//! assert_eq!(reader.read_frame().unwrap().as_deref(), Some(&b"hello"[..]));
//! assert_eq!(reader.read_frame().unwrap().as_deref(), Some(&b"world"[..]));
//! assert!(reader.read_frame().unwrap().is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod writer;

pub use error::{FramingError, FramingResult};
pub use reader::FrameReader;
pub use writer::FrameWriter;

/// Size of the frame length prefix in bytes.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Maximum accepted frame body length.
///
/// A length prefix above this value is treated as a corrupt header rather
/// than an instruction to allocate gigabytes.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;
