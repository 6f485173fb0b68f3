//! # Tally Codec
//!
//! Tagged binary record primitives for tally ledger files.
//!
//! A record is a 1-byte outer type tag followed by its fields. Mandatory
//! fields appear in a fixed order; each optional field is wrapped in a
//! small context tag and detected by peeking the next byte. The concrete
//! record layouts live in `tally_core`; this crate provides the
//! byte-level building blocks:
//!
//! - [`RecordWriter`] - builds a record **back to front**, so every
//!   length prefix (string lengths, list counts, the outer tag) is
//!   emitted after the data it describes, and one final reversal
//!   produces the forward bytes. No length is ever precomputed.
//! - [`RecordReader`] - consumes fields in order, peeks single bytes to
//!   detect optional-field tags, and rejects unconsumed trailing bytes.
//!
//! All multi-byte integers are big-endian. A string is a `u16` length
//! followed by UTF-8 bytes.
//!
//! ## Example
//!
//! ```rust
//! use tally_codec::{RecordReader, RecordWriter};
//!
//! // Forward layout: tag 0x41, id u32, name str.
//! // Fields are written in reverse: name, id, tag.
//! let mut w = RecordWriter::new();
//! w.put_str("Checking");
//! w.put_u32(7);
//! w.put_u8(0x41);
//! let bytes = w.finish();
//!
//! let mut r = RecordReader::new(&bytes);
//! assert_eq!(r.take_u8().unwrap(), 0x41);
//! assert_eq!(r.take_u32().unwrap(), 7);
//! assert_eq!(r.take_str().unwrap(), "Checking");
//! r.finish().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod reader;
mod writer;

pub use error::{DecodeError, DecodeResult};
pub use reader::RecordReader;
pub use writer::RecordWriter;
