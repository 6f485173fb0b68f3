//! Forward record reader with tag peeking.

use crate::error::{DecodeError, DecodeResult};

/// Consumes a record's fields in order.
///
/// Mandatory fields are taken with the `take_*` methods. Optional fields
/// are detected with [`RecordReader::take_optional_tag`], which peeks
/// one byte and consumes it only when it matches the candidate tag.
/// Decoders must check candidate tags in the record's fixed field order.
///
/// After all fields are consumed, [`RecordReader::finish`] rejects any
/// remaining bytes.
#[derive(Debug)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    /// Creates a reader over a complete record body.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Peeks the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn take_unit(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Reads a single byte.
    pub fn take_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.take_unit(1)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn take_u16(&mut self) -> DecodeResult<u16> {
        let b = self.take_unit(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Reads a big-endian `u32`.
    pub fn take_u32(&mut self) -> DecodeResult<u32> {
        let b = self.take_unit(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a big-endian `i32`.
    pub fn take_i32(&mut self) -> DecodeResult<i32> {
        let b = self.take_unit(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a big-endian `i64`.
    pub fn take_i64(&mut self) -> DecodeResult<i64> {
        let b = self.take_unit(8)?;
        Ok(i64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a bool byte, rejecting anything but 0 or 1.
    pub fn take_bool(&mut self) -> DecodeResult<bool> {
        match self.take_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::invalid_value("bool", other)),
        }
    }

    /// Reads a string: `u16` length prefix followed by UTF-8 bytes.
    pub fn take_str(&mut self) -> DecodeResult<String> {
        let len = self.take_u16()? as usize;
        let bytes = self.take_unit(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    /// Consumes the next byte if it equals `tag`.
    ///
    /// Returns whether the optional field introduced by `tag` is
    /// present. On `false` nothing is consumed and the decoder moves on
    /// to the next candidate tag.
    pub fn take_optional_tag(&mut self, tag: u8) -> DecodeResult<bool> {
        if self.peek_u8() == Some(tag) {
            self.pos += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the next byte, which must equal `tag`.
    pub fn take_expected_tag(&mut self, tag: u8) -> DecodeResult<()> {
        let found = self.take_u8()?;
        if found == tag {
            Ok(())
        } else {
            Err(DecodeError::UnexpectedTag {
                expected: tag,
                found,
            })
        }
    }

    /// Asserts that every byte of the record has been consumed.
    pub fn finish(self) -> DecodeResult<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes {
                remaining: self.remaining(),
            })
        }
    }
}
