//! Chunk-buffered frame reader.

use crate::error::{FramingError, FramingResult};
use crate::{LEN_PREFIX_SIZE, MAX_FRAME_LEN};
use std::io::Read;

/// Physical read chunk size.
///
/// Frames are reassembled from fixed-size reads, so a frame may span any
/// number of chunks and a chunk may hold any number of frames.
const CHUNK_SIZE: usize = 8 * 1024;

/// A frame reader over an arbitrary byte stream.
///
/// Pulls physical I/O in fixed-size chunks and yields whole frames
/// regardless of where chunk boundaries fall.
///
/// # End of Stream
///
/// [`FrameReader::read_frame`] returns `Ok(None)` only when the stream
/// ends exactly at a frame boundary. A partial length prefix or a body
/// shorter than its declared length is [`FramingError::Truncated`].
pub struct FrameReader<R> {
    inner: R,
    /// Chunk buffer. `buf[pos..len]` holds unconsumed bytes.
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    /// Stream offset of `buf[pos]`.
    offset: u64,
    /// Set once the underlying stream reports EOF.
    eof: bool,
}

impl<R: Read> FrameReader<R> {
    /// Creates a frame reader over the given stream.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; CHUNK_SIZE],
            pos: 0,
            len: 0,
            offset: 0,
            eof: false,
        }
    }

    /// Reads the next frame body.
    ///
    /// Returns `Ok(Some(body))` for a complete frame, `Ok(None)` at a
    /// clean end of stream.
    ///
    /// # Errors
    ///
    /// [`FramingError::Truncated`] if the stream ends mid-frame,
    /// [`FramingError::InvalidLength`] for a zero or oversized length
    /// prefix, [`FramingError::Io`] on a read failure.
    pub fn read_frame(&mut self) -> FramingResult<Option<Vec<u8>>> {
        let header_offset = self.offset;

        let mut prefix = [0u8; LEN_PREFIX_SIZE];
        match self.fill_exact(&mut prefix)? {
            0 => return Ok(None),
            LEN_PREFIX_SIZE => {}
            got => {
                return Err(FramingError::Truncated {
                    needed: LEN_PREFIX_SIZE - got,
                    offset: header_offset,
                })
            }
        }

        let body_len = u32::from_be_bytes(prefix) as usize;
        if body_len == 0 || body_len > MAX_FRAME_LEN {
            return Err(FramingError::InvalidLength {
                len: body_len,
                offset: header_offset,
            });
        }

        let mut body = vec![0u8; body_len];
        let got = self.fill_exact(&mut body)?;
        if got < body_len {
            return Err(FramingError::Truncated {
                needed: body_len - got,
                offset: header_offset,
            });
        }

        Ok(Some(body))
    }

    /// Copies bytes from the chunk buffer into `out`, refilling the
    /// buffer from the stream as needed. Returns the number of bytes
    /// actually copied; a short count means EOF was reached first.
    fn fill_exact(&mut self, out: &mut [u8]) -> FramingResult<usize> {
        let mut copied = 0;
        while copied < out.len() {
            if self.pos == self.len {
                if !self.refill()? {
                    break;
                }
            }
            let available = self.len - self.pos;
            let take = available.min(out.len() - copied);
            out[copied..copied + take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
            self.pos += take;
            self.offset += take as u64;
            copied += take;
        }
        Ok(copied)
    }

    /// Reads the next chunk from the stream. Returns `false` at EOF.
    fn refill(&mut self) -> FramingResult<bool> {
        if self.eof {
            return Ok(false);
        }
        self.pos = 0;
        self.len = 0;
        loop {
            match self.inner.read(&mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.len = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
