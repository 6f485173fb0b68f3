//! Frame writer.

use crate::error::{FramingError, FramingResult};
use crate::MAX_FRAME_LEN;
use std::io::Write;

/// Writes length-prefixed frames to an underlying stream.
///
/// Each frame is a 4-byte big-endian body length followed by the body.
/// The writer performs no buffering of its own; wrap the stream in a
/// `BufWriter` for bulk writes.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a frame writer over the given stream.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes one frame.
    ///
    /// # Errors
    ///
    /// [`FramingError::InvalidLength`] if the body is empty or exceeds
    /// [`MAX_FRAME_LEN`], [`FramingError::Io`] on a write failure.
    pub fn write_frame(&mut self, body: &[u8]) -> FramingResult<()> {
        if body.is_empty() || body.len() > MAX_FRAME_LEN {
            return Err(FramingError::InvalidLength {
                len: body.len(),
                offset: 0,
            });
        }
        self.inner.write_all(&(body.len() as u32).to_be_bytes())?;
        self.inner.write_all(body)?;
        Ok(())
    }

    /// Flushes the underlying stream.
    pub fn flush(&mut self) -> FramingResult<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
