//! Reply framing.
//!
//! TCP delivers bytes, not lines: one read may carry half a line or several
//! lines at once. [`ReplyBuffer`] keeps the bytes that have not yet formed a
//! complete CRLF-terminated line and hands out complete lines in order.

use bytes::{Buf, BytesMut};

use crate::error::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Maximum reply line length to prevent memory exhaustion.
///
/// RFC 5321 limits reply lines to 512 octets; relays in the wild exceed
/// that, so the bound here is generous.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Standing receive buffer that splits raw bytes into reply lines.
#[derive(Debug)]
pub struct ReplyBuffer {
    buf: BytesMut,
}

impl Default for ReplyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Appends bytes received from the transport.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Splits off the next complete line, without its CRLF.
    ///
    /// Returns `Ok(None)` when only a partial line (or nothing) is buffered;
    /// the partial fragment stays in place for the next read.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffered partial line exceeds
    /// [`MAX_LINE_LENGTH`].
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let Some(pos) = find_crlf(&self.buf) else {
            if self.buf.len() > MAX_LINE_LENGTH {
                return Err(Error::LineTooLong(MAX_LINE_LENGTH));
            }
            return Ok(None);
        };

        let line = self.buf.split_to(pos);
        self.buf.advance(2);
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Number of buffered bytes not yet returned as a line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Read target for the transport, with room for at least one chunk.
    pub fn read_target(&mut self) -> &mut BytesMut {
        self.buf.reserve(DEFAULT_BUFFER_SIZE);
        &mut self.buf
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
