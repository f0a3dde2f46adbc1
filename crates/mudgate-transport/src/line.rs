//! Newline framing over any `AsyncRead`.

use bytes::BytesMut;
use memchr::memchr;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransportError;

/// Default cap on a single line, in bytes.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Buffers bytes from a reader and hands them out one line at a time.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: BytesMut,
    max_line_len: usize,
}

impl<R> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(DEFAULT_MAX_LINE_LEN),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Reads one line, stripping the trailing `\n` and an optional `\r`.
    ///
    /// Returns:
    /// - `Ok(Some(line))` for a line (may be empty). Invalid UTF-8 is
    ///   replaced rather than rejected.
    /// - `Ok(None)` on clean EOF with nothing buffered.
    ///
    /// A partial line followed by EOF is reported as a receive failure,
    /// and a line longer than the cap as [`TransportError::LineTooLong`].
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            if let Some(i) = memchr(b'\n', &self.buf) {
                if content_len(&self.buf[..i]) > self.max_line_len {
                    return Err(TransportError::LineTooLong(self.max_line_len));
                }
                let raw = self.buf.split_to(i + 1);
                return Ok(Some(decode_line(&raw)));
            }

            if content_len(&self.buf) > self.max_line_len {
                return Err(TransportError::LineTooLong(self.max_line_len));
            }

            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::ReceiveFailed(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "eof while reading line",
                )));
            }
        }
    }
}

/// Length of a line without its `\n`, not counting a trailing `\r`.
///
/// The cap applies to what the caller gets back, so a CRLF line may be
/// one byte longer on the wire than an LF one.
fn content_len(unterminated: &[u8]) -> usize {
    match unterminated.last() {
        Some(b'\r') => unterminated.len() - 1,
        _ => unterminated.len(),
    }
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
