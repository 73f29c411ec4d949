use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes, BytesMut};
use futures_util::ready;
use futures_util::stream::Stream;

use crate::boundary::{BoundaryScanner, Scan};
use crate::constants;

pub(crate) type BoxStream<'r> = Pin<Box<dyn Stream<Item = Result<Bytes, crate::Error>> + Send + 'r>>;

/// Working buffer over the source stream.
///
/// Every refill appends at most `buffer_size` bytes. Chunks bigger than that
/// wait in `pending` until they are asked for.
pub(crate) struct StreamBuffer<'r> {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    pending: Bytes,
    header_scan_pos: usize,
    buffer_size: usize,
    stream: BoxStream<'r>,
    whole_stream_size_limit: u64,
    stream_size_counter: u64,
}

impl<'r> StreamBuffer<'r> {
    pub fn new(stream: BoxStream<'r>, buffer_size: usize, whole_stream_size_limit: u64) -> Self {
        StreamBuffer {
            eof: false,
            buf: BytesMut::new(),
            pending: Bytes::new(),
            header_scan_pos: 0,
            buffer_size: buffer_size.max(1),
            stream,
            whole_stream_size_limit,
            stream_size_counter: 0,
        }
    }

    /// Appends the next piece of the source to the buffer.
    ///
    /// Resolves to `false` once the source is exhausted and nothing is left to
    /// append.
    pub fn poll_refill(&mut self, cx: &mut Context<'_>) -> Poll<crate::Result<bool>> {
        loop {
            if !self.pending.is_empty() {
                let size = self.pending.len().min(self.buffer_size);
                let chunk = self.pending.split_to(size);
                self.buf.extend_from_slice(&chunk);
                return Poll::Ready(Ok(true));
            }

            if self.eof {
                return Poll::Ready(Ok(false));
            }

            match ready!(self.stream.as_mut().poll_next(cx)) {
                Some(Ok(data)) => {
                    self.stream_size_counter += data.len() as u64;

                    if self.stream_size_counter > self.whole_stream_size_limit {
                        return Poll::Ready(Err(crate::Error::StreamSizeExceeded {
                            limit: self.whole_stream_size_limit,
                        }));
                    }

                    self.pending = data;
                }
                Some(Err(err)) => return Poll::Ready(Err(err)),
                None => self.eof = true,
            }
        }
    }

    /// Like [`poll_refill`](Self::poll_refill), but an exhausted source is
    /// reported as the error built by `on_eof`.
    pub fn poll_refill_or<F>(&mut self, cx: &mut Context<'_>, on_eof: F) -> Poll<crate::Result<()>>
    where
        F: FnOnce() -> crate::Error,
    {
        if ready!(self.poll_refill(cx))? {
            Poll::Ready(Ok(()))
        } else {
            Poll::Ready(Err(on_eof()))
        }
    }

    pub fn peek(&self, size: usize) -> Option<&[u8]> {
        self.buf.get(..size)
    }

    pub fn advance(&mut self, size: usize) {
        self.buf.advance(size);
    }

    pub fn read_exact(&mut self, size: usize) -> Option<Bytes> {
        if size <= self.buf.len() {
            Some(self.buf.split_to(size).freeze())
        } else {
            None
        }
    }

    /// Skips transport padding and the line break after a boundary.
    ///
    /// Returns `Ok(false)` when the line break has not arrived yet.
    pub fn skip_boundary_line_end(&mut self) -> crate::Result<bool> {
        let mut idx = 0;
        while idx < self.buf.len() && constants::is_transport_padding(self.buf[idx]) {
            idx += 1;
        }

        match &self.buf[idx..] {
            [] | [constants::CR] => Ok(false),
            [constants::LF, ..] => {
                self.buf.advance(idx + 1);
                Ok(true)
            }
            [constants::CR, constants::LF, ..] => {
                self.buf.advance(idx + 2);
                Ok(true)
            }
            _ => Err(crate::Error::MalformedBoundaryLine),
        }
    }

    /// Reads a header block up to and including the first blank line.
    ///
    /// Lines may end with LF or CRLF, and a line holding only whitespace
    /// counts as blank. Complete lines seen by an earlier call are not
    /// scanned again.
    pub fn read_header_block(&mut self, max_size: usize) -> crate::Result<Option<Bytes>> {
        let mut line_start = self.header_scan_pos;
        let mut block_end = None;

        for line_end in memchr::memchr_iter(constants::LF, &self.buf[line_start..]) {
            let line_end = self.header_scan_pos + line_end;
            let line = &self.buf[line_start..line_end];
            line_start = line_end + 1;

            if line.iter().all(u8::is_ascii_whitespace) {
                block_end = Some(line_start);
                break;
            }
        }

        match block_end {
            Some(end) if end <= max_size => {
                self.header_scan_pos = 0;
                Ok(Some(self.buf.split_to(end).freeze()))
            }
            None if self.buf.len() <= max_size => {
                self.header_scan_pos = line_start;
                Ok(None)
            }
            _ => {
                self.header_scan_pos = 0;
                Err(crate::Error::HeadersSizeExceeded { limit: max_size })
            }
        }
    }

    /// Reads the next piece of field data.
    ///
    /// Returns `Some((true, bytes))` with the last piece once the delimiter is
    /// found; the line break in front of the delimiter is dropped and the
    /// buffer is left at `--boundary`. Returns `None` when nothing can be
    /// released until more bytes arrive.
    pub fn read_field_data(&mut self, scanner: &BoundaryScanner) -> Option<(bool, Bytes)> {
        match scanner.scan(&self.buf) {
            Scan::Found { data_end, delim_start } => {
                let bytes = self.buf.split_to(data_end).freeze();

                // discard the line break.
                self.buf.advance(delim_start + 1 - data_end);

                Some((true, bytes))
            }
            Scan::Partial { safe: 0 } => None,
            Scan::Partial { safe } => Some((false, self.buf.split_to(safe).freeze())),
        }
    }
}

impl fmt::Debug for StreamBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBuffer")
            .field("eof", &self.eof)
            .field("buffered", &self.buf.len())
            .field("pending", &self.pending.len())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
