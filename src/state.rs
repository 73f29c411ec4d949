use std::task::{Context, Poll};

use bytes::Bytes;
use encoding_rs::Encoding;
use futures_util::ready;
use http::header::HeaderMap;

use crate::boundary::{Boundary, BoundaryDetector, Detection, Scan};
use crate::buffer::{BoxStream, StreamBuffer};
use crate::config::Config;
use crate::constants;
use crate::constraints::Constraints;
use crate::content_disposition::ContentDisposition;
use crate::helpers;

#[derive(Debug)]
pub(crate) struct MultipartState<'r> {
    pub(crate) buffer: StreamBuffer<'r>,
    pub(crate) boundary: Option<Boundary>,
    pub(crate) detector: BoundaryDetector,
    pub(crate) encoding: &'static Encoding,
    pub(crate) constraints: Constraints,
    pub(crate) stage: StreamingStage,
    pub(crate) at_stream_start: bool,
    pub(crate) next_field_idx: usize,
    pub(crate) curr_field_name: Option<String>,
    pub(crate) curr_field_size_limit: u64,
    pub(crate) curr_field_size_counter: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    DetectingBoundary,
    FindingFirstBoundary,
    ReadingBoundary,
    DeterminingBoundaryType,
    ReadingTransportPadding,
    ReadingFieldHeaders,
    ReadingFieldData,
    Eof,
}

/// What the engine knows about a field once its headers are read.
pub(crate) struct FieldHead {
    pub(crate) idx: usize,
    pub(crate) headers: HeaderMap,
    pub(crate) content_disposition: ContentDisposition,
}

impl<'r> MultipartState<'r> {
    pub(crate) fn new(stream: BoxStream<'r>, config: Config) -> Self {
        let boundary = config.boundary.as_deref().and_then(Boundary::new);

        let stage = if boundary.is_some() {
            StreamingStage::FindingFirstBoundary
        } else {
            StreamingStage::DetectingBoundary
        };

        MultipartState {
            buffer: StreamBuffer::new(stream, config.buffer_size, config.constraints.size_limit.whole_stream),
            boundary,
            detector: BoundaryDetector::new(config.boundary_scan_limit),
            encoding: config.encoding,
            curr_field_size_limit: config.constraints.size_limit.per_field,
            constraints: config.constraints,
            stage,
            at_stream_start: true,
            next_field_idx: 0,
            curr_field_name: None,
            curr_field_size_counter: 0,
        }
    }

    /// Drives the stream up to the headers of the next field, draining
    /// whatever the previous field left unread.
    ///
    /// Resolves to `None` after the terminal boundary.
    pub(crate) fn poll_next_field(&mut self, cx: &mut Context<'_>) -> Poll<crate::Result<Option<FieldHead>>> {
        loop {
            match self.stage {
                StreamingStage::DetectingBoundary => {
                    let limit = self.detector.limit();

                    match self.detector.detect(&self.buffer.buf) {
                        Detection::Found(token) => {
                            debug!("detected multipart boundary: {:?}", token);
                            self.boundary = Boundary::new(&token);
                            self.stage = StreamingStage::FindingFirstBoundary;
                        }
                        Detection::NotFound => {
                            return Poll::Ready(Err(crate::Error::BoundaryNotFound { limit }));
                        }
                        Detection::NeedMore => {
                            ready!(self
                                .buffer
                                .poll_refill_or(cx, || crate::Error::BoundaryNotFound { limit }))?;
                        }
                    }
                }

                StreamingStage::FindingFirstBoundary => {
                    let boundary = match &self.boundary {
                        Some(boundary) => boundary,
                        None => return Poll::Ready(Err(crate::Error::NoBoundary)),
                    };
                    let dash_boundary = boundary.dash_boundary();

                    // The very first bytes of the stream count as a line start.
                    if self.at_stream_start {
                        match self.buffer.peek(dash_boundary.len()) {
                            Some(head) if head == dash_boundary => {
                                self.stage = StreamingStage::ReadingBoundary;
                                continue;
                            }
                            Some(_) => self.at_stream_start = false,
                            None if dash_boundary.starts_with(&self.buffer.buf) => {
                                ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteStream))?;
                                continue;
                            }
                            None => self.at_stream_start = false,
                        }
                    }

                    match boundary.scanner().scan(&self.buffer.buf) {
                        Scan::Found { delim_start, .. } => {
                            trace!("skipping {} bytes of preamble", delim_start);
                            self.buffer.advance(delim_start + 1);
                            self.stage = StreamingStage::ReadingBoundary;
                        }
                        Scan::Partial { safe } => {
                            self.buffer.advance(safe);
                            ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteStream))?;
                        }
                    }
                }

                StreamingStage::ReadingBoundary => {
                    let boundary = match &self.boundary {
                        Some(boundary) => boundary,
                        None => return Poll::Ready(Err(crate::Error::NoBoundary)),
                    };
                    let dash_boundary = boundary.dash_boundary();

                    match self.buffer.read_exact(dash_boundary.len()) {
                        Some(bytes) if &bytes[..] == dash_boundary => {
                            self.stage = StreamingStage::DeterminingBoundaryType;
                        }
                        Some(_) => return Poll::Ready(Err(crate::Error::MalformedBoundaryLine)),
                        None => {
                            ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteStream))?;
                        }
                    }
                }

                StreamingStage::DeterminingBoundaryType => match self.buffer.peek(constants::BOUNDARY_EXT.len()) {
                    Some(ext) if ext == constants::BOUNDARY_EXT.as_bytes() => {
                        self.buffer.advance(constants::BOUNDARY_EXT.len());
                        self.stage = StreamingStage::Eof;
                        trace!("reached the terminal boundary after {} fields", self.next_field_idx);
                    }
                    Some(_) => self.stage = StreamingStage::ReadingTransportPadding,
                    None => {
                        ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteStream))?;
                    }
                },

                StreamingStage::ReadingTransportPadding => {
                    if self.buffer.skip_boundary_line_end()? {
                        self.stage = StreamingStage::ReadingFieldHeaders;
                    } else {
                        ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteStream))?;
                    }
                }

                StreamingStage::ReadingFieldHeaders => {
                    let header_block = match self.buffer.read_header_block(constants::MAX_HEADER_BYTES)? {
                        Some(block) => block,
                        None => {
                            let nothing_read = self.buffer.buf.is_empty();
                            ready!(self.buffer.poll_refill_or(cx, || {
                                if nothing_read {
                                    crate::Error::IncompleteStream
                                } else {
                                    crate::Error::IncompleteHeaders
                                }
                            }))?;
                            continue;
                        }
                    };

                    let headers = helpers::parse_header_block(&header_block)?;
                    return Poll::Ready(self.start_field(headers).map(Some));
                }

                StreamingStage::ReadingFieldData => {
                    // The previous field was not read to its end.
                    if let Some(_skipped) = ready!(self.poll_field_chunk(cx))? {
                        trace!("skipped {} unread bytes of field {:?}", _skipped.len(), self.curr_field_name);
                    }
                }

                StreamingStage::Eof => return Poll::Ready(Ok(None)),
            }
        }
    }

    fn start_field(&mut self, headers: HeaderMap) -> crate::Result<FieldHead> {
        let content_disposition = ContentDisposition::parse(&headers);
        let field_name = content_disposition.field_name.as_deref();

        let idx = self.next_field_idx;
        self.next_field_idx += 1;

        self.stage = StreamingStage::ReadingFieldData;
        self.curr_field_name = content_disposition.field_name.clone();
        self.curr_field_size_limit = self.constraints.size_limit.extract_size_limit_for(field_name);
        self.curr_field_size_counter = 0;

        if !self.constraints.is_it_allowed(field_name) {
            return Err(crate::Error::UnknownField {
                field_name: content_disposition.field_name,
            });
        }

        debug!(
            "field {} started: name={:?}, file_name={:?}",
            idx, content_disposition.field_name, content_disposition.file_name
        );

        Ok(FieldHead {
            idx,
            headers,
            content_disposition,
        })
    }

    /// Reads the next piece of the current field's data.
    ///
    /// Resolves to `None` once the field's closing boundary has been found.
    pub(crate) fn poll_field_chunk(&mut self, cx: &mut Context<'_>) -> Poll<crate::Result<Option<Bytes>>> {
        loop {
            if self.stage != StreamingStage::ReadingFieldData {
                return Poll::Ready(Ok(None));
            }

            let boundary = match &self.boundary {
                Some(boundary) => boundary,
                None => return Poll::Ready(Err(crate::Error::NoBoundary)),
            };

            match self.buffer.read_field_data(boundary.scanner()) {
                Some((done, bytes)) => {
                    if done {
                        self.stage = StreamingStage::ReadingBoundary;
                    }

                    self.curr_field_size_counter += bytes.len() as u64;

                    if self.curr_field_size_counter > self.curr_field_size_limit {
                        return Poll::Ready(Err(crate::Error::FieldSizeExceeded {
                            limit: self.curr_field_size_limit,
                            field_name: self.curr_field_name.clone(),
                        }));
                    }

                    if !bytes.is_empty() {
                        return Poll::Ready(Ok(Some(bytes)));
                    }
                }
                None => {
                    let field_name = &self.curr_field_name;
                    ready!(self.buffer.poll_refill_or(cx, || crate::Error::IncompleteFieldData {
                        field_name: field_name.clone(),
                    }))?;
                }
            }
        }
    }
}
