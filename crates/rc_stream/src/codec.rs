use std::{borrow::Cow, io};

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

/// The largest record the codec buffers before giving up on the stream.
pub const MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

/// Marker prefixing every payload line of a record.
const DATA_FIELD: &str = "data:";

/// Sentinel some backends send as their last payload.
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Frame exceeds {limit} bytes.")]
    TooLong { limit: usize },
}

/// Splits a byte stream into the payloads of complete `data:` records.
///
/// A record is one or more lines terminated by a blank line. Bytes are kept
/// in the read buffer until the blank line arrives, so neither a line nor a
/// multi-byte character split across two reads is ever decoded early.
///
/// The payload of a record is the value of its `data:` lines, joined with
/// `\n`. Records without `data:` lines (comments, keep-alives) produce
/// nothing.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    /// The buffer index from which to resume searching for a newline.
    next_index: usize,

    /// The buffer index at which the line currently being read starts.
    ///
    /// Everything before it consists of complete, non-blank lines belonging
    /// to the record being assembled.
    line_start: usize,

    max_length: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_length(MAX_FRAME_LENGTH)
    }

    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            line_start: 0,
            max_length,
        }
    }

    fn reset(&mut self) {
        self.next_index = 0;
        self.line_start = 0;
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = buf.len();
                if buf.len() > self.max_length {
                    return Err(FrameError::TooLong {
                        limit: self.max_length,
                    });
                }

                return Ok(None);
            };

            let newline = self.next_index + offset;
            let is_blank = matches!(&buf[self.line_start..newline], [] | [b'\r']);
            self.next_index = newline + 1;

            if !is_blank {
                self.line_start = self.next_index;
                continue;
            }

            let record = buf.split_to(self.next_index);
            self.reset();

            if let Some(payload) = payload(&record) {
                return Ok(Some(payload));
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload) = self.decode(buf)? {
            return Ok(Some(payload));
        }

        if buf.is_empty() {
            return Ok(None);
        }

        // The stream ended without a closing blank line. Complete lines still
        // form a record, a trailing partial line does not.
        let record = buf.split_to(self.line_start);
        if !buf.is_empty() {
            debug!(bytes = buf.len(), "Discarding partial line at end of stream.");
            buf.clear();
        }

        self.reset();
        Ok(payload(&record))
    }
}

/// Extract the joined `data:` value of a single record.
fn payload(record: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(record);
    if let Cow::Owned(_) = text {
        warn!(bytes = record.len(), "Record contains invalid UTF-8, replaced lossily.");
    }

    let mut data: Option<String> = None;
    for line in text.lines() {
        let Some(value) = line.strip_prefix(DATA_FIELD) else {
            if !line.is_empty() && !line.starts_with(':') {
                trace!(line, "Ignoring non-data field.");
            }

            continue;
        };

        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => data = Some(value.to_owned()),
        }
    }

    data.filter(|data| {
        let done = data.trim() == DONE_SENTINEL;
        if done {
            trace!("Received end-of-stream sentinel.");
        }

        !done
    })
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
