use std::{io, pin::Pin};

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt as _};
use tokio_util::{codec::FramedRead, io::StreamReader, sync::CancellationToken};
use tracing::{debug, trace, warn};

use crate::{
    FrameCodec, StreamEvent, TransportError, codec::FrameError, decode, error::DecodeError,
};

/// A response body, as a stream of byte chunks of arbitrary size.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

impl From<FrameError> for TransportError {
    fn from(error: FrameError) -> Self {
        match error {
            FrameError::Io(error) => Self::Body(error.to_string()),
            FrameError::TooLong { limit } => Self::FrameTooLong { limit },
        }
    }
}

/// Lazily read complete frame payloads from `body`.
///
/// The stream ends when `body` ends, or as soon as `cancel` is triggered. A
/// frame whose read completes after cancellation is discarded, not yielded.
///
/// A transport failure is yielded once, as the last item, after all frames
/// that were fully received before it.
pub fn frames<S>(
    body: S,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<String, TransportError>> + Send
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    stream! {
        let records = FramedRead::new(StreamReader::new(body), FrameCodec::new());
        tokio::pin!(records);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Stream cancelled, no longer reading.");
                    break;
                }
                next = records.next() => next,
            };

            if cancel.is_cancelled() {
                trace!("Discarding frame read after cancellation.");
                break;
            }

            match next {
                Some(Ok(frame)) => yield Ok(frame),
                Some(Err(error)) => {
                    yield Err(error.into());
                    break;
                }
                None => {
                    trace!("Stream ended.");
                    break;
                }
            }
        }
    }
}

/// Lazily read and decode [`StreamEvent`]s from `body`.
///
/// Frames that fail to decode are logged and skipped. A transport failure
/// becomes a single, final [`StreamEvent::Failed`].
pub fn events<S>(body: S, cancel: CancellationToken) -> impl Stream<Item = StreamEvent> + Send
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let frames = frames(body, cancel);

    stream! {
        tokio::pin!(frames);

        while let Some(frame) = frames.next().await {
            let payload = match frame {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(%error, "Transport failed while streaming.");
                    yield StreamEvent::failed(error.into_message());
                    break;
                }
            };

            match decode(&payload) {
                Ok(event) => {
                    trace!(?event, "Decoded frame.");
                    yield event;
                }
                Err(DecodeError::Json(error)) => {
                    warn!(%error, payload, "Dropping frame with invalid JSON.");
                }
                Err(error @ DecodeError::Shape(_)) => {
                    warn!(%error, "Dropping unrecognized frame.");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;
