//! Turns a streamed HTTP response body into a sequence of typed
//! [`StreamEvent`]s.
//!
//! The pipeline has two stages:
//!
//! 1. [`FrameCodec`] splits raw bytes into complete `data:` records, no
//!    matter how the bytes were chunked on the wire.
//! 2. [`decode`] parses each record's payload into a [`StreamEvent`].
//!
//! [`events`] wires both stages together and folds transport failures into a
//! single terminal [`StreamEvent::Failed`].

mod codec;
mod error;
pub mod event;
mod reader;

pub use codec::{FrameCodec, FrameError, MAX_FRAME_LENGTH};
pub use error::{DecodeError, TransportError};
pub use event::{Citation, Locator, StreamEvent, decode};
pub use reader::{ByteStream, events, frames};
