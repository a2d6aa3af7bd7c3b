//! Builders for in-memory response bodies.

use std::io;

use bytes::Bytes;
use futures::{StreamExt as _, stream::BoxStream};

/// Encode `payloads` as a streamed response body, one `data:` record each.
#[must_use]
pub fn sse<S: AsRef<str>>(payloads: &[S]) -> String {
    payloads
        .iter()
        .map(|payload| format!("data: {}\n\n", payload.as_ref()))
        .collect()
}

/// A body that yields `parts` as separate reads.
pub fn chunks<I, B>(parts: I) -> BoxStream<'static, io::Result<Bytes>>
where
    I: IntoIterator<Item = B>,
    B: Into<Bytes>,
{
    let parts = parts.into_iter().map(|b| Ok(b.into())).collect::<Vec<_>>();
    futures::stream::iter(parts).boxed()
}

/// A body that yields `body` in reads of at most `size` bytes.
///
/// Splits happen at byte boundaries, so lines and multi-byte characters end
/// up divided across reads.
pub fn chunked(body: impl AsRef<[u8]>, size: usize) -> BoxStream<'static, io::Result<Bytes>> {
    chunks(
        body.as_ref()
            .chunks(size.max(1))
            .map(Bytes::copy_from_slice)
            .collect::<Vec<_>>(),
    )
}

/// A body that yields `parts`, then fails with a connection reset.
pub fn failing_after<I, B>(parts: I, reason: &str) -> BoxStream<'static, io::Result<Bytes>>
where
    I: IntoIterator<Item = B>,
    B: Into<Bytes>,
{
    let error = io::Error::new(io::ErrorKind::ConnectionReset, reason.to_owned());
    chunks(parts).chain(futures::stream::iter([Err(error)])).boxed()
}
