//! Forwarding a chat request to the backend, and its streamed reply back.

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, PROXY_AUTHENTICATE,
            PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
        },
    },
    response::Response,
};
use bytes::Bytes;
use tracing::{debug, error, info};

use crate::{RelayError, RelayState};

/// Disables response buffering in reverse proxies such as nginx.
static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Headers that describe a single connection, and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// `POST /api/chat/stream`
///
/// The request body is forwarded as received, byte for byte. The backend's
/// status and body are passed through as they arrive.
pub async fn stream_chat(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let url = state.backend_url();
    info!(url, bytes = body.len(), "Forwarding chat request.");

    let content_type = headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static("application/json"));

    let mut request = state
        .client()
        .post(url)
        .header(CONTENT_TYPE, content_type)
        .body(body);
    if let Some(accept) = headers.get(ACCEPT) {
        request = request.header(ACCEPT, accept.clone());
    }

    let backend = request.send().await.map_err(|error| {
        error!(url, %error, "Backend is unreachable.");
        RelayError::BackendUnreachable {
            url: url.to_owned(),
            reason: error.to_string(),
        }
    })?;

    let status = backend.status();
    info!(url, status = status.as_u16(), "Backend responded.");

    let headers = response_headers(backend.headers());
    let mut response = Response::new(Body::from_stream(backend.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(response)
}

/// The backend's response headers, adjusted for an open-ended stream.
fn response_headers(backend: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(backend.len() + 2);
    for (name, value) in backend {
        if *name == CONTENT_LENGTH || HOP_BY_HOP.contains(name) {
            debug!(header = %name, "Dropping backend header.");
            continue;
        }

        headers.append(name.clone(), value.clone());
    }

    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    headers.insert(&X_ACCEL_BUFFERING, HeaderValue::from_static("no"));
    headers
}
