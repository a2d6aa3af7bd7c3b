//! Where requests are forwarded to.

/// Path of the streaming endpoint, relative to the backend's API base.
pub const STREAM_PATH: &str = "/chat/stream";

/// Used when neither a full URL nor an API base is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api/chat/stream";

/// Resolve the backend streaming URL.
///
/// An explicit `backend_url` wins. Otherwise [`STREAM_PATH`] is appended to
/// `api_base`, and without either, [`DEFAULT_BACKEND_URL`] is used. Blank
/// values count as unset.
#[must_use]
pub fn backend_url(backend_url: Option<&str>, api_base: Option<&str>) -> String {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(url) = present(backend_url) {
        return url.to_owned();
    }

    match present(api_base) {
        Some(base) => format!("{}{STREAM_PATH}", base.trim_end_matches('/')),
        None => DEFAULT_BACKEND_URL.to_owned(),
    }
}
