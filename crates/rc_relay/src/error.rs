use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A failure to forward a request.
///
/// Always rendered as a JSON body, so clients handle it like any other
/// error payload.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Backend at {url} is unreachable: {reason}")]
    BackendUnreachable { url: String, reason: String },
}

impl RelayError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BackendUnreachable { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BackendUnreachable { .. } => "backend_unreachable",
        }
    }

    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::BackendUnreachable { .. } => {
                "Check that the backend is running, or point the relay elsewhere with \
                 RC_BACKEND_URL or RC_API_BASE."
            }
        }
    }
}

/// Body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub suggestion: &'static str,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
            suggestion: self.suggestion(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
