/// A failure to reach the streaming endpoint, or to keep reading from it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Request failed (status {code}): {message}")]
    Status { code: u16, message: String },

    #[error("Connection lost while streaming: {0}")]
    Body(String),

    #[error("Frame exceeds {limit} bytes.")]
    FrameTooLong { limit: usize },
}

impl TransportError {
    /// The message carried by the terminal [`StreamEvent::Failed`] event.
    ///
    /// [`StreamEvent::Failed`]: crate::StreamEvent::Failed
    #[must_use]
    pub fn into_message(self) -> String {
        match self {
            // The backend (or the relay) already produced a human readable
            // message, don't wrap it again.
            Self::Status { message, .. } if !message.is_empty() => message,
            error => error.to_string(),
        }
    }
}

/// A single frame that could not be turned into a [`StreamEvent`].
///
/// [`StreamEvent`]: crate::StreamEvent
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload matches no known event: {0}")]
    Shape(String),
}

#[cfg(test)]
impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
