//! Opening a chat stream.

use std::{fmt, io};

use async_trait::async_trait;
use futures::TryStreamExt as _;
use rc_conversation::ConversationId;
use rc_stream::{ByteStream, StreamEvent, TransportError};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

/// The body of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,

    /// Continue an existing conversation. A new one is started if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Restrict retrieval to a single document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            model: None,
            document_id: None,
        }
    }

    #[must_use]
    pub fn with_conversation(mut self, id: impl Into<ConversationId>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_document(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }
}

/// Something that can open a streamed reply for a [`ChatRequest`].
#[async_trait]
pub trait Transport: fmt::Debug + Send + Sync {
    /// Send `request` and return the raw response body.
    ///
    /// Only returns once the response status is known. A non-success status
    /// is an error, carrying the message from the error payload when the
    /// body has one.
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

/// A [`Transport`] that POSTs the request as JSON to a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        trace!(url = self.url, "Opening chat stream.");

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .json(request)
            .send()
            .await
            .map_err(|error| TransportError::Connect {
                url: self.url.clone(),
                reason: error.to_string(),
            })?;

        let status = response.status();
        trace!(status = status.as_u16(), "Received response headers.");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body, "Chat request failed.");

            let message = match rc_stream::decode(&body) {
                Ok(StreamEvent::Failed { message }) => message,
                _ => status.to_string(),
            };

            return Err(TransportError::Status {
                code: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(response.bytes_stream().map_err(io::Error::other)))
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
