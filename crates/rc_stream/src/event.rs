//! See [`StreamEvent`].

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::DecodeError;

/// A typed event decoded from a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of the assistant's reply.
    Delta { text: String },

    /// The reply is complete.
    Done {
        /// Backend-assigned identifier of the finished message, if any.
        message_id: Option<String>,

        /// Sources the reply draws on, in the order they should be listed.
        citations: Vec<Citation>,
    },

    /// The reply failed, either because the backend reported an error or
    /// because the transport broke down.
    Failed { message: String },
}

impl StreamEvent {
    #[must_use]
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    #[must_use]
    pub fn done(citations: Vec<Citation>) -> Self {
        Self::Done {
            message_id: None,
            citations,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// A reference to a source document attached to a finished reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCitation")]
pub struct Citation {
    pub source_id: String,
    pub locator: Option<Locator>,
    pub snippet: Option<String>,
    pub score: Option<f64>,
}

impl Citation {
    #[must_use]
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            locator: None,
            snippet: None,
            score: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.locator = Some(Locator::Page(page));
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Where in the source a citation points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Page(u64),
    Label(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page {page}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCitation {
    #[serde(alias = "id", alias = "sourceId")]
    doc_id: String,
    page: Option<Value>,
    locator: Option<String>,
    snippet: Option<String>,
    score: Option<f64>,
}

impl From<RawCitation> for Citation {
    fn from(raw: RawCitation) -> Self {
        let locator = raw
            .page
            .as_ref()
            .and_then(page_locator)
            .or_else(|| raw.locator.map(Locator::Label));

        Self {
            source_id: raw.doc_id,
            locator,
            snippet: raw.snippet,
            score: raw.score,
        }
    }
}

/// A page number may arrive as any JSON number, or as a label such as "iv".
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn page_locator(page: &Value) -> Option<Locator> {
    match page {
        Value::Number(number) => match number.as_u64() {
            Some(page) => Some(Locator::Page(page)),
            None => match number.as_f64() {
                Some(page) if page >= 0.0 && page.fract() == 0.0 && page <= u64::MAX as f64 => {
                    Some(Locator::Page(page as u64))
                }
                _ => Some(Locator::Label(number.to_string())),
            },
        },
        Value::String(label) if !label.trim().is_empty() => Some(Locator::Label(label.clone())),
        _ => None,
    }
}

/// Decode citations one by one, dropping those that are malformed.
fn decode_citations(raw: Vec<Value>) -> Vec<Citation> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match Citation::deserialize(value) {
            Ok(citation) => Some(citation),
            Err(error) => {
                warn!(index, %error, "Dropping malformed citation.");
                None
            }
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    content: Option<String>,
    done: Option<bool>,
    message_id: Option<String>,
    citations: Option<Vec<Value>>,
    error: Option<ErrorField>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Code(String),
    Detail { message: String },
}

/// Decode the payload of a single frame.
///
/// Decoding is stateless: the result depends on `payload` alone.
pub fn decode(payload: &str) -> Result<StreamEvent, DecodeError> {
    let RawFrame {
        content,
        done,
        message_id,
        citations,
        error,
        message,
    } = serde_json::from_str(payload)?;

    if let Some(error) = error {
        let message = match (message, error) {
            (Some(message), _) => message,
            (None, ErrorField::Code(code)) => code,
            (None, ErrorField::Detail { message }) => message,
        };

        return Ok(StreamEvent::Failed { message });
    }

    if done == Some(true) {
        return Ok(StreamEvent::Done {
            message_id,
            citations: citations.map(decode_citations).unwrap_or_default(),
        });
    }

    match content {
        Some(text) => Ok(StreamEvent::Delta { text }),
        None => Err(DecodeError::Shape(payload.to_owned())),
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
