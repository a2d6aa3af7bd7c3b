//! See [`Turn`].

use std::fmt;

use chrono::{DateTime, Utc};
use rc_stream::Citation;

use crate::{ConversationId, TurnId};

/// One user message and the assistant's reply to it.
///
/// A turn is created when the user submits a message, is mutated only while
/// its reply streams in, and never changes again once its [`TurnStatus`] is
/// terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: TurnId,
    pub conversation_id: ConversationId,
    pub user_content: String,

    /// The reply as it is shown to the user.
    pub assistant_content: String,

    pub status: TurnStatus,

    /// Sources attached to the reply when it was finalized.
    pub citations: Vec<Citation>,

    /// Backend-assigned identifier of the reply, known after finalization.
    pub message_id: Option<String>,

    /// When the user submitted the message.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    #[must_use]
    pub fn new(conversation_id: ConversationId, user_content: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            conversation_id,
            user_content: user_content.into(),
            assistant_content: String::new(),
            status: TurnStatus::Idle,
            citations: vec![],
            message_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Lifecycle of a [`Turn`].
///
/// ```text
/// Idle -> AwaitingFirstChunk -> Streaming -> Finalizing -> Complete
/// ```
///
/// `Cancelled` and `Error` are reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnStatus {
    #[default]
    Idle,
    AwaitingFirstChunk,
    Streaming,
    Finalizing,
    Complete,
    Cancelled,
    Error,
}

impl TurnStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Error)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingFirstChunk => "awaiting_first_chunk",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
