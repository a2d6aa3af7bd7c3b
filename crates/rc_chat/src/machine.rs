//! See [`TurnMachine`].

use rc_conversation::{Turn, TurnStatus};
use rc_stream::{Citation, StreamEvent};
use tracing::{debug, trace, warn};

use crate::{Error, assembler::Assembler, error::Result};

/// Shown when a stream ends before any content arrived.
const EMPTY_RESPONSE: &str = "The response ended before any content was received.";

/// Outcome of feeding a single [`StreamEvent`] to a [`TurnMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The visible content changed.
    Updated,

    /// The turn reached a terminal status.
    Finished(TurnStatus),

    /// The event had no effect, because the turn had already finished.
    Ignored,
}

/// Drives a single [`Turn`] through its lifecycle.
///
/// Every state change goes through the machine, so a turn that has reached
/// a terminal status is never modified again, no matter what the stream
/// still delivers.
#[derive(Debug)]
pub struct TurnMachine {
    turn: Turn,
    assembler: Assembler,
    placeholder: String,
}

impl TurnMachine {
    #[must_use]
    pub fn new(turn: Turn, placeholder: impl Into<String>) -> Self {
        let mut assembler = Assembler::new();
        assembler.replace(turn.assistant_content.clone());

        Self {
            turn,
            assembler,
            placeholder: placeholder.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> TurnStatus {
        self.turn.status
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.turn.is_terminal()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        self.assembler.content()
    }

    /// The turn as it currently looks to the user.
    #[must_use]
    pub fn snapshot(&self) -> Turn {
        let mut turn = self.turn.clone();
        self.assembler.content().clone_into(&mut turn.assistant_content);
        turn
    }

    #[must_use]
    pub fn into_turn(self) -> Turn {
        let mut turn = self.turn;
        turn.assistant_content = self.assembler.into_content();
        turn
    }

    /// Mark the turn as sent and show the placeholder.
    pub fn submit(&mut self) -> Result<()> {
        if self.turn.status != TurnStatus::Idle {
            return Err(Error::InvalidTransition {
                action: "submit",
                status: self.turn.status,
            });
        }

        self.assembler.show_placeholder(&self.placeholder);
        self.set_status(TurnStatus::AwaitingFirstChunk);
        Ok(())
    }

    pub fn apply(&mut self, event: StreamEvent) -> Applied {
        let status = self.turn.status;
        if status.is_terminal() {
            trace!(turn = %self.turn.id, %status, ?event, "Ignoring event for finished turn.");
            return Applied::Ignored;
        }

        match (status, event) {
            (TurnStatus::Idle, event) => {
                warn!(turn = %self.turn.id, ?event, "Ignoring event for turn that was never submitted.");
                Applied::Ignored
            }
            (_, StreamEvent::Delta { text }) => {
                self.assembler.push(&text);
                if status == TurnStatus::AwaitingFirstChunk {
                    self.set_status(TurnStatus::Streaming);
                }
                Applied::Updated
            }
            (_, StreamEvent::Done {
                message_id,
                citations,
            }) => {
                self.finalize(message_id, citations);
                Applied::Finished(TurnStatus::Complete)
            }
            (_, StreamEvent::Failed { message }) => {
                self.fail(&message);
                Applied::Finished(TurnStatus::Error)
            }
        }
    }

    /// Settle a turn whose stream ended without a terminal event.
    ///
    /// A reply that produced content is kept as it is. A reply without any
    /// content is an error.
    pub fn end_of_stream(&mut self) -> Applied {
        match self.turn.status {
            status if status.is_terminal() => Applied::Ignored,
            TurnStatus::Streaming | TurnStatus::Finalizing => {
                warn!(turn = %self.turn.id, "Stream ended without completion, keeping partial reply.");
                self.finalize(None, vec![]);
                Applied::Finished(TurnStatus::Complete)
            }
            _ => {
                self.fail(EMPTY_RESPONSE);
                Applied::Finished(TurnStatus::Error)
            }
        }
    }

    /// Stop the turn, keeping whatever reply content is visible right now.
    ///
    /// A turn cancelled before its first fragment ends up without content,
    /// the placeholder is not kept.
    ///
    /// Returns `false` if the turn had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }

        if self.turn.status == TurnStatus::AwaitingFirstChunk {
            self.assembler.replace(String::new());
        }

        self.set_status(TurnStatus::Cancelled);
        true
    }

    /// Replace the visible content with a short error message.
    ///
    /// Returns `false` if the turn had already finished.
    pub fn fail(&mut self, message: &str) -> bool {
        if self.is_terminal() {
            return false;
        }

        warn!(turn = %self.turn.id, message, "Turn failed.");
        self.assembler.replace(error_message(message));
        self.set_status(TurnStatus::Error);
        true
    }

    fn finalize(&mut self, message_id: Option<String>, citations: Vec<Citation>) {
        self.set_status(TurnStatus::Finalizing);

        self.assembler.finalize(&citations);
        self.turn.citations = citations;
        self.turn.message_id = message_id;

        self.set_status(TurnStatus::Complete);
    }

    fn set_status(&mut self, status: TurnStatus) {
        debug!(turn = %self.turn.id, from = %self.turn.status, to = %status, "Turn status changed.");
        self.turn.status = status;
    }
}

fn error_message(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return "Error: something went wrong.".to_owned();
    }

    format!("Error: {message}")
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
