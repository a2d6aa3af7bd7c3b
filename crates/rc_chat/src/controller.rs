//! See [`ChatController`].

use std::{collections::HashMap, sync::Arc};

use futures::StreamExt as _;
use parking_lot::Mutex;
use rc_conversation::{ConversationId, Turn, TurnHistory, TurnId};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{Applied, ChatRequest, Error, Transport, TurnMachine, error::Result};

type LiveTurns = Arc<Mutex<HashMap<ConversationId, TurnHandle>>>;

/// Starts turns and keeps track of the ones that are still streaming.
///
/// At most one turn per conversation is live at any time. A finished turn
/// moves to the [`TurnHistory`] exactly once, whatever way it finished.
#[derive(Debug, Clone)]
pub struct ChatController {
    transport: Arc<dyn Transport>,
    placeholder: String,
    live: LiveTurns,
    history: TurnHistory,
}

impl ChatController {
    pub fn new(transport: impl Transport + 'static, placeholder: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(transport),
            placeholder: placeholder.into(),
            live: Arc::default(),
            history: TurnHistory::new(),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: TurnHistory) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn history(&self) -> &TurnHistory {
        &self.history
    }

    /// The live turn of a conversation, if one is streaming.
    #[must_use]
    pub fn live(&self, conversation_id: &ConversationId) -> Option<TurnHandle> {
        self.live.lock().get(conversation_id).cloned()
    }

    /// Start a new turn for `request`.
    ///
    /// Fails without touching the network if the conversation already has a
    /// live turn. Requests without a conversation ID start a new
    /// conversation.
    ///
    /// Nothing is sent until [`PendingTurn::run`] is awaited.
    pub fn submit(&self, request: ChatRequest) -> Result<PendingTurn> {
        let conversation_id = request.conversation_id.clone().unwrap_or_default();

        let mut live = self.live.lock();
        if live.contains_key(&conversation_id) {
            debug!(conversation = %conversation_id, "Rejecting message, turn in progress.");
            return Err(Error::TurnInProgress(conversation_id));
        }

        let mut machine = TurnMachine::new(
            Turn::new(conversation_id.clone(), request.message.clone()),
            self.placeholder.clone(),
        );
        machine.submit()?;

        let snapshot = machine.snapshot();
        let handle = TurnHandle {
            id: snapshot.id,
            conversation_id: conversation_id.clone(),
            shared: Arc::new(Shared {
                machine: Mutex::new(machine),
                updates: watch::Sender::new(snapshot),
                cancel: CancellationToken::new(),
            }),
        };

        info!(turn = %handle.id, conversation = %conversation_id, "Turn submitted.");
        live.insert(conversation_id.clone(), handle.clone());

        Ok(PendingTurn {
            request,
            handle,
            transport: Arc::clone(&self.transport),
            history: self.history.clone(),
            slot: LiveSlot {
                live: Arc::clone(&self.live),
                conversation_id,
            },
        })
    }

    /// Cancel the live turn of a conversation.
    ///
    /// Returns `false` if there was nothing to cancel.
    pub fn cancel(&self, conversation_id: &ConversationId) -> bool {
        self.live(conversation_id).is_some_and(|handle| handle.cancel())
    }

    /// Delete a finished turn. See [`TurnHistory::delete`].
    pub fn delete(&self, id: TurnId) -> Result<()> {
        self.history.delete(id).map_err(Into::into)
    }

    /// Restore the last deleted turn. See [`TurnHistory::undo`].
    pub fn undo(&self) -> Option<TurnId> {
        self.history.undo()
    }
}

/// A submitted turn that has not been sent yet.
///
/// Dropping it without running it, or dropping the future returned by
/// [`PendingTurn::run`], frees the conversation for the next message.
#[derive(Debug)]
pub struct PendingTurn {
    request: ChatRequest,
    handle: TurnHandle,
    transport: Arc<dyn Transport>,
    history: TurnHistory,
    slot: LiveSlot,
}

impl PendingTurn {
    #[must_use]
    pub fn handle(&self) -> TurnHandle {
        self.handle.clone()
    }

    /// Send the request and stream the reply into the turn.
    ///
    /// Resolves once the turn has reached a terminal status, with the turn
    /// as it was added to the history.
    pub async fn run(self) -> Turn {
        let Self {
            request,
            handle,
            transport,
            history,
            slot,
        } = self;
        let shared = &handle.shared;

        let body = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => None,
            body = transport.open(&request) => Some(body),
        };

        match body {
            None => trace!(turn = %handle.id, "Cancelled before the stream was opened."),
            Some(Err(error)) => {
                warn!(turn = %handle.id, %error, "Failed to open stream.");
                shared.update(|machine| machine.fail(&error.into_message()));
            }
            Some(Ok(body)) => {
                let events = rc_stream::events(body, shared.cancel.clone());
                tokio::pin!(events);

                while let Some(event) = events.next().await {
                    let applied = shared.update(|machine| machine.apply(event));
                    if matches!(applied, Applied::Finished(_)) {
                        break;
                    }
                }

                if shared.cancel.is_cancelled() {
                    shared.update(TurnMachine::cancel);
                } else {
                    shared.update(TurnMachine::end_of_stream);
                }
            }
        }

        let turn = shared.machine.lock().snapshot();
        info!(turn = %turn.id, status = %turn.status, "Turn finished.");

        history.push(turn.clone());
        drop(slot);

        turn
    }
}

/// A view on a live turn, used to follow and cancel it.
#[derive(Debug, Clone)]
pub struct TurnHandle {
    id: TurnId,
    conversation_id: ConversationId,
    shared: Arc<Shared>,
}

impl TurnHandle {
    #[must_use]
    pub fn id(&self) -> TurnId {
        self.id
    }

    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// The turn as it currently looks.
    #[must_use]
    pub fn snapshot(&self) -> Turn {
        self.shared.machine.lock().snapshot()
    }

    /// Receive a fresh snapshot after every change to the turn.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Turn> {
        self.shared.updates.subscribe()
    }

    /// Stop the turn, keeping the content shown at this moment.
    ///
    /// Returns `false` if the turn had already finished.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.update(TurnMachine::cancel);
        self.shared.cancel.cancel();

        if cancelled {
            debug!(turn = %self.id, "Turn cancelled.");
        }
        cancelled
    }
}

#[derive(Debug)]
struct Shared {
    machine: Mutex<TurnMachine>,
    updates: watch::Sender<Turn>,
    cancel: CancellationToken,
}

impl Shared {
    /// Apply `f` to the machine and publish the new state.
    ///
    /// Publishing happens under the machine lock, so subscribers never see
    /// snapshots out of order.
    fn update<T>(&self, f: impl FnOnce(&mut TurnMachine) -> T) -> T {
        let mut machine = self.machine.lock();
        let result = f(&mut machine);

        self.updates.send_if_modified(|turn| {
            let current = machine.snapshot();
            let modified = *turn != current;
            *turn = current;
            modified
        });

        result
    }
}

/// Releases a conversation's live slot when dropped.
#[derive(Debug)]
struct LiveSlot {
    live: LiveTurns,
    conversation_id: ConversationId,
}

impl Drop for LiveSlot {
    fn drop(&mut self) {
        let Some(handle) = self.live.lock().remove(&self.conversation_id) else {
            return;
        };

        // A turn whose driver went away before it finished.
        if handle.cancel() {
            warn!(turn = %handle.id, "Turn abandoned before it finished.");
        }
        trace!(turn = %handle.id, "Released live slot.");
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
