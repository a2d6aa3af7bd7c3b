//! See [`TurnHistory`].

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{ConversationId, Error, Turn, TurnId, error::Result};

/// How long a deleted turn can be restored with [`TurnHistory::undo`].
pub const UNDO_WINDOW: Duration = Duration::from_secs(10);

/// Finished turns, in chronological order, with single-level undo for
/// deletions.
///
/// A deleted turn is parked in a single "last deleted" slot for
/// [`UNDO_WINDOW`], after which it is dropped for good. Deleting another turn
/// while the slot is occupied drops the previous occupant immediately.
///
/// The history is a cheap handle; clones share the same turns.
#[derive(Debug, Clone, Default)]
pub struct TurnHistory {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    /// Visible turns, ordered by [`Turn::created_at`].
    turns: Vec<Turn>,

    /// The last deleted turn, if it can still be restored.
    deleted: Option<Deleted>,

    /// Incremented on every deletion, so a purge timer can tell whether the
    /// slot still holds the turn it was armed for.
    generation: u64,
}

#[derive(Debug)]
struct Deleted {
    turn: Turn,
    generation: u64,
    purge: CancellationToken,
}

impl TurnHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finished turn.
    pub fn push(&self, turn: Turn) {
        let mut state = self.state.lock();
        let index = state.insertion_index(&turn);
        trace!(turn = %turn.id, index, "Adding turn to history.");

        state.turns.insert(index, turn);
    }

    /// All visible turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> Vec<Turn> {
        self.state.lock().turns.clone()
    }

    /// The visible turns of a single conversation, oldest first.
    #[must_use]
    pub fn conversation(&self, id: &ConversationId) -> Vec<Turn> {
        self.state
            .lock()
            .turns
            .iter()
            .filter(|turn| &turn.conversation_id == id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: TurnId) -> Option<Turn> {
        self.state.lock().turns.iter().find(|t| t.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().turns.is_empty()
    }

    /// The turn that [`TurnHistory::undo`] would restore, if any.
    #[must_use]
    pub fn last_deleted(&self) -> Option<Turn> {
        self.state
            .lock()
            .deleted
            .as_ref()
            .map(|deleted| deleted.turn.clone())
    }

    /// Remove a turn, keeping it restorable for [`UNDO_WINDOW`].
    ///
    /// The purge timer runs on the current Tokio runtime. Outside of a
    /// runtime nothing is deleted and [`Error::NoRuntime`] is returned.
    pub fn delete(&self, id: TurnId) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let mut state = self.state.lock();

        let index = state
            .turns
            .iter()
            .position(|turn| turn.id == id)
            .ok_or(Error::UnknownTurn(id))?;

        let turn = state.turns.remove(index);

        if let Some(previous) = state.deleted.take() {
            debug!(turn = %previous.turn.id, "Evicting previously deleted turn.");
            previous.purge.cancel();
        }

        state.generation += 1;
        let generation = state.generation;
        let purge = CancellationToken::new();

        debug!(turn = %id, window = ?UNDO_WINDOW, "Turn deleted, undo available.");
        state.deleted = Some(Deleted {
            turn,
            generation,
            purge: purge.clone(),
        });
        drop(state);

        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            tokio::select! {
                () = purge.cancelled() => {}
                () = tokio::time::sleep(UNDO_WINDOW) => {
                    let mut state = state.lock();
                    if state.deleted.as_ref().is_some_and(|d| d.generation == generation) {
                        state.deleted = None;
                        debug!(turn = %id, "Undo window elapsed, turn purged.");
                    }
                }
            }
        });

        Ok(())
    }

    /// Restore the last deleted turn, if its undo window is still open.
    ///
    /// The turn is put back where its creation time places it among the
    /// visible turns. Returns the ID of the restored turn.
    pub fn undo(&self) -> Option<TurnId> {
        let mut state = self.state.lock();
        let Deleted { turn, purge, .. } = state.deleted.take()?;
        purge.cancel();

        let id = turn.id;
        let index = state.insertion_index(&turn);
        debug!(turn = %id, index, "Restoring deleted turn.");
        state.turns.insert(index, turn);

        Some(id)
    }
}

impl State {
    /// Index that keeps `turns` sorted by creation time. Turns created at the
    /// same instant keep their insertion order.
    fn insertion_index(&self, turn: &Turn) -> usize {
        self.turns
            .partition_point(|existing| existing.created_at <= turn.created_at)
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
