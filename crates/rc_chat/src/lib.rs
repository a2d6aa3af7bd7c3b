//! Client side of a streamed chat exchange.
//!
//! A [`ChatController`] owns every live turn and the [`TurnHistory`] of
//! finished ones. Submitting a message yields a [`PendingTurn`]; running it
//! opens the stream through a [`Transport`] and feeds the decoded events into
//! the turn's [`TurnMachine`], one event at a time.
//!
//! [`TurnHistory`]: rc_conversation::TurnHistory

pub mod assembler;
mod controller;
mod error;
pub mod machine;
pub mod transport;

pub use controller::{ChatController, PendingTurn, TurnHandle};
pub use error::Error;
pub use machine::{Applied, TurnMachine};
pub use transport::{ChatRequest, HttpTransport, Transport};
