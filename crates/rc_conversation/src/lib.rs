pub mod error;
pub mod history;
pub mod id;
pub mod turn;

pub use error::Error;
pub use history::{TurnHistory, UNDO_WINDOW};
pub use id::{ConversationId, TurnId};
pub use turn::{Turn, TurnStatus};
