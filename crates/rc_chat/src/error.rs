use rc_conversation::{ConversationId, TurnStatus};

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("A reply is still streaming in conversation {0}.")]
    TurnInProgress(ConversationId),

    #[error("Cannot {action} a turn that is {status}.")]
    InvalidTransition {
        action: &'static str,
        status: TurnStatus,
    },

    #[error("Conversation error: {0}")]
    Conversation(#[from] rc_conversation::Error),
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
