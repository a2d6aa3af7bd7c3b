use std::{io, process::ExitCode};

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Config(#[from] rc_config::Error),

    #[error(transparent)]
    Chat(#[from] rc_chat::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The reply ended in an error. Holds the message shown to the user.
    #[error("{0}")]
    Reply(String),

    #[error("Cancelled.")]
    Cancelled,
}

impl Error {
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            // Conventional code for a process interrupted by SIGINT.
            Self::Cancelled => ExitCode::from(130),
            _ => ExitCode::FAILURE,
        }
    }
}
