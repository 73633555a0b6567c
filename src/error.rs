use std::io;
use thiserror::Error;

/// Errors produced by the line editor and the command line environment.
///
/// Command handlers return [`anyhow::Result`], so these variants usually travel
/// inside an [`anyhow::Error`]. Use the `is_*` helpers of this module to classify
/// such an error; they downcast and never look at the message text.
#[derive(Debug, Error)]
pub enum Error {
    /// The user pressed Ctrl+C while a line was being read.
    #[error("Ctrl+C")]
    Interrupted,
    /// Returned by a command handler to stop [`Environment::run`](crate::Environment::run) gracefully.
    #[error("exit application")]
    Exit,
    /// No command with this name is registered.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    /// A command stopped abruptly. Carries the fault payload.
    #[error("command faulted: {0}")]
    CommandFaulted(String),
    /// A command with this name is already registered.
    #[error("command {0:?} is already registered")]
    DuplicateCommand(String),
    /// Command names must be non-empty and free of whitespace and quotes.
    #[error("invalid command name {0:?}")]
    InvalidCommandName(String),
    /// The key source or the output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a [`Error::CommandFaulted`] from any displayable payload.
    pub fn fault(payload: impl std::fmt::Display) -> Self {
        Error::CommandFaulted(payload.to_string())
    }
}

fn kind(err: &anyhow::Error) -> Option<&Error> {
    err.downcast_ref::<Error>()
}

/// True when the error asks for a graceful shutdown of the command loop.
pub fn is_exit(err: &anyhow::Error) -> bool {
    matches!(kind(err), Some(Error::Exit))
}

/// True when the error stems from Ctrl+C.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    matches!(kind(err), Some(Error::Interrupted))
}

/// True when the error reports an unknown command.
pub fn is_unknown_command(err: &anyhow::Error) -> bool {
    matches!(kind(err), Some(Error::UnknownCommand(_)))
}

/// True when a command faulted.
pub fn is_command_faulted(err: &anyhow::Error) -> bool {
    matches!(kind(err), Some(Error::CommandFaulted(_)))
}
