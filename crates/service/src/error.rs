//! Service error types.

use common::AccountName;
use domain::{CalendarError, CommandKind};
use store::StoreError;
use thiserror::Error;

/// Errors returned by command handlers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A calendar rejected the command.
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Loading or committing failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The account name is already registered.
    #[error("Account name not available: {0}")]
    DuplicateIdentity(AccountName),

    /// A handler was given a command of another kind.
    #[error("Handler for {expected} received {actual}")]
    UnexpectedCommand {
        expected: CommandKind,
        actual: CommandKind,
    },

    /// No handler is registered for the command kind.
    #[error("No handler registered for {0}")]
    NoHandler(CommandKind),
}

/// Coarse classification of a [`ServiceError`] for the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInterval,
    SlotUnavailable,
    NotFound,
    DuplicateIdentity,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Calendar(err) => match err {
                CalendarError::InvalidInterval { .. } => ErrorKind::InvalidInterval,
                CalendarError::SlotUnavailable { .. } => ErrorKind::SlotUnavailable,
                CalendarError::AppointmentNotFound(_) => ErrorKind::NotFound,
            },
            ServiceError::Store(err) => match err {
                StoreError::NotFound { .. } => ErrorKind::NotFound,
                StoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            },
            ServiceError::DuplicateIdentity(_) => ErrorKind::DuplicateIdentity,
            ServiceError::UnexpectedCommand { .. } | ServiceError::NoHandler(_) => {
                ErrorKind::Internal
            }
        }
    }
}
