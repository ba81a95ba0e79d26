//! Failures the room/message/identity layer reports to its callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Referenced room, message or user does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Actor does not own the record it tried to change
    #[error("{0}")]
    Forbidden(&'static str),

    /// Form constraints (registration, profile, room form)
    #[error("{0}")]
    ValidationFailed(String),

    /// Bad credentials
    #[error("{0}")]
    AuthFailed(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(e) => e
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
