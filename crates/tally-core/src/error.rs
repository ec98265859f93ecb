//! Domain error taxonomy.

use thiserror::Error;

/// Errors surfaced by timer, category, and ledger operations.
///
/// The first three variants are caller-logic errors and carry a
/// human-readable message. [`Error::Storage`] wraps infrastructure
/// failures from the persistence layer and is deliberately kept
/// separate from the domain taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    /// State-machine misuse: double start, stop or update while idle,
    /// or a duplicate category key.
    #[error("{0}")]
    Conflict(String),

    /// No category exists with the given id or key.
    #[error("{0}")]
    NotFound(String),

    /// The category exists but is deactivated.
    #[error("{0}")]
    InvalidState(String),

    /// An error from the underlying storage.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary infrastructure failure as a storage error.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(Box::new(err))
    }
}
