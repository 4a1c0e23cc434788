//! Error type for the record store.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The database could not be opened, the connection is gone, or an
    /// existing table does not have the configured columns.
    #[error("record store connection failed: {0}")]
    Connection(String),

    /// An insert or update was rejected (constraint violation, busy, I/O).
    #[error("record store write failed: {0}")]
    Write(String),

    #[error("record store read failed: {0}")]
    Read(String),

    /// No row matched `(id, sub_id)` on a rating update.
    #[error("no record with id={id} sub_id={sub_id}")]
    NotFound { id: String, sub_id: String },

    /// Table or column names are spliced into statements, so they are
    /// restricted to plain identifiers.
    #[error("`{0}` is not a valid SQL identifier")]
    InvalidIdentifier(String),
}

impl StoreError {
    /// Classify a backend error raised by a write statement.
    pub(crate) fn write(e: tokio_rusqlite::Error) -> Self {
        match e {
            tokio_rusqlite::Error::ConnectionClosed => StoreError::Connection(e.to_string()),
            other => StoreError::Write(other.to_string()),
        }
    }

    /// Classify a backend error raised by a query.
    pub(crate) fn read(e: tokio_rusqlite::Error) -> Self {
        match e {
            tokio_rusqlite::Error::ConnectionClosed => StoreError::Connection(e.to_string()),
            other => StoreError::Read(other.to_string()),
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
