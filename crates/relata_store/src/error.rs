//! Error types for the document store.

use thiserror::Error;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the document store.
///
/// `NotFound` is user-visible (a 404-equivalent at the transport
/// boundary); every other variant is internal (a 500-equivalent).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store has not been connected yet, or was never opened.
    #[error("document store is not connected")]
    Closed,

    /// `connect` was called on a store that already holds a connection.
    #[error("document store is already connected")]
    AlreadyOpen,

    /// The kind name is not usable as a table name.
    #[error("invalid kind name: {kind}")]
    InvalidKind {
        /// The offending kind name.
        kind: String,
    },

    /// No row exists for the given id.
    #[error("no {kind} row with id {id}")]
    NotFound {
        /// The entity kind searched.
        kind: String,
        /// The id that matched nothing.
        id: String,
    },

    /// A row with the given id already exists.
    #[error("{kind} row with id {id} already exists")]
    Conflict {
        /// The entity kind.
        kind: String,
        /// The duplicate id.
        id: String,
    },

    /// Entity payload failed to encode or decode.
    #[error("payload codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The underlying SQLite driver failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Returns `true` when the error means the addressed row is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
