//! Error types for the relata model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the kind registry.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A kind was registered twice.
    #[error("kind already registered: {kind}")]
    DuplicateKind {
        /// The offending kind name.
        kind: String,
    },

    /// A kind was requested that no one registered.
    #[error("unknown kind: {kind}")]
    UnknownKind {
        /// The requested kind name.
        kind: String,
    },
}
