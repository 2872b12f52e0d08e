//! Error types for the graph link store.

use thiserror::Error;

/// Result type for graph store operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors raised by the graph link store.
///
/// All variants are internal (500-equivalent at the transport boundary);
/// a missing link is not an error here - `delete_link` is a no-op for an
/// unknown instance.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The store has not been connected yet.
    #[error("graph store is not connected")]
    Closed,

    /// `connect` was called on a store that already holds a log.
    #[error("graph store is already connected")]
    AlreadyOpen,

    /// The quad log on disk could not be read or written.
    #[error("quad log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A quad or edge payload failed to encode or decode.
    #[error("quad codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// One line of the quad log is not a valid quad.
    #[error("corrupt quad log at line {line}: {message}")]
    CorruptLog {
        /// 1-based line number in the log file.
        line: usize,
        /// What went wrong.
        message: String,
    },
}
