//! Error taxonomy for the engine.
//!
//! The taxonomy is part of the public contract: [`EngineError::is_client_error`]
//! tells the transport boundary which failures map to a 4xx-equivalent
//! (the request was wrong) and which stay internal (5xx-equivalent).

use relata_graph::GraphError;
use relata_model::ModelError;
use relata_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the generic CRUD/link engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No entity of the kind exists under the id. User-visible.
    #[error("no {kind} with id {id}")]
    NotFound {
        /// The entity kind.
        kind: String,
        /// The missing id.
        id: String,
    },

    /// The request body is not valid JSON for the operation.
    /// User-visible; the store is never touched.
    #[error("malformed body: {source}")]
    Decode {
        /// The raw body as received.
        body: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A named task was invoked that no one registered. User-visible.
    #[error("no task '{task}' on kind {kind}")]
    TaskNotFound {
        /// The entity kind.
        kind: String,
        /// The requested task name.
        task: String,
    },

    /// Internal serialization failure while annotating results.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Document store failure. Internal.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Graph store failure. Internal.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Kind registry failure. Internal (a boot-time configuration error).
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl EngineError {
    /// Returns `true` for failures caused by the request itself
    /// (4xx-equivalent); everything else is internal (5xx-equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Decode { .. } | Self::TaskNotFound { .. }
        )
    }
}
