//! Graph store statistics.

use serde::Serialize;

/// One key/value statistics entry describing a stored quad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    /// Subject vertex of the quad.
    pub key: String,
    /// Rendered predicate and object.
    pub value: String,
}
