//! Store statistics.

use serde::Serialize;

/// One key/value statistics entry, e.g. `nodes.count = 12`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Statistic name.
    pub key: String,
    /// Rendered value.
    pub value: String,
}
