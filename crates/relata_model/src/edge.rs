//! Directed, typed relationship between two entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A directed, typed relationship between two entity instances.
///
/// An edge owns its identity independently of the entities it connects:
/// `id` and `instance` are both minted by the graph store, and `instance`
/// is the only externally stable handle to one relationship record. Every
/// create **and every update** mints a brand-new `instance`, so addressing
/// a logically-same relationship changes across updates.
///
/// Edges are replaced wholesale, never partially updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Store-minted identifier.
    #[serde(default)]
    pub id: String,

    /// The stable-for-one-version relationship handle. Equal to `id`
    /// once persisted.
    #[serde(default)]
    pub instance: String,

    /// Stamped when the edge is persisted.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Source entity kind.
    #[serde(default)]
    pub source: String,

    /// Source entity id.
    #[serde(default)]
    pub source_id: String,

    /// Target entity kind.
    #[serde(default)]
    pub target: String,

    /// Target entity id.
    #[serde(default)]
    pub target_id: String,

    /// Relationship kind (the link name).
    #[serde(default)]
    pub link: String,

    /// Free-form relationship properties.
    #[serde(default)]
    pub extended: Map<String, Value>,
}

impl Edge {
    /// Creates an unpersisted edge between two entity instances.
    ///
    /// `id` and `instance` stay empty until the graph store mints them.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        source_id: impl Into<String>,
        target: impl Into<String>,
        target_id: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            instance: String::new(),
            timestamp: Utc::now(),
            source: source.into(),
            source_id: source_id.into(),
            target: target.into(),
            target_id: target_id.into(),
            link: link.into(),
            extended: Map::new(),
        }
    }

    /// Merges the given properties into the extended map.
    pub fn extend(&mut self, properties: Map<String, Value>) {
        for (key, value) in properties {
            self.extended.insert(key, value);
        }
    }
}
