//! Persistent entity envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persistent business object of one registered kind.
///
/// The envelope carries the server-assigned `id`, the last-write
/// `timestamp` and a free-form `extended` map holding every kind-specific
/// field; on the wire the extended fields flatten into the JSON object.
/// The document store is the only durable copy - an instance is allocated
/// empty by its kind factory, populated by decode or by a store read,
/// mutated in place, and discarded after the response.
///
/// `id` is assigned by the document store on create and is never taken
/// from a client body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Server-assigned identifier, unique within the kind.
    #[serde(default)]
    pub id: String,

    /// Last-write timestamp, re-stamped by the store on every write.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// The kind this instance belongs to. Not part of the wire envelope;
    /// the owning table carries it.
    #[serde(skip)]
    pub kind: String,

    /// Kind-specific fields.
    #[serde(flatten)]
    pub extended: Map<String, Value>,
}

impl Entity {
    /// Creates an empty entity of the given kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            timestamp: Utc::now(),
            kind: kind.into(),
            extended: Map::new(),
        }
    }

    /// Merges the given properties into the extended map.
    ///
    /// Existing keys are overwritten.
    pub fn extend(&mut self, properties: Map<String, Value>) {
        for (key, value) in properties {
            self.extended.insert(key, value);
        }
    }

    /// Sets one extended property.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.extended.insert(key.into(), value);
    }

    /// Returns one extended property, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extended.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_land_in_extended() {
        let entity: Entity = serde_json::from_str(r#"{"name":"a","rank":3}"#).unwrap();
        assert!(entity.id.is_empty());
        assert_eq!(entity.get("name"), Some(&json!("a")));
        assert_eq!(entity.get("rank"), Some(&json!(3)));
    }

    #[test]
    fn extended_flattens_on_the_wire() {
        let mut entity = Entity::new("nodes");
        entity.id = "u1".to_string();
        entity.insert("name", json!("a"));

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["id"], json!("u1"));
        assert_eq!(value["name"], json!("a"));
        // kind is table-level, never serialized
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn extend_overwrites_existing_keys() {
        let mut entity = Entity::new("nodes");
        entity.insert("name", json!("a"));

        let mut update = Map::new();
        update.insert("name".to_string(), json!("b"));
        entity.extend(update);

        assert_eq!(entity.get("name"), Some(&json!("b")));
    }

    #[test]
    fn timestamp_defaults_when_absent() {
        let entity: Entity = serde_json::from_str("{}").unwrap();
        assert!(entity.extended.is_empty());
        assert!(entity.timestamp <= Utc::now());
    }
}
