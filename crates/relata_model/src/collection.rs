//! Ordered-insertion entity container.

use crate::entity::Entity;
use serde::Serialize;

/// An ordered-insertion container of entities of one kind.
///
/// Collections are created fresh per list request by the kind's collection
/// factory, populated by a store scan and never cached. They serialize as
/// a plain JSON array.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Collection {
    items: Vec<Entity>,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entity, preserving insertion order.
    pub fn push(&mut self, entity: Entity) {
        self.items.push(entity);
    }

    /// Returns the number of entities held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the collection holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates entities in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    /// Consumes the collection, returning the backing vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Entity> {
        self.items
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut collection = Collection::new();
        for id in ["a", "b", "c"] {
            let mut entity = Entity::new("nodes");
            entity.id = id.to_string();
            collection.push(entity);
        }

        let ids: Vec<_> = collection.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn serializes_as_array() {
        let mut collection = Collection::new();
        collection.push(Entity::new("nodes"));

        let value = serde_json::to_value(&collection).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 1);
    }
}
