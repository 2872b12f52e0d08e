//! Kind registry and per-kind factories.

use crate::collection::Collection;
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Factory producing one empty entity per call.
pub type EntityFactory = Arc<dyn Fn() -> Entity + Send + Sync>;

/// Factory producing one empty collection per call.
pub type CollectionFactory = Arc<dyn Fn() -> Collection + Send + Sync>;

/// The factory pair registered for one entity kind.
///
/// Both factories must be pure: side-effect free and independently
/// callable any number of times without shared mutable state. The engine
/// calls each once per request.
#[derive(Clone)]
pub struct KindSpec {
    kind: String,
    entity: EntityFactory,
    collection: CollectionFactory,
}

impl KindSpec {
    /// Creates a spec with the default factories for the given kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let entity_kind = kind.clone();
        Self {
            kind,
            entity: Arc::new(move || Entity::new(entity_kind.clone())),
            collection: Arc::new(Collection::new),
        }
    }

    /// Creates a spec with caller-supplied factories.
    #[must_use]
    pub fn with_factories(
        kind: impl Into<String>,
        entity: EntityFactory,
        collection: CollectionFactory,
    ) -> Self {
        Self {
            kind: kind.into(),
            entity,
            collection,
        }
    }

    /// Returns the kind name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Allocates one empty entity of this kind.
    #[must_use]
    pub fn new_entity(&self) -> Entity {
        (self.entity)()
    }

    /// Allocates one empty collection for this kind.
    #[must_use]
    pub fn new_collection(&self) -> Collection {
        (self.collection)()
    }
}

impl fmt::Debug for KindSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindSpec")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Registry of every entity kind known to the application.
///
/// An absent kind is a configuration error surfaced at boot/mount time,
/// never at request time.
#[derive(Debug, Default)]
pub struct KindRegistry {
    order: Vec<String>,
    specs: HashMap<String, KindSpec>,
}

impl KindRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one kind. Duplicate kind names are rejected.
    pub fn register(&mut self, spec: KindSpec) -> ModelResult<()> {
        let kind = spec.kind().to_string();
        if self.specs.contains_key(&kind) {
            return Err(ModelError::DuplicateKind { kind });
        }
        self.order.push(kind.clone());
        self.specs.insert(kind, spec);
        Ok(())
    }

    /// Looks up the spec for a kind.
    pub fn get(&self, kind: &str) -> ModelResult<&KindSpec> {
        self.specs.get(kind).ok_or_else(|| ModelError::UnknownKind {
            kind: kind.to_string(),
        })
    }

    /// Iterates kind names in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factories_produce_independent_values() {
        let spec = KindSpec::new("nodes");
        let mut first = spec.new_entity();
        first.id = "u1".to_string();
        let second = spec.new_entity();

        assert_eq!(first.kind, "nodes");
        assert_eq!(second.kind, "nodes");
        assert!(second.id.is_empty());
    }

    #[test]
    fn duplicate_kind_rejected() {
        let mut registry = KindRegistry::new();
        registry.register(KindSpec::new("nodes")).unwrap();

        let err = registry.register(KindSpec::new("nodes")).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateKind { .. }));
    }

    #[test]
    fn unknown_kind_rejected() {
        let registry = KindRegistry::new();
        let err = registry.get("nodes").unwrap_err();
        assert!(matches!(err, ModelError::UnknownKind { .. }));
    }

    #[test]
    fn kinds_iterate_in_registration_order() {
        let mut registry = KindRegistry::new();
        registry.register(KindSpec::new("nodes")).unwrap();
        registry.register(KindSpec::new("views")).unwrap();

        let kinds: Vec<_> = registry.kinds().collect();
        assert_eq!(kinds, ["nodes", "views"]);
    }
}
