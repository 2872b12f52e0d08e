//! The generic CRUD/link engine.

use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use relata_graph::{vertex, GraphStore};
use relata_model::{Collection, Edge, Entity, KindSpec};
use relata_store::{DocumentStore, StoreError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A named side-effecting operation invocable instead of create.
pub type TaskHandler = Box<dyn Fn(&str) -> EngineResult<Value> + Send + Sync>;

/// Uniform CRUD and link operations for one entity kind.
///
/// The engine is stateless per request: every operation allocates its
/// working values through the kind's factories and the two stores hold
/// the only durable state. One engine instance is shared across
/// request-handling threads.
pub struct EntityEngine {
    spec: KindSpec,
    documents: Arc<DocumentStore>,
    graph: Arc<GraphStore>,
    tasks: RwLock<HashMap<String, TaskHandler>>,
}

impl EntityEngine {
    /// Creates an engine for one kind over shared store handles.
    #[must_use]
    pub fn new(spec: KindSpec, documents: Arc<DocumentStore>, graph: Arc<GraphStore>) -> Self {
        Self {
            spec,
            documents,
            graph,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the entity kind this engine serves.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.spec.kind()
    }

    /// Returns the kind spec.
    #[must_use]
    pub fn spec(&self) -> &KindSpec {
        &self.spec
    }

    /// Lists every entity of the kind, in store iteration order.
    pub fn get_all(&self) -> EngineResult<Collection> {
        let mut collection = self.spec.new_collection();
        self.documents.get_all(&self.spec, &mut collection)?;
        Ok(collection)
    }

    /// Loads one entity by id.
    pub fn get_by_id(&self, id: &str) -> EngineResult<Entity> {
        let mut entity = self.spec.new_entity();
        entity.id = id.to_string();
        self.documents.get(id, &mut entity).map_err(map_store)?;
        Ok(entity)
    }

    /// Decodes the body and creates the entity; the store mints the id
    /// and timestamp.
    ///
    /// A malformed body short-circuits before the store is touched, and
    /// the returned [`EngineError::Decode`] carries the raw body.
    pub fn create(&self, body: &str) -> EngineResult<Entity> {
        let mut entity = self.decode_body(body)?;
        self.documents.create(&mut entity).map_err(map_store)?;
        tracing::debug!(kind = %self.kind(), id = %entity.id, "created");
        Ok(entity)
    }

    /// Replaces the entity under `id` with the decoded body. Full
    /// overwrite: nothing of the stored payload survives.
    pub fn replace(&self, id: &str, body: &str) -> EngineResult<Entity> {
        let mut entity = self.decode_body(body)?;
        self.documents.update(id, &mut entity).map_err(map_store)?;
        Ok(entity)
    }

    /// Patches the entity under `id`.
    ///
    /// Same code path as [`EntityEngine::replace`]: there is no
    /// field-level merge, and fields omitted from the body are wiped.
    pub fn patch(&self, id: &str, body: &str) -> EngineResult<Entity> {
        self.replace(id, body)
    }

    /// Deletes the entity under `id`, returning its prior state.
    pub fn delete(&self, id: &str) -> EngineResult<Entity> {
        let prior = self.get_by_id(id)?;
        self.documents
            .delete(self.spec.kind(), id)
            .map_err(map_store)?;
        Ok(prior)
    }

    /// Persists a link; the graph store mints a fresh instance
    /// unconditionally, ignoring any id supplied on the edge.
    pub fn create_link(&self, mut edge: Edge) -> EngineResult<Edge> {
        self.graph.create_link(&mut edge)?;
        Ok(edge)
    }

    /// Replaces a link: the quad matching the edge's instance among the
    /// source's outgoing edges is deleted, then the edge is re-created.
    ///
    /// The returned edge carries a **fresh** instance - the externally
    /// visible handle changes on every update.
    pub fn update_link(&self, mut edge: Edge) -> EngineResult<Edge> {
        let subject = vertex(&edge.source, &edge.source_id);
        let mut matched = None;
        for quad in self.graph.outgoing(&subject)? {
            if matched.is_none() && quad.instance() == Some(edge.instance.as_str()) {
                matched = Some(quad);
            }
            // keep draining - the worker streams to completion
        }
        if let Some(quad) = matched {
            if let Some(instance) = quad.instance() {
                self.graph.delete_link(instance)?;
            }
        }
        self.graph.create_link(&mut edge)?;
        Ok(edge)
    }

    /// Removes the link with the given instance. No-op when absent.
    pub fn delete_link(&self, instance: &str) -> EngineResult<Option<Edge>> {
        match self.graph.delete_link(instance)? {
            Some(quad) => Ok(Some(quad.decode_edge()?)),
            None => Ok(None),
        }
    }

    /// Materialized join of relationship metadata and current target
    /// state: every outgoing edge of `source_id` whose target kind
    /// matches `target`, projected as the live target entity annotated
    /// with the edge's extended properties, its `instance` and the full
    /// `edge` record.
    ///
    /// The projection reflects the target's current state, not a
    /// snapshot at link time. Edges pointing at deleted targets are
    /// skipped.
    pub fn get_all_links(&self, source_id: &str, target: &EntityEngine) -> EngineResult<Vec<Entity>> {
        let subject = vertex(self.spec.kind(), source_id);
        let mut output = Vec::new();
        for quad in self.graph.outgoing(&subject)? {
            let edge = quad.decode_edge()?;
            if edge.source_id != source_id || edge.target != target.kind() {
                continue;
            }
            let mut entity = match target.get_by_id(&edge.target_id) {
                Ok(entity) => entity,
                Err(EngineError::NotFound { .. }) => {
                    tracing::warn!(
                        instance = %edge.instance,
                        target = %edge.target_id,
                        "skipping dangling link target"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            entity.extend(edge.extended.clone());
            entity.insert("instance", Value::String(edge.instance.clone()));
            entity.insert("edge", serde_json::to_value(&edge)?);
            output.push(entity);
        }
        Ok(output)
    }

    /// Creates a link between two loaded entities and returns the target
    /// annotated with the body properties and the new instance.
    ///
    /// Both endpoints must exist; a missing endpoint is `NotFound`.
    pub fn link_create(
        &self,
        source_id: &str,
        target_id: &str,
        link: &str,
        body: &str,
        target: &EntityEngine,
    ) -> EngineResult<Entity> {
        let source = self.get_by_id(source_id)?;
        let mut annotated = target.get_by_id(target_id)?;

        let mut edge = Edge::new(self.spec.kind(), &source.id, target.kind(), target_id, link);
        let mut properties = self.decode_properties(body)?;
        edge.extend(properties.clone());
        let edge = self.create_link(edge)?;

        // "edge" is a reserved annotation key
        properties.remove("edge");
        properties.insert("instance".to_string(), Value::String(edge.id.clone()));
        annotated.extend(properties);
        Ok(annotated)
    }

    /// Replaces the link addressed by `instance` between two entities;
    /// returns the target annotated with the **new** instance.
    pub fn link_update(
        &self,
        source_id: &str,
        target_id: &str,
        link: &str,
        body: &str,
        instance: &str,
        target: &EntityEngine,
    ) -> EngineResult<Entity> {
        let source = self.get_by_id(source_id)?;
        let mut annotated = target.get_by_id(target_id)?;

        let mut edge = Edge::new(self.spec.kind(), &source.id, target.kind(), target_id, link);
        let mut properties = self.decode_properties(body)?;
        edge.extend(properties.clone());
        edge.instance = instance.to_string();
        let edge = self.update_link(edge)?;

        properties.remove("edge");
        properties.insert("instance".to_string(), Value::String(edge.instance.clone()));
        annotated.extend(properties);
        Ok(annotated)
    }

    /// Removes the link addressed by `instance` between two entities.
    ///
    /// Both endpoints must exist; a missing endpoint is `NotFound`. The
    /// removal itself stays a no-op when no edge carries the instance.
    pub fn link_delete(
        &self,
        source_id: &str,
        target_id: &str,
        instance: &str,
        target: &EntityEngine,
    ) -> EngineResult<Option<Edge>> {
        self.get_by_id(source_id)?;
        target.get_by_id(target_id)?;
        self.delete_link(instance)
    }

    /// Registers a named task invocable via POST with a `task` query
    /// parameter.
    pub fn register_task(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&str) -> EngineResult<Value> + Send + Sync + 'static,
    ) {
        self.tasks.write().insert(name.into(), Box::new(handler));
    }

    /// Runs a named task against the raw request body.
    pub fn run_task(&self, name: &str, body: &str) -> EngineResult<Value> {
        let tasks = self.tasks.read();
        let handler = tasks.get(name).ok_or_else(|| EngineError::TaskNotFound {
            kind: self.kind().to_string(),
            task: name.to_string(),
        })?;
        handler(body)
    }

    /// Decodes a request body over a fresh factory instance.
    fn decode_body(&self, body: &str) -> EngineResult<Entity> {
        let decoded: Entity =
            serde_json::from_str(body).map_err(|source| EngineError::Decode {
                body: body.to_string(),
                source,
            })?;
        let mut entity = self.spec.new_entity();
        entity.extended = decoded.extended;
        Ok(entity)
    }

    /// Decodes a link body into edge properties; an empty body is an
    /// empty property map.
    fn decode_properties(&self, body: &str) -> EngineResult<Map<String, Value>> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(trimmed).map_err(|source| EngineError::Decode {
            body: body.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for EntityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityEngine")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Lifts store errors into the engine taxonomy, keeping `NotFound`
/// user-visible.
fn map_store(err: StoreError) -> EngineError {
    match err {
        StoreError::NotFound { kind, id } => EngineError::NotFound { kind, id },
        other => EngineError::Store(other),
    }
}
