//! Standard bean wrappers wiring the engine into a container.
//!
//! A complete application registers, in order: a [`RegistryBean`] under
//! [`KIND_REGISTRY`], a [`DocumentStoreBean`] under [`DOCUMENT_STORE`], a
//! [`GraphStoreBean`] under [`GRAPH_STORE`], and one [`EngineBean`] per
//! entity kind. Booting the container then wires the dependency graph,
//! opens both store files and builds the engines - or fails entirely
//! before anything could serve.

use crate::engine::EntityEngine;
use crate::routes::RouteTable;
use relata_container::{Bean, BeanResult, WireContext};
use relata_graph::GraphStore;
use relata_model::KindRegistry;
use relata_store::DocumentStore;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

/// Bean name of the kind registry.
pub const KIND_REGISTRY: &str = "kind-registry";

/// Bean name of the document store.
pub const DOCUMENT_STORE: &str = "document-store";

/// Bean name of the graph link store.
pub const GRAPH_STORE: &str = "graph-store";

/// Bean carrying the immutable kind registry.
pub struct RegistryBean {
    registry: Arc<KindRegistry>,
}

impl RegistryBean {
    /// Wraps a fully populated registry.
    #[must_use]
    pub fn new(registry: KindRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Returns the shared registry handle.
    #[must_use]
    pub fn registry(&self) -> Arc<KindRegistry> {
        Arc::clone(&self.registry)
    }
}

impl Bean for RegistryBean {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Bean owning the SQLite document store.
///
/// The store handle exists from construction so sibling beans can take
/// shared references during Wire; the file opens and the per-kind tables
/// are created during Construct.
pub struct DocumentStoreBean {
    path: PathBuf,
    store: Arc<DocumentStore>,
    registry: Option<Arc<KindRegistry>>,
}

impl DocumentStoreBean {
    /// Creates the bean over the given database file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: Arc::new(DocumentStore::new()),
            registry: None,
        }
    }

    /// Returns the shared store handle (usable only after boot).
    #[must_use]
    pub fn store(&self) -> Arc<DocumentStore> {
        Arc::clone(&self.store)
    }
}

impl Bean for DocumentStoreBean {
    fn dependencies(&self) -> Vec<String> {
        vec![KIND_REGISTRY.to_string()]
    }

    fn wire(&mut self, ctx: &WireContext<'_>) -> BeanResult<()> {
        self.registry = Some(ctx.with_bean::<RegistryBean, _>(KIND_REGISTRY, |r| r.registry())?);
        Ok(())
    }

    fn post_construct(&mut self) -> BeanResult<()> {
        let registry = self
            .registry
            .as_ref()
            .ok_or("document store constructed before wire")?;
        self.store.connect(&self.path)?;
        self.store.ensure_tables(registry.kinds())?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Bean owning the quad link store.
pub struct GraphStoreBean {
    path: PathBuf,
    store: Arc<GraphStore>,
}

impl GraphStoreBean {
    /// Creates the bean over the given quad log path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            store: Arc::new(GraphStore::new()),
        }
    }

    /// Returns the shared store handle (usable only after boot).
    #[must_use]
    pub fn store(&self) -> Arc<GraphStore> {
        Arc::clone(&self.store)
    }
}

impl Bean for GraphStoreBean {
    fn post_construct(&mut self) -> BeanResult<()> {
        self.store.connect(&self.path)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Bean building the [`EntityEngine`] for one kind.
///
/// During Wire it resolves the registry and both stores; a kind nobody
/// registered is a configuration error that aborts the boot right there,
/// never surfacing at request time.
pub struct EngineBean {
    kind: String,
    links: Vec<String>,
    engine: Option<Arc<EntityEngine>>,
}

impl EngineBean {
    /// Creates the bean for one entity kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            links: Vec::new(),
            engine: None,
        }
    }

    /// Declares a named link whose routes this kind exposes.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    /// Conventional bean name for a kind's engine, `<kind>-engine`.
    #[must_use]
    pub fn bean_name(kind: &str) -> String {
        format!("{kind}-engine")
    }

    /// Returns the built engine; `None` before the container wired it.
    #[must_use]
    pub fn engine(&self) -> Option<Arc<EntityEngine>> {
        self.engine.as_ref().map(Arc::clone)
    }

    /// Builds the explicit route table for this kind.
    #[must_use]
    pub fn route_table(&self) -> RouteTable {
        self.links
            .iter()
            .fold(RouteTable::crud(&self.kind), |table, link| table.link(link))
    }
}

impl Bean for EngineBean {
    fn dependencies(&self) -> Vec<String> {
        vec![
            KIND_REGISTRY.to_string(),
            DOCUMENT_STORE.to_string(),
            GRAPH_STORE.to_string(),
        ]
    }

    fn wire(&mut self, ctx: &WireContext<'_>) -> BeanResult<()> {
        let registry = ctx.with_bean::<RegistryBean, _>(KIND_REGISTRY, |r| r.registry())?;
        let spec = registry.get(&self.kind)?.clone();
        let documents = ctx.with_bean::<DocumentStoreBean, _>(DOCUMENT_STORE, |b| b.store())?;
        let graph = ctx.with_bean::<GraphStoreBean, _>(GRAPH_STORE, |b| b.store())?;
        self.engine = Some(Arc::new(EntityEngine::new(spec, documents, graph)));
        Ok(())
    }

    fn post_construct(&mut self) -> BeanResult<()> {
        let table = self.route_table();
        tracing::info!(kind = %self.kind, routes = table.routes().len(), "engine ready");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
