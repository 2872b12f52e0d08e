//! The graph link store.

use crate::error::{GraphError, GraphResult};
use crate::quad::Quad;
use crate::stats::GraphStats;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver};
use parking_lot::RwLock;
use relata_model::Edge;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use uuid::Uuid;

/// Quad store persisting directed, typed links between entities.
///
/// Like [`DocumentStore`], the store is created closed so shared handles
/// can be distributed before the backing file is opened during the
/// application's Construct phase.
///
/// There are no cross-store transactions: creating an entity and then a
/// link to it are independent operations, and a crash between them leaves
/// an orphaned entity or a dangling edge. That weak-consistency boundary
/// is accepted, not remediated.
///
/// [`DocumentStore`]: https://docs.rs/relata_store
pub struct GraphStore {
    inner: RwLock<Option<Inner>>,
}

struct Inner {
    path: Option<PathBuf>,
    next: u64,
    quads: BTreeMap<u64, Quad>,
    by_instance: HashMap<String, u64>,
    by_subject: HashMap<String, Vec<u64>>,
}

impl Inner {
    fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            next: 0,
            quads: BTreeMap::new(),
            by_instance: HashMap::new(),
            by_subject: HashMap::new(),
        }
    }

    fn insert(&mut self, quad: Quad) {
        let slot = self.next;
        self.next += 1;
        if let Some(instance) = quad.instance() {
            self.by_instance.insert(instance.to_string(), slot);
        }
        self.by_subject
            .entry(quad.subject.clone())
            .or_default()
            .push(slot);
        self.quads.insert(slot, quad);
    }

    fn remove_instance(&mut self, instance: &str) -> Option<Quad> {
        let slot = self.by_instance.remove(instance)?;
        let quad = self.quads.remove(&slot)?;
        if let Some(slots) = self.by_subject.get_mut(&quad.subject) {
            slots.retain(|s| *s != slot);
            if slots.is_empty() {
                self.by_subject.remove(&quad.subject);
            }
        }
        Some(quad)
    }

    fn outgoing_snapshot(&self, subject: &str) -> Vec<Quad> {
        self.by_subject
            .get(subject)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|slot| self.quads.get(slot).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GraphStore {
    /// Creates a closed store; call [`GraphStore::connect`] to open it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Opens a store over the given quad log, creating the file if absent.
    pub fn open(path: impl AsRef<Path>) -> GraphResult<Self> {
        let store = Self::new();
        store.connect(path)?;
        Ok(store)
    }

    /// Opens a non-persistent store for testing.
    pub fn open_in_memory() -> GraphResult<Self> {
        let store = Self::new();
        store.connect_in_memory()?;
        Ok(store)
    }

    /// Connects a closed store to the given quad log, loading every quad
    /// and building the secondary indexes.
    pub fn connect(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let path = path.as_ref().to_path_buf();
        let mut inner = Inner::new(Some(path.clone()));

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            for (number, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let quad: Quad =
                    serde_json::from_str(line).map_err(|err| GraphError::CorruptLog {
                        line: number + 1,
                        message: err.to_string(),
                    })?;
                inner.insert(quad);
            }
        } else {
            OpenOptions::new().create(true).append(true).open(&path)?;
        }

        tracing::info!(quads = inner.quads.len(), path = %path.display(), "quad log loaded");
        self.install(inner)
    }

    /// Connects a closed store to a fresh in-memory log.
    pub fn connect_in_memory(&self) -> GraphResult<()> {
        self.install(Inner::new(None))
    }

    /// Persists one link: mints a fresh instance id unconditionally
    /// (any client-supplied id or instance is discarded), stamps the
    /// edge, and appends the quad.
    ///
    /// No existence check is made on source or target, and identical
    /// links are not deduplicated.
    pub fn create_link(&self, edge: &mut Edge) -> GraphResult<Quad> {
        let instance = Uuid::new_v4().to_string();
        edge.id = instance.clone();
        edge.instance = instance;
        edge.timestamp = Utc::now();

        let quad = Quad::for_edge(edge)?;
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(GraphError::Closed)?;
        if let Some(path) = inner.path.clone() {
            append_line(&path, &quad)?;
        }
        inner.insert(quad.clone());
        tracing::debug!(
            subject = %quad.subject,
            predicate = %quad.predicate,
            object = %quad.object,
            "link created"
        );
        Ok(quad)
    }

    /// Replaces a link wholesale: the quad matching the edge's current
    /// instance is removed, then the edge is persisted again with a
    /// fresh instance.
    ///
    /// The relationship's externally visible handle changes on every
    /// update. An unknown instance degrades to a plain create.
    pub fn update_link(&self, edge: &mut Edge) -> GraphResult<Quad> {
        self.delete_link(&edge.instance)?;
        self.create_link(edge)
    }

    /// Removes the quad whose predicate suffix equals `instance`.
    ///
    /// Physical removal - the log is rewritten without the quad. Returns
    /// the removed quad, or `None` as a no-op when nothing matches.
    pub fn delete_link(&self, instance: &str) -> GraphResult<Option<Quad>> {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(GraphError::Closed)?;
        let Some(quad) = inner.remove_instance(instance) else {
            return Ok(None);
        };
        if let Some(path) = inner.path.clone() {
            rewrite_log(&path, inner.quads.values())?;
        }
        tracing::debug!(
            subject = %quad.subject,
            predicate = %quad.predicate,
            "link removed"
        );
        Ok(Some(quad))
    }

    /// Streams every outgoing quad of a subject vertex.
    ///
    /// The traversal runs on a background worker producing onto a bounded
    /// capacity-1 channel; iterate the receiver to completion to drain
    /// it. The traversal does not filter by instance or source id -
    /// callers filter after retrieval. Dropping the receiver early
    /// disconnects the worker, which then exits.
    pub fn outgoing(&self, subject: &str) -> GraphResult<Receiver<Quad>> {
        let snapshot = {
            let guard = self.inner.read();
            let inner = guard.as_ref().ok_or(GraphError::Closed)?;
            inner.outgoing_snapshot(subject)
        };

        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            for quad in snapshot {
                if tx.send(quad).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    /// Returns the number of stored quads.
    pub fn len(&self) -> GraphResult<usize> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(GraphError::Closed)?;
        Ok(inner.quads.len())
    }

    /// Returns `true` when the store holds no quads.
    pub fn is_empty(&self) -> GraphResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every quad and truncates the log.
    pub fn clear(&self) -> GraphResult<()> {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(GraphError::Closed)?;
        inner.quads.clear();
        inner.by_instance.clear();
        inner.by_subject.clear();
        if let Some(path) = inner.path.clone() {
            rewrite_log(&path, std::iter::empty())?;
        }
        Ok(())
    }

    /// Enumerates every quad as a statistics entry.
    pub fn statistics(&self) -> GraphResult<Vec<GraphStats>> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(GraphError::Closed)?;
        Ok(inner
            .quads
            .values()
            .map(|quad| GraphStats {
                key: quad.subject.clone(),
                value: format!("{} {}", quad.predicate, quad.object),
            })
            .collect())
    }

    /// Exports every link grouped by link kind.
    ///
    /// Each element carries `__from`/`__to` (the endpoint ids), `id`
    /// (the instance) and the edge's extended properties.
    pub fn export(&self) -> GraphResult<HashMap<String, Vec<Map<String, Value>>>> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or(GraphError::Closed)?;

        let mut export: HashMap<String, Vec<Map<String, Value>>> = HashMap::new();
        for quad in inner.quads.values() {
            let Some((link, instance)) = quad.predicate.rsplit_once(':') else {
                continue;
            };
            let edge = quad.decode_edge()?;

            let mut element = Map::new();
            element.insert("__from".to_string(), Value::String(vertex_id(&quad.subject)));
            element.insert("__to".to_string(), Value::String(vertex_id(&quad.object)));
            element.insert("id".to_string(), Value::String(instance.to_string()));
            for (key, value) in edge.extended {
                element.insert(key, value);
            }
            export.entry(link.to_string()).or_default().push(element);
        }
        Ok(export)
    }

    fn install(&self, inner: Inner) -> GraphResult<()> {
        let mut guard = self.inner.write();
        if guard.is_some() {
            return Err(GraphError::AlreadyOpen);
        }
        *guard = Some(inner);
        Ok(())
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read();
        f.debug_struct("GraphStore")
            .field("connected", &guard.is_some())
            .field(
                "quads",
                &guard.as_ref().map(|inner| inner.quads.len()).unwrap_or(0),
            )
            .finish()
    }
}

/// Returns the `<id>` part of a `/<kind>/<id>` vertex name.
fn vertex_id(vertex: &str) -> String {
    vertex.rsplit('/').next().unwrap_or(vertex).to_string()
}

fn append_line(path: &Path, quad: &Quad) -> GraphResult<()> {
    let mut line = serde_json::to_string(quad)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn rewrite_log<'a>(path: &Path, quads: impl Iterator<Item = &'a Quad>) -> GraphResult<()> {
    let mut content = String::new();
    for quad in quads {
        content.push_str(&serde_json::to_string(quad)?);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
